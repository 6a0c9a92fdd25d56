use crate::core::aggregate::{GridCellAggregator, TileAggregate};
use crate::core::period::Period;
use crate::io::window::PixelWindowSource;
use crate::io::writer::{GridCellWriter, TileKey};
use crate::types::GridResult;

/// Aggregate one tile and hand every sub-period to `writer`.
///
/// Nothing is written unless the whole tile aggregated and validated. Sub-periods
/// are written in order, so a writer failing on the second half leaves the
/// first half already written; the error is returned unchanged.
pub fn run_tile(
    key: &TileKey,
    period: &Period,
    aggregator: &GridCellAggregator,
    source: &mut dyn PixelWindowSource,
    writer: &mut dyn GridCellWriter,
) -> GridResult<TileAggregate> {
    log::info!("Aggregating tile {}", key);
    let result = aggregator.aggregate(period, source)?;

    for diagnostic in &result.diagnostics {
        log::debug!("{}: {:?} {}", key, diagnostic.kind, diagnostic.message);
    }
    for stats in &result.stats {
        writer.write(key, stats.sub_period, stats)?;
        log::info!("Grid cells for {} ({}) streamed", key, stats.sub_period);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregationConfig;
    use crate::core::period::SubPeriod;
    use crate::io::landcover::CciLandCoverRemapping;
    use crate::io::window::InMemorySource;
    use crate::io::writer::MemoryWriter;
    use crate::types::GridError;
    use ndarray::Array2;

    fn config() -> AggregationConfig {
        AggregationConfig {
            cell_size: 2,
            target_width: 2,
            target_height: 1,
            ..AggregationConfig::default()
        }
    }

    #[test]
    fn test_run_tile_writes_each_half() {
        let mut source = InMemorySource::new(Array2::from_elem((2, 4), 160), Array2::from_elem((2, 4), 1.0))
            .unwrap()
            .with_land_cover(Array2::from_elem((2, 4), 130))
            .unwrap();
        let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();
        let key = TileKey::new(2008, 6, "h15v07");
        let mut writer = MemoryWriter::new();

        run_tile(&key, &Period::half_month(2008, 6).unwrap(), &aggregator, &mut source, &mut writer).unwrap();

        assert_eq!(writer.written.len(), 2);
        let first = writer.find(&key, SubPeriod::FirstHalf).unwrap();
        assert_eq!(first.burned_area, vec![4.0, 4.0]);
        let second = writer.find(&key, SubPeriod::SecondHalf).unwrap();
        assert_eq!(second.total_burned_area(), 0.0);
    }

    #[test]
    fn test_nothing_written_on_violation() {
        // negative pixel areas break the area invariant
        let mut source = InMemorySource::new(Array2::from_elem((2, 4), 15), Array2::from_elem((2, 4), -1.0)).unwrap();
        let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();
        let mut writer = MemoryWriter::new();

        let err = run_tile(
            &TileKey::new(2008, 1, "h00v00"),
            &Period::month(2008, 1).unwrap(),
            &aggregator,
            &mut source,
            &mut writer,
        )
        .unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(writer.written.is_empty());
    }

    #[test]
    fn test_failing_error_model_writes_nothing() {
        let mut source = InMemorySource::new(Array2::from_elem((2, 4), 15), Array2::from_elem((2, 4), 10.0))
            .unwrap()
            .with_land_cover(Array2::from_elem((2, 4), 130))
            .unwrap();
        let model = |_: &[f64], _: &[f64]| -> GridResult<Vec<f32>> {
            Err(GridError::InvalidInput("model diverged".to_string()))
        };
        let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping))
            .unwrap()
            .with_error_model(Box::new(model));
        let mut writer = MemoryWriter::new();

        let err = run_tile(
            &TileKey::new(2008, 1, "h15v07"),
            &Period::month(2008, 1).unwrap(),
            &aggregator,
            &mut source,
            &mut writer,
        )
        .unwrap_err();

        assert!(matches!(err, GridError::StatisticalModelFailure { .. }));
        let message = err.to_string();
        assert!(message.contains("BA [40.0, 40.0]"));
        assert!(message.contains("areas [40.0, 40.0]"));
        assert!(writer.written.is_empty());
    }

    #[test]
    fn test_writer_failure_keeps_earlier_halves() {
        struct FailOnSecondHalf(MemoryWriter);
        impl GridCellWriter for FailOnSecondHalf {
            fn write(&mut self, key: &TileKey, sub_period: SubPeriod, stats: &crate::core::stats::GridCellStats) -> GridResult<()> {
                if sub_period == SubPeriod::SecondHalf {
                    return Err(GridError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
                }
                self.0.write(key, sub_period, stats)
            }
        }

        let mut source = InMemorySource::new(Array2::from_elem((2, 4), 160), Array2::from_elem((2, 4), 1.0))
            .unwrap()
            .with_land_cover(Array2::from_elem((2, 4), 130))
            .unwrap();
        let aggregator = GridCellAggregator::new(config(), Box::new(CciLandCoverRemapping)).unwrap();
        let key = TileKey::new(2008, 6, "h15v07");
        let mut writer = FailOnSecondHalf(MemoryWriter::new());

        let err = run_tile(&key, &Period::half_month(2008, 6).unwrap(), &aggregator, &mut source, &mut writer).unwrap_err();
        assert!(matches!(err, GridError::Io(_)));
        assert_eq!(writer.0.written.len(), 1);
        assert!(writer.0.find(&key, SubPeriod::FirstHalf).is_some());
    }
}
