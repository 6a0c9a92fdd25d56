use firegrid::config::{AggregationConfig, MinimumSample, LC_CLASSES_COUNT};
use std::io::Write;

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"<aggregation>
    <cellSize>45</cellSize>
    <targetWidth>80</targetWidth>
    <targetHeight>80</targetHeight>
    <maskUnmappablePixels>true</maskUnmappablePixels>
    <tolerances>
        <minBurnedCells>10</minBurnedCells>
        <burnableLcSlack>1.2</burnableLcSlack>
    </tolerances>
</aggregation>"#
    )
    .unwrap();

    let config = AggregationConfig::from_file(file.path()).unwrap();
    assert_eq!(config.cell_size, 45);
    assert_eq!(config.band_size(), 6400);
    assert_eq!(config.land_cover_class_count, LC_CLASSES_COUNT);
    assert!(config.mask_unmappable_pixels);
    assert_eq!(config.tolerances.minimum_sample(true), MinimumSample::Cells(10));
    assert_eq!(config.tolerances.burnable_lc_slack, Some(1.2));
    assert_eq!(config.tolerances.area_slack, 1.001);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AggregationConfig::from_file(dir.path().join("absent.xml")).is_err());
}

#[test]
fn test_invalid_config_rejected() {
    let xml = "<aggregation><cellSize>0</cellSize></aggregation>";
    assert!(AggregationConfig::from_xml_str(xml).is_err());
}
