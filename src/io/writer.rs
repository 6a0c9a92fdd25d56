use crate::core::period::SubPeriod;
use crate::core::stats::GridCellStats;
use crate::types::{GridError, GridResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Identifier of one tile and month, formatted `2008-06-h15v07`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub year: i32,
    pub month: u32,
    pub tile: String,
}

const TILE_PATTERN: &str = r"^h(\d{2})v(\d{2})$";
const KEY_PATTERN: &str = r"^(\d{4})-(\d{2})-(.+)$";

fn compiled(cell: &'static OnceLock<Result<Regex, regex::Error>>, expr: &str) -> GridResult<&'static Regex> {
    cell.get_or_init(|| Regex::new(expr))
        .as_ref()
        .map_err(|e| GridError::Config(format!("Bad pattern {}: {}", expr, e)))
}

fn key_pattern() -> GridResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    compiled(&PATTERN, KEY_PATTERN)
}

fn tile_pattern() -> GridResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    compiled(&PATTERN, TILE_PATTERN)
}

impl TileKey {
    pub fn new(year: i32, month: u32, tile: impl Into<String>) -> Self {
        Self {
            year,
            month,
            tile: tile.into(),
        }
    }

    pub fn parse(key: &str) -> GridResult<Self> {
        let caps = key_pattern()?
            .captures(key)
            .ok_or_else(|| GridError::InvalidInput(format!("Invalid tile key '{}'", key)))?;
        let year = caps[1]
            .parse()
            .map_err(|_| GridError::InvalidInput(format!("Invalid year in '{}'", key)))?;
        let month = caps[2]
            .parse()
            .map_err(|_| GridError::InvalidInput(format!("Invalid month in '{}'", key)))?;
        Ok(Self::new(year, month, &caps[3]))
    }

    /// Horizontal and vertical index of an `hXXvYY` tile
    pub fn tile_indices(&self) -> GridResult<(usize, usize)> {
        let caps = tile_pattern()?
            .captures(&self.tile)
            .ok_or_else(|| GridError::InvalidInput(format!("Invalid tile '{}'", self.tile)))?;
        let h = caps[1].parse().map_err(|_| GridError::InvalidInput(self.tile.clone()))?;
        let v = caps[2].parse().map_err(|_| GridError::InvalidInput(self.tile.clone()))?;
        Ok((h, v))
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}-{}", self.year, self.month, self.tile)
    }
}

/// Consumer of finished grid-cell statistics (e.g. a NetCDF product writer).
///
/// Called once per sub-period of a tile. Each call is independent: a failed
/// call does not undo the sub-periods written before it.
pub trait GridCellWriter {
    fn write(&mut self, key: &TileKey, sub_period: SubPeriod, stats: &GridCellStats) -> GridResult<()>;
}

/// Writer that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub written: Vec<(TileKey, SubPeriod, GridCellStats)>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, key: &TileKey, sub_period: SubPeriod) -> Option<&GridCellStats> {
        self.written
            .iter()
            .find(|(k, sub, _)| k == key && *sub == sub_period)
            .map(|(_, _, s)| s)
    }
}

impl GridCellWriter for MemoryWriter {
    fn write(&mut self, key: &TileKey, sub_period: SubPeriod, stats: &GridCellStats) -> GridResult<()> {
        self.written.push((key.clone(), sub_period, stats.clone()));
        Ok(())
    }
}
