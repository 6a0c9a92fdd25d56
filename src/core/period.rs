use crate::types::{GridError, GridResult, NO_DATA, UNBURNABLE};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days before the second split day excluded from the first half
const FIRST_HALF_BUFFER: i32 = 6;

/// Days after the first split day excluded from the second half
const SECOND_HALF_BUFFER: i32 = 8;

/// Day of month of the first half-month split boundary
const FIRST_HALF_SPLIT_DAY: u32 = 7;

/// Day of month of the second half-month split boundary
const SECOND_HALF_SPLIT_DAY: u32 = 22;

/// Portion of a reporting period that a band refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubPeriod {
    Whole,
    FirstHalf,
    SecondHalf,
}

impl std::fmt::Display for SubPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubPeriod::Whole => write!(f, "whole"),
            SubPeriod::FirstHalf => write!(f, "first-half"),
            SubPeriod::SecondHalf => write!(f, "second-half"),
        }
    }
}

/// Split boundaries of a half-month period.
///
/// The two halves overlap in calendar terms; the buffers applied in
/// [`Period::contains_day`] leave a gap around mid-month so that no burn day
/// is counted in both halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfMonthSplit {
    pub doy_first_half: i32,
    pub doy_second_half: i32,
}

/// Reporting period in day-of-year units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start_doy: i32,
    end_doy: i32,
    split: Option<HalfMonthSplit>,
}

impl Period {
    pub fn new(start_doy: i32, end_doy: i32) -> GridResult<Self> {
        if start_doy < 1 || end_doy > 366 || start_doy > end_doy {
            return Err(GridError::InvalidInput(format!(
                "Invalid period bounds {}..={}",
                start_doy, end_doy
            )));
        }
        Ok(Self {
            start_doy,
            end_doy,
            split: None,
        })
    }

    pub fn with_split(self, split: HalfMonthSplit) -> GridResult<Self> {
        if split.doy_first_half > split.doy_second_half {
            return Err(GridError::InvalidInput(format!(
                "Half-month split {} is after {}",
                split.doy_first_half, split.doy_second_half
            )));
        }
        Ok(Self {
            split: Some(split),
            ..self
        })
    }

    /// Calendar month of `year`
    pub fn month(year: i32, month: u32) -> GridResult<Self> {
        let first = Self::date(year, month, 1)?;
        let last = Self::date(year, month, days_in_month(year, month)?)?;
        Self::new(first.ordinal() as i32, last.ordinal() as i32)
    }

    /// Calendar month of `year`, reported as two halves split around the 7th and the 22nd
    pub fn half_month(year: i32, month: u32) -> GridResult<Self> {
        let split = HalfMonthSplit {
            doy_first_half: Self::date(year, month, FIRST_HALF_SPLIT_DAY)?.ordinal() as i32,
            doy_second_half: Self::date(year, month, SECOND_HALF_SPLIT_DAY)?.ordinal() as i32,
        };
        Self::month(year, month)?.with_split(split)
    }

    fn date(year: i32, month: u32, day: u32) -> GridResult<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            GridError::InvalidInput(format!("Invalid date {}-{:02}-{:02}", year, month, day))
        })
    }

    pub fn start_doy(&self) -> i32 {
        self.start_doy
    }

    pub fn end_doy(&self) -> i32 {
        self.end_doy
    }

    pub fn split(&self) -> Option<HalfMonthSplit> {
        self.split
    }

    pub fn is_half_month(&self) -> bool {
        self.split.is_some()
    }

    pub fn sub_periods(&self) -> &'static [SubPeriod] {
        if self.split.is_some() {
            &[SubPeriod::FirstHalf, SubPeriod::SecondHalf]
        } else {
            &[SubPeriod::Whole]
        }
    }

    /// Whether burn day `doy` falls into `sub` (sentinels never do)
    pub fn contains_day(&self, sub: SubPeriod, doy: i32) -> bool {
        if doy == NO_DATA || doy == UNBURNABLE {
            return false;
        }
        match (sub, self.split) {
            (SubPeriod::Whole, _) => doy >= self.start_doy && doy <= self.end_doy,
            (SubPeriod::FirstHalf, Some(split)) => {
                doy >= self.start_doy && doy < split.doy_second_half - FIRST_HALF_BUFFER
            }
            (SubPeriod::SecondHalf, Some(split)) => {
                doy > split.doy_first_half + SECOND_HALF_BUFFER && doy <= self.end_doy
            }
            (_, None) => false,
        }
    }

    /// Whether a pixel counts as burned in `sub`
    pub fn is_burned(&self, sub: SubPeriod, doy: i32, burnable: bool) -> bool {
        burnable && self.contains_day(sub, doy)
    }

    /// Sub-period a pixel is burned in, first half taking precedence
    pub fn classify(&self, doy: i32, burnable: bool) -> Option<SubPeriod> {
        self.sub_periods()
            .iter()
            .copied()
            .find(|&sub| self.is_burned(sub, doy, burnable))
    }
}

fn days_in_month(year: i32, month: u32) -> GridResult<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| GridError::InvalidInput(format!("Invalid month {}-{:02}", year, month)))?;
    first_next
        .pred_opt()
        .map(|d| d.day())
        .ok_or_else(|| GridError::InvalidInput(format!("Invalid month {}-{:02}", year, month)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_period_classification() {
        let period = Period::new(10, 20).unwrap();
        assert!(period.is_burned(SubPeriod::Whole, 15, true));
        assert!(period.is_burned(SubPeriod::Whole, 10, true));
        assert!(period.is_burned(SubPeriod::Whole, 20, true));
        assert!(!period.is_burned(SubPeriod::Whole, 999, true));
        assert!(!period.is_burned(SubPeriod::Whole, -1, true));
        assert!(!period.is_burned(SubPeriod::Whole, 5, true));
        assert!(!period.is_burned(SubPeriod::Whole, 15, false));
    }

    #[test]
    fn test_month_bounds() {
        let feb_leap = Period::month(2008, 2).unwrap();
        assert_eq!(feb_leap.start_doy(), 32);
        assert_eq!(feb_leap.end_doy(), 60);

        let dec = Period::month(2019, 12).unwrap();
        assert_eq!(dec.start_doy(), 335);
        assert_eq!(dec.end_doy(), 365);
        assert!(!dec.is_half_month());
        assert_eq!(dec.sub_periods(), &[SubPeriod::Whole]);
    }

    #[test]
    fn test_half_month_buffers() {
        // June 2008: doy 153..=182, split days 159 (7th) and 174 (22nd)
        let period = Period::half_month(2008, 6).unwrap();
        let split = period.split().unwrap();
        assert_eq!(split.doy_first_half, 159);
        assert_eq!(split.doy_second_half, 174);

        // first half ends before 174 - 6 = 168
        assert!(period.is_burned(SubPeriod::FirstHalf, 153, true));
        assert!(period.is_burned(SubPeriod::FirstHalf, 167, true));
        assert!(!period.is_burned(SubPeriod::FirstHalf, 168, true));

        // second half starts after 159 + 8 = 167
        assert!(!period.is_burned(SubPeriod::SecondHalf, 167, true));
        assert!(period.is_burned(SubPeriod::SecondHalf, 168, true));
        assert!(period.is_burned(SubPeriod::SecondHalf, 182, true));
        assert!(!period.is_burned(SubPeriod::SecondHalf, 183, true));
    }

    #[test]
    fn test_classify_never_double_counts() {
        let period = Period::half_month(2008, 6).unwrap();
        for doy in 150..190 {
            let first = period.is_burned(SubPeriod::FirstHalf, doy, true);
            let second = period.is_burned(SubPeriod::SecondHalf, doy, true);
            assert!(!(first && second), "doy {} counted twice", doy);
        }
        assert_eq!(period.classify(160, true), Some(SubPeriod::FirstHalf));
        assert_eq!(period.classify(170, true), Some(SubPeriod::SecondHalf));
        assert_eq!(period.classify(170, false), None);
    }

    #[test]
    fn test_invalid_periods() {
        assert!(Period::new(20, 10).is_err());
        assert!(Period::month(2020, 13).is_err());
    }
}
