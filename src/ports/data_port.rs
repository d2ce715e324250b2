//! Price history access port.

use crate::domain::error::StocksimError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Inclusive date bounds; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

pub trait DataPort {
    /// Bars of one instrument inside `range`, sorted by date.
    fn fetch_ohlcv(&self, instrument: &str, range: DateRange)
        -> Result<Vec<OhlcvBar>, StocksimError>;

    fn list_instruments(&self) -> Result<Vec<String>, StocksimError>;
}
