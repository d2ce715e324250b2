//! Daily OHLCV bar representation.

use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub instrument: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    /// Derived numeric columns attached by enrichment or read from extra CSV
    /// columns. Opaque to the simulator.
    pub features: BTreeMap<String, f64>,
}

impl OhlcvBar {
    pub fn new(
        instrument: &str,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        OhlcvBar {
            instrument: instrument.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume,
            features: BTreeMap::new(),
        }
    }

    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    pub fn with_feature(mut self, name: &str, value: f64) -> Self {
        self.features.insert(name.to_string(), value);
        self
    }
}
