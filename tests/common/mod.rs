#![allow(dead_code)]

use chrono::NaiveDate;
use stocksim::domain::error::StocksimError;
use stocksim::domain::ledger::LedgerConfig;
use stocksim::domain::market::MarketData;
pub use stocksim::domain::ohlcv::OhlcvBar;
use stocksim::ports::data_port::{DataPort, DateRange};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        range: DateRange,
    ) -> Result<Vec<OhlcvBar>, StocksimError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(StocksimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(instrument)
            .map(|bars| {
                bars.iter()
                    .filter(|b| range.contains(b.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<String>, StocksimError> {
        let mut instruments: Vec<String> = self.data.keys().cloned().collect();
        instruments.sort();
        Ok(instruments)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(instrument: &str, date: &str, open: f64, close: f64) -> OhlcvBar {
    OhlcvBar::new(
        instrument,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open,
        open.max(close) + 1.0,
        open.min(close) - 1.0,
        close,
        1000,
    )
}

/// `count` consecutive calendar days of bars drifting up by one per day, each
/// opening half a point above the previous close.
pub fn generate_bars(
    instrument: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = start_price + i as f64;
            let open = if i == 0 { start_price } else { close - 0.5 };
            OhlcvBar::new(
                instrument,
                start + chrono::Duration::days(i as i64),
                open,
                close + 1.0,
                open.min(close) - 1.0,
                close,
                1000,
            )
        })
        .collect()
}

pub fn market(bars: Vec<OhlcvBar>) -> MarketData {
    MarketData::from_bars(bars).unwrap()
}

pub fn ledger_config(cash: f64, fee: f64, tax: f64) -> LedgerConfig {
    LedgerConfig {
        initial_capital: cash,
        fee_per_trade: fee,
        capital_gains_tax_rate: tax,
    }
}

/// Write `bars` as `<dir>/<instrument>.csv` in the layout the CSV adapter reads.
pub fn write_csv(dir: &Path, instrument: &str, bars: &[OhlcvBar]) {
    let mut file = std::fs::File::create(dir.join(format!("{}.csv", instrument))).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.volume
        )
        .unwrap();
    }
}
