//! CSV file data adapter.
//!
//! One file per instrument, `<base>/<INSTRUMENT>.csv`, with a header row.
//! Required columns: `date`, `open`, `high`, `low`, `close`. `volume` is
//! optional. Any other column is read as a numeric derived field; empty cells
//! in those columns are skipped.

use crate::domain::error::StocksimError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::{DataPort, DateRange};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
    extras: Vec<(usize, String)>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, StocksimError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| StocksimError::Data {
                reason: format!("{}: missing {} column", path, name),
            })
        };

        let date = require("date")?;
        let open = require("open")?;
        let high = require("high")?;
        let low = require("low")?;
        let close = require("close")?;
        let volume = find("volume");

        let known = [Some(date), Some(open), Some(high), Some(low), Some(close), volume];
        let extras = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !known.contains(&Some(*i)))
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Columns {
            date,
            open,
            high,
            low,
            close,
            volume,
            extras,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", instrument))
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, StocksimError> {
    record.get(idx).map(str::trim).ok_or_else(|| StocksimError::Data {
        reason: format!("missing {} value", name),
    })
}

fn parse_f64(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, StocksimError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| StocksimError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Prices must be finite and strictly positive.
fn parse_price(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    path: &str,
    date: NaiveDate,
) -> Result<f64, StocksimError> {
    let value = parse_f64(record, idx, name)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(StocksimError::Data {
            reason: format!("{}: invalid {} price {} on {}", path, name, value, date),
        })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        range: DateRange,
    ) -> Result<Vec<OhlcvBar>, StocksimError> {
        let path = self.csv_path(instrument);
        let display = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| StocksimError::Data {
            reason: format!("failed to read {}: {}", display, e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| StocksimError::Data {
            reason: format!("{}: CSV header error: {}", display, e),
        })?;
        let columns = Columns::from_headers(headers, &display)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StocksimError::Data {
                reason: format!("{}: CSV parse error: {}", display, e),
            })?;

            let date_str = field(&record, columns.date, "date")?;
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                StocksimError::Data {
                    reason: format!("{}: invalid date {:?}: {}", display, date_str, e),
                }
            })?;
            if !range.contains(date) {
                continue;
            }

            let volume = match columns.volume {
                Some(idx) => {
                    let raw = field(&record, idx, "volume")?;
                    // Some sources write volume as a float.
                    raw.parse::<i64>()
                        .or_else(|_| raw.parse::<f64>().map(|v| v as i64))
                        .map_err(|e| StocksimError::Data {
                            reason: format!("invalid volume value: {}", e),
                        })?
                }
                None => 0,
            };

            let open = parse_price(&record, columns.open, "open", &display, date)?;
            let high = parse_price(&record, columns.high, "high", &display, date)?;
            let low = parse_price(&record, columns.low, "low", &display, date)?;
            let close = parse_price(&record, columns.close, "close", &display, date)?;

            let mut bar = OhlcvBar::new(instrument, date, open, high, low, close, volume);
            for (idx, name) in &columns.extras {
                if field(&record, *idx, name)?.is_empty() {
                    continue;
                }
                bar.features
                    .insert(name.clone(), parse_f64(&record, *idx, name)?);
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_instruments(&self) -> Result<Vec<String>, StocksimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StocksimError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StocksimError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(instrument) = name_str.strip_suffix(".csv") {
                instruments.push(instrument.to_string());
            }
        }

        instruments.sort();
        Ok(instruments)
    }
}
