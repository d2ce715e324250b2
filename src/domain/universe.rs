//! Instrument universe: parsing the configured list and loading its history.
//!
//! Instruments that cannot be read or have no bars in range are skipped with a
//! warning; the run only fails when nothing at all could be loaded.

use crate::domain::error::StocksimError;
use crate::domain::features;
use crate::domain::market::MarketData;
use crate::ports::data_port::{DataPort, DateRange};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let instrument = trimmed.to_uppercase();
        if !seen.insert(instrument.clone()) {
            return Err(UniverseError::DuplicateInstrument(instrument));
        }
        instruments.push(instrument);
    }

    Ok(instruments)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    FetchFailed(String),
}

#[derive(Debug, Clone)]
pub struct SkippedInstrument {
    pub instrument: String,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct LoadedUniverse {
    pub market: MarketData,
    pub skipped: Vec<SkippedInstrument>,
}

/// Fetch every instrument in `range`, optionally attach the derived
/// price-move features, and assemble the market.
pub fn load_universe(
    data_port: &dyn DataPort,
    instruments: &[String],
    range: DateRange,
    enrich: bool,
) -> Result<LoadedUniverse, StocksimError> {
    let mut market = MarketData::new();
    let mut skipped = Vec::new();

    for instrument in instruments {
        let mut bars = match data_port.fetch_ohlcv(instrument, range) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(instrument = instrument.as_str(), error = %e, "skipping instrument");
                skipped.push(SkippedInstrument {
                    instrument: instrument.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(instrument = instrument.as_str(), "skipping instrument: no data in range");
            skipped.push(SkippedInstrument {
                instrument: instrument.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        bars.sort_by_key(|b| b.date);
        if enrich {
            features::enrich(&mut bars);
        }
        info!(instrument = instrument.as_str(), bars = bars.len(), "loaded");
        market.insert(instrument, bars)?;
    }

    if market.is_empty() {
        return Err(StocksimError::NoData {
            instrument: instruments.join(","),
        });
    }

    Ok(LoadedUniverse { market, skipped })
}
