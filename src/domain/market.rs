//! Per-instrument price history, the unified trading timeline, and the
//! date-restricted view handed to strategies.

use crate::domain::error::StocksimError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Bars for one instrument, sorted by date with no duplicate dates.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    instrument: String,
    bars: Vec<OhlcvBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl InstrumentSeries {
    pub fn new(instrument: &str, mut bars: Vec<OhlcvBar>) -> Result<Self, StocksimError> {
        bars.sort_by_key(|b| b.date);
        let mut date_index = HashMap::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            if date_index.insert(bar.date, i).is_some() {
                return Err(StocksimError::DuplicateBar {
                    instrument: instrument.to_string(),
                    date: bar.date,
                });
            }
        }
        Ok(Self {
            instrument: instrument.to_string(),
            bars,
            date_index,
        })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    /// All bars dated on or before `cutoff`.
    pub fn up_to(&self, cutoff: NaiveDate) -> &[OhlcvBar] {
        let end = self.bars.partition_point(|b| b.date <= cutoff);
        &self.bars[..end]
    }
}

/// The complete, read-only dataset a simulation runs over.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    series: BTreeMap<String, InstrumentSeries>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group bars by instrument. Fails on a repeated (instrument, date) pair.
    pub fn from_bars(bars: Vec<OhlcvBar>) -> Result<Self, StocksimError> {
        let mut grouped: BTreeMap<String, Vec<OhlcvBar>> = BTreeMap::new();
        for bar in bars {
            grouped.entry(bar.instrument.clone()).or_default().push(bar);
        }
        let mut market = Self::new();
        for (instrument, bars) in grouped {
            market.insert(&instrument, bars)?;
        }
        Ok(market)
    }

    /// Add or replace the history of one instrument.
    pub fn insert(&mut self, instrument: &str, bars: Vec<OhlcvBar>) -> Result<(), StocksimError> {
        let series = InstrumentSeries::new(instrument, bars)?;
        self.series.insert(instrument.to_string(), series);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(|s| s.bars.is_empty())
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn series(&self, instrument: &str) -> Option<&InstrumentSeries> {
        self.series.get(instrument)
    }

    pub fn bar(&self, instrument: &str, date: NaiveDate) -> Option<&OhlcvBar> {
        self.series.get(instrument)?.get_bar(date)
    }

    /// Sorted, deduplicated dates on which any instrument traded.
    pub fn timeline(&self) -> Vec<NaiveDate> {
        let unique_dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|s| s.bars.iter().map(|bar| bar.date))
            .collect();
        unique_dates.into_iter().collect()
    }

    /// Closing price of every instrument that traded on `date`.
    pub fn closes_on(&self, date: NaiveDate) -> HashMap<String, f64> {
        self.series
            .iter()
            .filter_map(|(instrument, s)| s.get_bar(date).map(|b| (instrument.clone(), b.close)))
            .collect()
    }

    /// Everything known as of the close of `cutoff`.
    pub fn visible(&self, cutoff: NaiveDate) -> MarketView<'_> {
        MarketView {
            market: self,
            cutoff,
        }
    }
}

/// A view of [`MarketData`] that cannot reach any bar dated after its cutoff.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    market: &'a MarketData,
    cutoff: NaiveDate,
}

impl<'a> MarketView<'a> {
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Instruments with at least one visible bar.
    pub fn instruments(&self) -> Vec<&'a str> {
        self.market
            .series
            .iter()
            .filter(|(_, s)| !s.up_to(self.cutoff).is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Visible bars of one instrument, oldest first.
    pub fn history(&self, instrument: &str) -> &'a [OhlcvBar] {
        match self.market.series.get(instrument) {
            Some(s) => s.up_to(self.cutoff),
            None => &[],
        }
    }

    pub fn bar(&self, instrument: &str, date: NaiveDate) -> Option<&'a OhlcvBar> {
        if date > self.cutoff {
            return None;
        }
        self.market.series.get(instrument)?.get_bar(date)
    }

    /// The bar at the cutoff date, if the instrument traded that day.
    pub fn today(&self, instrument: &str) -> Option<&'a OhlcvBar> {
        self.bar(instrument, self.cutoff)
    }

    /// Close of the bar preceding today's bar. `None` when the instrument did
    /// not trade today or today is its first visible bar.
    pub fn previous_close(&self, instrument: &str) -> Option<f64> {
        match self.history(instrument) {
            [.., prev, last] if last.date == self.cutoff => Some(prev.close),
            _ => None,
        }
    }

    /// Instruments that traded today and have a previous close.
    pub fn tradable(&self) -> Vec<&'a str> {
        self.instruments()
            .into_iter()
            .filter(|i| self.previous_close(i).is_some())
            .collect()
    }

    /// Every visible bar across all instruments, grouped by instrument.
    pub fn rows(&self) -> impl Iterator<Item = &'a OhlcvBar> {
        let cutoff = self.cutoff;
        self.market
            .series
            .values()
            .flat_map(move |s| s.up_to(cutoff).iter())
    }
}
