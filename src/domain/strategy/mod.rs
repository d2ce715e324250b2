//! Strategy call contract and the built-in strategy variants.
//!
//! A strategy is invoked once per simulated date with a view that cannot see
//! past that date, the account ledger, the date itself and the run's
//! [`StrategyOptions`]. It may trade any number of times; anything it wants to
//! report goes through `tracing`, the simulator only looks at errors.

pub mod inter_day;
pub mod single_pick;

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StocksimError;
use crate::domain::ledger::Ledger;
use crate::domain::market::MarketView;

pub use inter_day::InterDayEven;
pub use single_pick::{Selector, SinglePick};

pub trait Strategy {
    fn name(&self) -> &str;

    fn on_day(
        &mut self,
        view: &MarketView<'_>,
        ledger: &mut Ledger,
        date: NaiveDate,
        options: &StrategyOptions,
    ) -> Result<(), StocksimError>;
}

/// Tuning knobs shared by all strategies. Variants ignore what they do not use.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOptions {
    /// Trailing number of inter-day moves scored by the greedy selector.
    pub lookback: usize,
    /// Seed for the random selector, read when the strategy is built.
    pub seed: u64,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        StrategyOptions {
            lookback: 20,
            seed: 0,
        }
    }
}

/// Baseline that never trades.
#[derive(Debug, Default)]
pub struct NoTrade;

impl Strategy for NoTrade {
    fn name(&self) -> &str {
        StrategyKind::NoTrade.name()
    }

    fn on_day(
        &mut self,
        _view: &MarketView<'_>,
        _ledger: &mut Ledger,
        _date: NaiveDate,
        _options: &StrategyOptions,
    ) -> Result<(), StocksimError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    NoTrade,
    InterDayEven,
    InterDayRandom,
    InterDayGreedy,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::NoTrade,
        StrategyKind::InterDayEven,
        StrategyKind::InterDayRandom,
        StrategyKind::InterDayGreedy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::NoTrade => "no_trade",
            StrategyKind::InterDayEven => "inter_day_even",
            StrategyKind::InterDayRandom => "inter_day_random",
            StrategyKind::InterDayGreedy => "inter_day_greedy",
        }
    }

    pub fn build(self, options: &StrategyOptions) -> Box<dyn Strategy> {
        match self {
            StrategyKind::NoTrade => Box::new(NoTrade),
            StrategyKind::InterDayEven => Box::new(InterDayEven),
            StrategyKind::InterDayRandom => Box::new(SinglePick::random(options.seed)),
            StrategyKind::InterDayGreedy => Box::new(SinglePick::greedy()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = StocksimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| StocksimError::UnknownStrategy {
                name: s.to_string(),
            })
    }
}
