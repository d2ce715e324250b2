//! Day-by-day backtest loop and the capital curve it produces.
//!
//! Each run walks the unified timeline in ascending order. For every date the
//! strategy sees only bars dated on or before it, trades against the run's own
//! ledger, and the ledger's cash is sampled afterwards. After the last date all
//! open positions are sold at that date's closes and the final sample is
//! replaced with the realized cash.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::error::StocksimError;
use super::ledger::{Ledger, LedgerConfig};
use super::market::MarketData;
use super::strategy::{Strategy, StrategyKind, StrategyOptions};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapitalPoint {
    pub date: NaiveDate,
    pub capital: f64,
}

#[derive(Debug)]
pub struct SimulationResult {
    pub capital_curve: Vec<CapitalPoint>,
    /// Ledger state after final liquidation.
    pub ledger: Ledger,
}

impl SimulationResult {
    pub fn final_capital(&self) -> f64 {
        self.capital_curve
            .last()
            .map(|p| p.capital)
            .unwrap_or_else(|| self.ledger.initial_capital())
    }

    /// Final capital relative to the starting capital, as a fraction.
    pub fn total_return(&self) -> f64 {
        let initial = self.ledger.initial_capital();
        if initial > 0.0 {
            (self.final_capital() - initial) / initial
        } else {
            0.0
        }
    }

    pub fn peak_capital(&self) -> f64 {
        self.capital_curve
            .iter()
            .map(|p| p.capital)
            .fold(self.ledger.initial_capital(), f64::max)
    }

    pub fn fees_paid(&self) -> f64 {
        self.ledger.fills().iter().map(|f| f.fee).sum()
    }

    pub fn taxes_paid(&self) -> f64 {
        self.ledger.fills().iter().map(|f| f.tax).sum()
    }
}

/// Replays a fixed market. Holds no state that changes between runs.
#[derive(Debug)]
pub struct Simulator<'a> {
    market: &'a MarketData,
    dates: Vec<NaiveDate>,
}

impl<'a> Simulator<'a> {
    pub fn new(market: &'a MarketData) -> Self {
        Simulator {
            market,
            dates: market.timeline(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Run `strategy` from a fresh ledger. A strategy error or a failed final
    /// liquidation aborts the run.
    pub fn run(
        &self,
        strategy: &mut dyn Strategy,
        ledger_config: &LedgerConfig,
        options: &StrategyOptions,
    ) -> Result<SimulationResult, StocksimError> {
        let mut ledger = Ledger::new(ledger_config);
        let mut capital_curve = Vec::with_capacity(self.dates.len());

        info!(
            strategy = strategy.name(),
            dates = self.dates.len(),
            initial_capital = ledger.cash(),
            "simulation started"
        );

        for &date in &self.dates {
            let view = self.market.visible(date);
            strategy.on_day(&view, &mut ledger, date, options)?;
            let capital = ledger.total_value();
            debug!(%date, capital, "step");
            capital_curve.push(CapitalPoint { date, capital });
        }

        if let Some(&last) = self.dates.last() {
            ledger.monetize(last, &self.market.closes_on(last))?;
            if let Some(point) = capital_curve.last_mut() {
                point.capital = ledger.total_value();
            }
            info!(
                strategy = strategy.name(),
                %last,
                final_capital = ledger.total_value(),
                fills = ledger.fills().len(),
                "simulation completed"
            );
        }

        Ok(SimulationResult {
            capital_curve,
            ledger,
        })
    }

    /// Run each built-in strategy from its own fresh ledger over the same market.
    pub fn compare(
        &self,
        kinds: &[StrategyKind],
        ledger_config: &LedgerConfig,
        options: &StrategyOptions,
    ) -> Result<Vec<(StrategyKind, SimulationResult)>, StocksimError> {
        kinds
            .iter()
            .map(|&kind| {
                let mut strategy = kind.build(options);
                self.run(strategy.as_mut(), ledger_config, options)
                    .map(|result| (kind, result))
            })
            .collect()
    }
}
