//! Overnight round trip on a single instrument per day, chosen by a selector.

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::inter_day::round_trip;
use super::{Strategy, StrategyKind, StrategyOptions};
use crate::domain::error::StocksimError;
use crate::domain::ledger::Ledger;
use crate::domain::market::MarketView;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug)]
pub enum Selector {
    /// Uniform choice among today's tradable instruments.
    Random(StdRng),
    /// Instrument whose open most often gapped above the previous close over
    /// the trailing `lookback` moves. Ties go to the smallest identifier.
    Greedy,
}

impl Selector {
    /// Only instruments with a bar today and a previous close are eligible.
    pub fn pick<'a>(
        &mut self,
        view: &MarketView<'a>,
        options: &StrategyOptions,
    ) -> Option<&'a str> {
        let candidates = view.tradable();
        match self {
            Selector::Random(rng) => candidates.choose(rng).copied(),
            Selector::Greedy => {
                let mut best: Option<(&'a str, f64)> = None;
                for instrument in candidates {
                    let score = up_move_frequency(view.history(instrument), options.lookback);
                    if best.is_none_or(|(_, top)| score > top) {
                        best = Some((instrument, score));
                    }
                }
                best.map(|(instrument, _)| instrument)
            }
        }
    }
}

/// Share of positive gaps (open above previous close) among the last
/// `lookback` completed moves in `history`. The last bar is today's and is not
/// scored, since its open is where the position gets sold.
pub fn up_move_frequency(history: &[OhlcvBar], lookback: usize) -> f64 {
    let Some((_, past)) = history.split_last() else {
        return 0.0;
    };
    let moves: Vec<bool> = past.windows(2).map(|w| w[1].open > w[0].close).collect();
    let recent = &moves[moves.len().saturating_sub(lookback)..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().filter(|&&up| up).count() as f64 / recent.len() as f64
}

/// Puts all available cash into one instrument per day.
#[derive(Debug)]
pub struct SinglePick {
    selector: Selector,
}

impl SinglePick {
    pub fn random(seed: u64) -> Self {
        SinglePick {
            selector: Selector::Random(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn greedy() -> Self {
        SinglePick {
            selector: Selector::Greedy,
        }
    }
}

impl Strategy for SinglePick {
    fn name(&self) -> &str {
        match self.selector {
            Selector::Random(_) => StrategyKind::InterDayRandom.name(),
            Selector::Greedy => StrategyKind::InterDayGreedy.name(),
        }
    }

    fn on_day(
        &mut self,
        view: &MarketView<'_>,
        ledger: &mut Ledger,
        date: NaiveDate,
        options: &StrategyOptions,
    ) -> Result<(), StocksimError> {
        let Some(instrument) = self.selector.pick(view, options) else {
            return Ok(());
        };
        if let Some(traded) = round_trip(view, ledger, instrument, None)? {
            debug!(%date, instrument, traded, "single pick round trip");
        }
        Ok(())
    }
}
