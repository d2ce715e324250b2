//! Overnight round trips: buy at yesterday's close, sell at today's open.

use chrono::NaiveDate;
use tracing::debug;

use super::{Strategy, StrategyKind, StrategyOptions};
use crate::domain::error::StocksimError;
use crate::domain::ledger::Ledger;
use crate::domain::market::MarketView;

/// Buy `quantity` units of `instrument` at its previous close (as many as
/// affordable when `None`) and sell the same units at today's open.
///
/// Returns the number of units traded, or `None` when the instrument has no
/// bar today, no previous close, or nothing could be bought.
pub(crate) fn round_trip(
    view: &MarketView<'_>,
    ledger: &mut Ledger,
    instrument: &str,
    quantity: Option<i64>,
) -> Result<Option<i64>, StocksimError> {
    let (Some(prev_close), Some(today)) = (view.previous_close(instrument), view.today(instrument))
    else {
        return Ok(None);
    };

    let Some(fill) = ledger.buy(instrument, view.cutoff(), prev_close, quantity)? else {
        return Ok(None);
    };
    ledger.sell(instrument, today.date, today.open, Some(fill.quantity))?;
    Ok(Some(fill.quantity))
}

/// Splits the available cash evenly over every visible instrument and runs an
/// overnight round trip on each one that traded today.
#[derive(Debug, Default)]
pub struct InterDayEven;

impl Strategy for InterDayEven {
    fn name(&self) -> &str {
        StrategyKind::InterDayEven.name()
    }

    fn on_day(
        &mut self,
        view: &MarketView<'_>,
        ledger: &mut Ledger,
        date: NaiveDate,
        _options: &StrategyOptions,
    ) -> Result<(), StocksimError> {
        let instruments = view.instruments();
        if instruments.is_empty() {
            return Ok(());
        }
        let budget = ledger.cash() / instruments.len() as f64 - ledger.fee_per_trade();

        for instrument in instruments {
            let Some(prev_close) = view.previous_close(instrument) else {
                continue;
            };
            let quantity = (budget / prev_close).floor().max(0.0) as i64;
            if quantity == 0 {
                continue;
            }
            if let Some(traded) = round_trip(view, ledger, instrument, Some(quantity))? {
                debug!(%date, instrument, traded, "overnight round trip");
            }
        }
        Ok(())
    }
}
