//! Simulated brokerage account: cash, positions and the fill journal.
//!
//! Trade sizing follows a fee-aware affordability rule: when an explicit
//! quantity cannot be paid for (including the flat fee), the purchase falls
//! back to the largest whole quantity that can. Sells never exceed the held
//! quantity. Capital-gains tax is charged per unit on the positive difference
//! between sale price and average cost; losses are neither taxed nor rebated.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use super::error::StocksimError;
use super::position::{Fill, Position, Side};

/// Combined capital-gains tax and solidarity surcharge (25% * 1.055).
pub const DEFAULT_CAPITAL_GAINS_TAX_RATE: f64 = 0.26375;

/// Starting parameters for a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub initial_capital: f64,
    pub fee_per_trade: f64,
    pub capital_gains_tax_rate: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            initial_capital: 10_000.0,
            fee_per_trade: 0.0,
            capital_gains_tax_rate: DEFAULT_CAPITAL_GAINS_TAX_RATE,
        }
    }
}

#[derive(Debug)]
pub struct Ledger {
    cash: f64,
    initial_capital: f64,
    fee_per_trade: f64,
    tax_rate: f64,
    positions: BTreeMap<String, Position>,
    fills: Vec<Fill>,
}

impl Ledger {
    pub fn new(config: &LedgerConfig) -> Self {
        Ledger {
            cash: config.initial_capital,
            initial_capital: config.initial_capital,
            fee_per_trade: config.fee_per_trade,
            tax_rate: config.capital_gains_tax_rate,
            positions: BTreeMap::new(),
            fills: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn fee_per_trade(&self) -> f64 {
        self.fee_per_trade
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Account value used for the capital curve. Open positions are not
    /// marked to market; they are realized by [`Ledger::monetize`].
    pub fn total_value(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, instrument: &str) -> Option<&Position> {
        self.positions.get(instrument)
    }

    pub fn holds(&self, instrument: &str) -> bool {
        self.positions.contains_key(instrument)
    }

    /// Held positions in instrument order.
    pub fn positions(&self) -> impl Iterator<Item = (&str, &Position)> {
        self.positions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Largest whole quantity purchasable at `price` after paying the fee.
    pub fn max_affordable(&self, price: f64) -> i64 {
        ((self.cash - self.fee_per_trade) / price).floor() as i64
    }

    /// Buy `quantity` units (or as many as affordable when `None` or when the
    /// request cannot be paid for). Returns `None` when nothing was bought.
    pub fn buy(
        &mut self,
        instrument: &str,
        date: NaiveDate,
        price: f64,
        quantity: Option<i64>,
    ) -> Result<Option<Fill>, StocksimError> {
        check_price(instrument, price)?;
        if let Some(q) = quantity {
            check_quantity(instrument, q)?;
        }

        let quantity = match quantity {
            Some(q) if self.cash >= q as f64 * price + self.fee_per_trade => q,
            _ => self.max_affordable(price),
        };
        if quantity <= 0 {
            debug!(instrument, price, cash = self.cash, "buy skipped: insufficient cash");
            return Ok(None);
        }

        self.cash -= quantity as f64 * price + self.fee_per_trade;
        self.positions
            .entry(instrument.to_string())
            .and_modify(|pos| pos.add_lot(quantity, price))
            .or_insert_with(|| Position::open(quantity, price));

        Ok(Some(self.record(Side::Buy, instrument, date, quantity, price, 0.0)))
    }

    /// Sell `quantity` units (or the whole position when `None` or when more
    /// than held is requested). Selling an instrument that is not held is a
    /// no-op.
    pub fn sell(
        &mut self,
        instrument: &str,
        date: NaiveDate,
        price: f64,
        quantity: Option<i64>,
    ) -> Result<Option<Fill>, StocksimError> {
        check_price(instrument, price)?;
        if let Some(q) = quantity {
            check_quantity(instrument, q)?;
        }

        let Some(position) = self.positions.get_mut(instrument) else {
            debug!(instrument, "sell skipped: not held");
            return Ok(None);
        };

        let held = position.quantity();
        let quantity = match quantity {
            Some(q) if q <= held => q,
            _ => held,
        };
        if quantity <= 0 {
            return Ok(None);
        }

        let tax = self.tax_rate * position.gain_per_unit(price) * quantity as f64;
        if position.reduce(quantity) {
            self.positions.remove(instrument);
        }
        self.cash += quantity as f64 * price - self.fee_per_trade - tax;

        Ok(Some(self.record(Side::Sell, instrument, date, quantity, price, tax)))
    }

    /// Sell every open position on `date` at the price given for its
    /// instrument.
    ///
    /// Every held instrument must have a price; if one is missing nothing is
    /// sold and `MissingPrice` is returned.
    pub fn monetize(
        &mut self,
        date: NaiveDate,
        prices: &HashMap<String, f64>,
    ) -> Result<(), StocksimError> {
        let mut orders = Vec::with_capacity(self.positions.len());
        for instrument in self.positions.keys() {
            let price = prices
                .get(instrument)
                .copied()
                .ok_or_else(|| StocksimError::MissingPrice {
                    instrument: instrument.clone(),
                })?;
            check_price(instrument, price)?;
            orders.push((instrument.clone(), price));
        }

        for (instrument, price) in orders {
            self.sell(&instrument, date, price, None)?;
        }
        Ok(())
    }

    fn record(
        &mut self,
        side: Side,
        instrument: &str,
        date: NaiveDate,
        quantity: i64,
        price: f64,
        tax: f64,
    ) -> Fill {
        let fill = Fill {
            side,
            instrument: instrument.to_string(),
            date,
            quantity,
            price,
            fee: self.fee_per_trade,
            tax,
        };
        debug!(?side, instrument, %date, quantity, price, tax, cash = self.cash, "fill");
        self.fills.push(fill.clone());
        fill
    }
}

fn check_price(instrument: &str, price: f64) -> Result<(), StocksimError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(StocksimError::InvalidPrice {
            instrument: instrument.to_string(),
            price,
        })
    }
}

fn check_quantity(instrument: &str, quantity: i64) -> Result<(), StocksimError> {
    if quantity > 0 {
        Ok(())
    } else {
        Err(StocksimError::InvalidQuantity {
            instrument: instrument.to_string(),
            quantity,
        })
    }
}
