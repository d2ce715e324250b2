//! Held positions and the fill journal.

use chrono::NaiveDate;

/// Quantity and average cost basis held for one instrument.
///
/// Only the ledger can create or change a position, so `quantity > 0` holds
/// for every position a caller can observe.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    quantity: i64,
    average_cost: f64,
}

impl Position {
    pub(crate) fn open(quantity: i64, price: f64) -> Self {
        Position {
            quantity,
            average_cost: price,
        }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn average_cost(&self) -> f64 {
        self.average_cost
    }

    /// Total amount paid for the units still held, at average cost.
    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.average_cost
    }

    /// Taxable gain per unit when selling at `price`. Never negative.
    pub fn gain_per_unit(&self, price: f64) -> f64 {
        (price - self.average_cost).max(0.0)
    }

    /// Blend a new purchase into the volume-weighted average cost.
    pub(crate) fn add_lot(&mut self, quantity: i64, price: f64) {
        let total = self.quantity + quantity;
        self.average_cost =
            (quantity as f64 * price + self.quantity as f64 * self.average_cost) / total as f64;
        self.quantity = total;
    }

    /// Remove `quantity` units. Returns true when nothing is left.
    pub(crate) fn reduce(&mut self, quantity: i64) -> bool {
        self.quantity -= quantity;
        self.quantity <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// One executed trade as recorded by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub side: Side,
    pub instrument: String,
    pub date: NaiveDate,
    pub quantity: i64,
    pub price: f64,
    pub fee: f64,
    pub tax: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }

    /// Signed change in cash caused by this fill.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            Side::Buy => -(self.notional() + self.fee),
            Side::Sell => self.notional() - self.fee - self.tax,
        }
    }
}
