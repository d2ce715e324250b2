//! Derived price-move columns attached to bars before simulation.
//!
//! The simulator never reads these; strategies may.

use crate::domain::ohlcv::OhlcvBar;

pub const WITHIN_DAY: &str = "within_day";
pub const WITHIN_DAY_REL: &str = "within_day_rel";
pub const BETWEEN_DAY: &str = "between_day";
pub const BETWEEN_DAY_REL: &str = "between_day_rel";

/// Close minus open of the same bar.
pub fn within_day(bar: &OhlcvBar) -> f64 {
    bar.close - bar.open
}

/// Open of `bar` minus the previous bar's close.
pub fn between_day(prev: &OhlcvBar, bar: &OhlcvBar) -> f64 {
    bar.open - prev.close
}

/// Attach within-day and between-day moves (absolute and relative) to each
/// bar of one instrument. `bars` must be sorted by date. Between-day fields
/// are left off the first bar. Relative fields are skipped when the
/// denominator is zero.
pub fn enrich(bars: &mut [OhlcvBar]) {
    for i in 0..bars.len() {
        let gap = (i > 0).then(|| (between_day(&bars[i - 1], &bars[i]), bars[i - 1].close));
        let bar = &mut bars[i];

        let intraday = within_day(bar);
        bar.features.insert(WITHIN_DAY.to_string(), intraday);
        if bar.open != 0.0 {
            bar.features
                .insert(WITHIN_DAY_REL.to_string(), intraday / bar.open);
        }

        if let Some((gap, prev_close)) = gap {
            bar.features.insert(BETWEEN_DAY.to_string(), gap);
            if prev_close != 0.0 {
                bar.features
                    .insert(BETWEEN_DAY_REL.to_string(), gap / prev_close);
            }
        }
    }
}
