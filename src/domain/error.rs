//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stocksim.
///
/// Business-rule shortfalls (insufficient cash, over-selling, selling an
/// instrument that is not held) are deliberately absent: the ledger resolves
/// those by clamping or skipping.
#[derive(Debug, thiserror::Error)]
pub enum StocksimError {
    #[error("invalid price for {instrument}: {price} (must be positive)")]
    InvalidPrice { instrument: String, price: f64 },

    #[error("invalid quantity for {instrument}: {quantity} (must be a positive integer)")]
    InvalidQuantity { instrument: String, quantity: i64 },

    #[error("no liquidation price for held instrument {instrument}")]
    MissingPrice { instrument: String },

    #[error("duplicate bar for {instrument} on {date}")]
    DuplicateBar { instrument: String, date: NaiveDate },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {instrument}")]
    NoData { instrument: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StocksimError> for std::process::ExitCode {
    fn from(err: &StocksimError) -> Self {
        let code: u8 = match err {
            StocksimError::Io(_) => 1,
            StocksimError::ConfigParse { .. }
            | StocksimError::ConfigMissing { .. }
            | StocksimError::ConfigInvalid { .. } => 2,
            StocksimError::Data { .. }
            | StocksimError::NoData { .. }
            | StocksimError::DuplicateBar { .. } => 3,
            StocksimError::UnknownStrategy { .. }
            | StocksimError::InvalidPrice { .. }
            | StocksimError::InvalidQuantity { .. } => 4,
            StocksimError::MissingPrice { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
