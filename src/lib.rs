//! stocksim: daily backtester for simple trading strategies.
//!
//! Hexagonal architecture: the ledger, market view, strategies and simulator
//! live in [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`], and the command line in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

/// Install the global `tracing` subscriber. Filter with `RUST_LOG`, default `warn`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
