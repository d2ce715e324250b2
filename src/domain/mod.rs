//! Core domain types and logic.

pub mod ohlcv;
pub mod features;
pub mod market;
pub mod position;
pub mod ledger;
pub mod strategy;
pub mod simulator;
pub mod universe;
pub mod config_validation;
pub mod error;
