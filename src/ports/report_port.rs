//! Simulation report output port.

use std::path::Path;

use crate::domain::error::StocksimError;
use crate::domain::simulator::SimulationResult;

pub trait ReportPort {
    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), StocksimError>;
}
