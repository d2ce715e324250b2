//! Capital curve written as `date,capital` CSV rows.

use std::path::Path;

use crate::domain::error::StocksimError;
use crate::domain::simulator::SimulationResult;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), StocksimError> {
        let to_err = |e: csv::Error| StocksimError::Data {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        };

        let mut writer = csv::Writer::from_path(output_path).map_err(to_err)?;
        for point in &result.capital_curve {
            writer.serialize(point).map_err(to_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}
