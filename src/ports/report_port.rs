//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradesimError;
use crate::domain::report::ConsensusReport;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write_backtest(&self, result: &BacktestResult, output_path: &Path)
    -> Result<(), TradesimError>;

    fn write_consensus(
        &self,
        report: &ConsensusReport,
        output_path: &Path,
    ) -> Result<(), TradesimError>;
}
