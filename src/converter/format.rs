//! Harvested grid -> intermediate file -> simulator -> trace grid.

use super::files::{read_trace, write_intermediate};
use super::simulator::SimulatorCommand;
use crate::store::Grid;
use crate::utils::error::ConverterError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of the intermediate file
pub const INTERMEDIATE_EXTENSION: &str = "csv";

/// Extension of the captured trace
pub const TRACE_EXTENSION: &str = "tsv";

/// Everything one conversion produced
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub intermediate_path: PathBuf,
    pub trace_path: PathBuf,

    /// Lines written to the intermediate file
    pub intermediate: Vec<String>,

    /// Parsed simulator output
    pub trace: Grid,
}

/// Bridges the store's grid representation and the simulator's file interface
#[derive(Debug, Clone)]
pub struct FormatConverter {
    command: SimulatorCommand,
}

impl FormatConverter {
    pub fn new(command: SimulatorCommand) -> Self {
        Self { command }
    }

    /// Convert a harvested grid into a trace
    ///
    /// **Public** - main entry point, called by the orchestrator
    ///
    /// # Arguments
    /// * `harvested` - Rows read back from the RAM file range
    /// * `output_base` - Path without extension; `.csv` and `.tsv` are appended
    ///
    /// # Errors
    /// * `ConverterError::Io` - local file failure
    /// * `ConverterError::ToolLaunch` / `ConverterError::ToolExit` - simulator failure
    pub fn convert(&self, harvested: &Grid, output_base: &Path) -> Result<Conversion, ConverterError> {
        let intermediate_path = with_suffix(output_base, INTERMEDIATE_EXTENSION);
        let trace_path = with_suffix(output_base, TRACE_EXTENSION);

        let intermediate = write_intermediate(harvested, &intermediate_path)?;
        self.command.run(&intermediate_path, &trace_path)?;
        let trace = read_trace(&trace_path)?;

        Ok(Conversion {
            intermediate_path,
            trace_path,
            intermediate,
            trace,
        })
    }
}

/// Append `.ext` to a path without replacing an existing extension
pub fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
