//! Conversion between harvested grids and simulator traces.
//!
//! This module handles:
//! - Writing the intermediate line file
//! - Running the simulator against it
//! - Parsing the captured tab-separated trace

pub mod files;
pub mod format;
pub mod simulator;

// Re-export main types
pub use files::{parse_trace, read_trace, write_intermediate};
pub use format::{with_suffix, Conversion, FormatConverter};
pub use simulator::SimulatorCommand;
