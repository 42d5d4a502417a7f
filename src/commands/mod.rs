//! CLI command implementations.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod assemble;

// Re-export main command functions
pub use assemble::{execute_assemble, validate_args, AssembleArgs};
