//! TTPASM Trace
//!
//! Pushes TTPASM source into the assembler spreadsheet, waits for the RAM
//! file it computes, runs that RAM file through Logisim, and publishes the
//! resulting execution trace to the trace analyzer spreadsheet.
//!
//! This crate provides the core implementation for the
//! `ttpasm-trace` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! ttpasm-trace program.ttpasm out/program
//! ```
//!
//! Settings and the service account key are read from `assets/` next to the
//! executable.

pub mod commands;
pub mod converter;
pub mod pipeline;
pub mod store;
pub mod utils;
