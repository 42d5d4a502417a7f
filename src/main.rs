//! TTPASM Trace CLI
//!
//! Assembles a TTPASM program through the assembler spreadsheet, simulates it
//! with Logisim, and publishes the execution trace.

use clap::error::ErrorKind;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use std::process::ExitCode;

use ttpasm_trace::commands::{execute_assemble, validate_args, AssembleArgs};

/// Exit status when the pipeline stops at a failed stage
const PIPELINE_FAILED: u8 = 2;

/// TTPASM Trace - assemble, simulate and publish a trace
#[derive(Parser, Debug)]
#[command(name = "ttpasm-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TTPASM assembly file
    source: PathBuf,

    /// Output path without extension (<base>.csv and <base>.tsv are written)
    output_base: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                return ExitCode::SUCCESS;
            }
            eprintln!(
                "proper usage: ttpasm-trace <path to assembly file> <path to output file without extension>"
            );
            return ExitCode::from(1);
        }
    };

    // Setup logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = AssembleArgs::new(cli.source, cli.output_base);

    let result = validate_args(&args).and_then(|()| execute_assemble(args));

    match result {
        Ok(run) if run.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(PIPELINE_FAILED),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
