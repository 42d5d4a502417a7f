//! Assemble command implementation.
//!
//! The assemble command:
//! 1. Loads settings and service account credentials
//! 2. Builds the Sheets-backed store and the Logisim converter
//! 3. Runs the pipeline
//! 4. Prints the summary

use crate::converter::{FormatConverter, SimulatorCommand};
use crate::pipeline::{render_summary, Pipeline, PipelineConfig, PipelineRun};
use crate::store::{RemoteStore, RetryPolicy, ServiceAccountCredentials, SheetsBackend};
use crate::utils::config::{trace_view_url, SERVICE_ACCOUNT_FILE, SETTINGS_FILE};
use crate::utils::settings::Settings;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Arguments for the assemble command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AssembleArgs {
    /// TTPASM source file
    pub source_path: PathBuf,

    /// Output path without extension
    pub output_base: PathBuf,

    /// `key="value"` settings file
    pub settings_path: PathBuf,

    /// Service account key
    pub credentials_path: PathBuf,
}

impl AssembleArgs {
    /// Arguments with settings and credentials looked up next to the executable
    pub fn new(source_path: impl Into<PathBuf>, output_base: impl Into<PathBuf>) -> Self {
        let assets = install_dir();

        Self {
            source_path: source_path.into(),
            output_base: output_base.into(),
            settings_path: assets.join(SETTINGS_FILE),
            credentials_path: assets.join(SERVICE_ACCOUNT_FILE),
        }
    }
}

/// Directory holding the running executable
///
/// **Private** - falls back to the working directory
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Validate assemble arguments
///
/// **Public** - can be called before execute_assemble for early validation
pub fn validate_args(args: &AssembleArgs) -> Result<()> {
    if !args.source_path.is_file() {
        anyhow::bail!(
            "Source file does not exist: {}",
            args.source_path.display()
        );
    }

    if args.output_base.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }

    if args.output_base.is_dir() {
        anyhow::bail!(
            "Output path must be a file base name, not a directory: {}",
            args.output_base.display()
        );
    }

    Ok(())
}

/// Execute the assemble command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The finished run. A run that ends in `Failed` is still `Ok` here; the
/// caller decides the exit status from it.
///
/// # Errors
/// * Settings file missing or incomplete
/// * Service account key missing or invalid
/// * Invalid retry budget
pub fn execute_assemble(args: AssembleArgs) -> Result<PipelineRun> {
    let settings = Settings::load(&args.settings_path).with_context(|| {
        format!("Failed to load settings from {}", args.settings_path.display())
    })?;
    debug!("Settings: {:?}", settings);

    let credentials = ServiceAccountCredentials::load(&args.credentials_path).with_context(|| {
        format!(
            "Failed to load service account key from {}",
            args.credentials_path.display()
        )
    })?;

    let policy = RetryPolicy::new(settings.max_retries, settings.backoff)
        .context("Invalid retry settings")?
        .with_max_reconnects(settings.max_reconnects);

    let store = RemoteStore::new(SheetsBackend::new(credentials), policy);
    let converter = FormatConverter::new(SimulatorCommand::logisim(
        &settings.java_path,
        &settings.logisim_path,
        &settings.processor_path,
    ));
    let config = PipelineConfig::new(
        &args.source_path,
        &args.output_base,
        &settings.assembler_id,
        &settings.trace_id,
    );

    info!("Assembling: {}", args.source_path.display());

    let mut pipeline = Pipeline::new(store, converter, config);
    let run = pipeline.run();

    let summary = render_summary(&run, Some(&trace_view_url(&settings.trace_id)));
    if run.is_success() {
        println!("{}", summary);
    } else {
        eprintln!("{}", summary);
    }

    Ok(run)
}
