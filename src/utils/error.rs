//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a remote grid backend for a single request
#[derive(Error, Debug)]
pub enum BackendError {
    /// The session must be re-established before the request can succeed
    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by the remote store client
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Data unavailable at {address}: error marker still present after {attempts} attempts")]
    DataUnavailable { address: String, attempts: u32 },

    #[error("Computation timed out at {address}: still pending after {attempts} attempts ({waited_secs:.1}s)")]
    ComputationTimeout {
        address: String,
        attempts: u32,
        waited_secs: f64,
    },

    #[error("Connection to remote store lost at {address} after {reconnects} reconnects")]
    ConnectionLost { address: String, reconnects: u32 },

    #[error("Write to {address} failed: {source}")]
    WriteFailure {
        address: String,
        #[source]
        source: BackendError,
    },

    #[error("Read from {address} failed: {source}")]
    ReadFailed {
        address: String,
        #[source]
        source: BackendError,
    },

    #[error("Could not authenticate with remote store: {0}")]
    Authentication(#[source] BackendError),

    #[error("Invalid retry policy: {0}")]
    InvalidPolicy(String),
}

/// Errors that can occur while converting the harvested grid into a trace
#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("Failed to launch simulator '{program}': {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Simulator exited with {status}: {stderr}")]
    ToolExit { status: String, stderr: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConverterError {
    /// Whether this failure came from the external simulator itself
    pub fn is_external_tool_failure(&self) -> bool {
        matches!(self, Self::ToolLaunch { .. } | Self::ToolExit { .. })
    }
}

/// Errors that can occur while loading settings and credentials
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing setting: {0}")]
    MissingKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    #[error("Invalid settings pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Cause recorded when a pipeline stage fails
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Converter(#[from] ConverterError),

    #[error("Failed to read source file {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
