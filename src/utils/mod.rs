//! Utility modules for configuration, settings, error handling, and timing.

pub mod config;
pub mod error;
pub mod settings;
pub mod timer;

// Re-export commonly used error types for convenience
pub use error::{BackendError, ConverterError, SettingsError, StageError, StoreError};
pub use settings::Settings;
pub use timer::{time_stage, StageTiming, Timed};
