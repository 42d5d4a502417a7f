//! Runtime settings loaded from `assets/settings.txt`.
//!
//! The file is a list of `key="value"` lines. Older settings files carry the
//! four required values without meaningful key names; those are accepted
//! positionally in the order `logisim_path`, `processor_path`, `assembler_id`,
//! `trace_id`.

use super::config::{DEFAULT_BACKOFF, DEFAULT_JAVA, DEFAULT_MAX_RECONNECTS, DEFAULT_MAX_RETRIES};
use super::error::SettingsError;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTING_PATTERN: &str = r#"(?m)^\s*(.+?)\s*=\s*"(.*)"\s*$"#;

const REQUIRED_KEYS: [&str; 4] = ["logisim_path", "processor_path", "assembler_id", "trace_id"];

/// Settings for one pipeline invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Java launcher used to run the simulator jar
    pub java_path: String,

    /// Logisim jar
    pub logisim_path: PathBuf,

    /// Processor circuit loaded into Logisim
    pub processor_path: PathBuf,

    /// Spreadsheet holding the source and RAM file ranges
    pub assembler_id: String,

    /// Spreadsheet receiving the trace
    pub trace_id: String,

    pub max_retries: u32,
    pub backoff: Duration,
    pub max_reconnects: u32,
}

impl Settings {
    /// Load settings from a file
    ///
    /// **Public** - called once at startup by the assemble command
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        debug!("Reading settings from: {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents)
    }

    /// Parse settings from `key="value"` text
    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        let pattern = Regex::new(SETTING_PATTERN)?;

        let pairs: Vec<(String, String)> = pattern
            .captures_iter(contents)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect();

        let mut values: HashMap<String, String> = pairs.iter().cloned().collect();

        let named = REQUIRED_KEYS.iter().any(|key| values.contains_key(*key));
        if !named && pairs.len() == REQUIRED_KEYS.len() {
            debug!("Settings keys not recognised, reading values positionally");
            values = REQUIRED_KEYS
                .iter()
                .map(|key| key.to_string())
                .zip(pairs.into_iter().map(|(_, value)| value))
                .collect();
        }

        let required = |key: &str| {
            values
                .get(key)
                .cloned()
                .ok_or_else(|| SettingsError::MissingKey(key.to_string()))
        };

        Ok(Self {
            java_path: values
                .get("java_path")
                .cloned()
                .unwrap_or_else(|| DEFAULT_JAVA.to_string()),
            logisim_path: PathBuf::from(required("logisim_path")?),
            processor_path: PathBuf::from(required("processor_path")?),
            assembler_id: required("assembler_id")?,
            trace_id: required("trace_id")?,
            max_retries: parse_number(&values, "max_retries", DEFAULT_MAX_RETRIES as u64)? as u32,
            backoff: Duration::from_millis(parse_number(
                &values,
                "backoff_ms",
                DEFAULT_BACKOFF.as_millis() as u64,
            )?),
            max_reconnects: parse_number(&values, "max_reconnects", DEFAULT_MAX_RECONNECTS as u64)?
                as u32,
        })
    }
}

/// Parse an optional numeric setting
///
/// **Private** - internal helper
fn parse_number(
    values: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, SettingsError> {
    match values.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u32>().map(u64::from).map_err(|_| {
            SettingsError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
            }
        }),
    }
}
