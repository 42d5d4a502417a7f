//! External simulator invocation.

use crate::utils::error::ConverterError;
use log::{debug, info};
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

/// Program and leading arguments of the simulator
///
/// `-load <intermediate>` is appended on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SimulatorCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Logisim in headless table mode: `java -jar <jar> <circuit> -tty table`
    pub fn logisim(java: &str, jar: &Path, processor: &Path) -> Self {
        Self::new(
            java,
            [
                "-jar".to_string(),
                jar.display().to_string(),
                processor.display().to_string(),
                "-tty".to_string(),
                "table".to_string(),
            ],
        )
    }

    /// Command line as it will be run, for logs
    pub fn describe(&self, input: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push("-load".to_string());
        parts.push(input.display().to_string());
        parts.join(" ")
    }

    /// Run the simulator once, capturing stdout into `output`
    ///
    /// **Public** - step 2 of the conversion
    ///
    /// Blocks until the process has exited. The output file handle belongs to
    /// the child and is closed by the time this returns, so the caller may
    /// read `output` immediately afterwards.
    ///
    /// # Errors
    /// * `ConverterError::Io` - output file could not be created
    /// * `ConverterError::ToolLaunch` - program missing or not executable
    /// * `ConverterError::ToolExit` - non-zero exit status
    pub fn run(&self, input: &Path, output: &Path) -> Result<(), ConverterError> {
        let stdout = File::create(output).map_err(|source| ConverterError::Io {
            path: output.to_path_buf(),
            source,
        })?;

        info!("Running simulator: {}", self.describe(input));

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("-load")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped());

        let result = command.output().map_err(|source| ConverterError::ToolLaunch {
            program: self.program.clone(),
            source,
        })?;
        drop(command);

        if !result.status.success() {
            return Err(ConverterError::ToolExit {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !result.stderr.is_empty() {
            debug!(
                "Simulator stderr: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        Ok(())
    }
}
