use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::{LoggerError, Result};

/// Environment variable naming the deployment, stamped as `env` on every record
pub const ENV_NAME_VAR: &str = "NDAU_ENV_NAME";
pub const DEFAULT_ENV_NAME: &str = "default";

/// Where records are written
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
    File(PathBuf),
}

impl LogOutput {
    /// Open the output; files are created if missing and appended to.
    pub fn make_writer(&self) -> Result<BoxMakeWriter> {
        match self {
            LogOutput::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
            LogOutput::Stdout => Ok(BoxMakeWriter::new(std::io::stdout)),
            LogOutput::File(path) => {
                let file: File = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggerError::OpenOutput {
                        path: path.clone(),
                        source,
                    })?;
                Ok(BoxMakeWriter::new(Arc::new(file)))
            }
        }
    }
}

impl FromStr for LogOutput {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(LoggerError::InvalidConfig("empty output path".to_string())),
            "stderr" => Ok(LogOutput::Stderr),
            "stdout" => Ok(LogOutput::Stdout),
            path => Ok(LogOutput::File(PathBuf::from(path))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub name: String,
    pub level: String,
    pub env_name: String,
    pub output: LogOutput,
}

impl LoggerConfig {
    /// Build a config for `name`, reading the environment name from `NDAU_ENV_NAME`.
    pub fn new(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: level.into(),
            env_name: env_name_from_env(),
            output: LogOutput::default(),
        }
    }

    pub fn with_env_name(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = env_name.into();
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }
}

fn env_name_from_env() -> String {
    std::env::var(ENV_NAME_VAR)
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ENV_NAME.to_string())
}
