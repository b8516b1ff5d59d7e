use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

const DEFAULT_PARALLEL: usize = 1;

/// Scheduling limits for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum number of samples evaluated at once
    pub parallel: usize,
    /// Run deadline in milliseconds, 0 disables it
    pub timeout_ms: u64,
    /// Stop dispatching new samples after the first sample error
    pub stop_on_error: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL,
            timeout_ms: 0,
            stop_on_error: false,
        }
    }
}

/// Whole milliseconds covering `timeout`, rounded up so that any non-zero
/// duration still sets a deadline.
pub(super) fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

impl RunnerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Replaces a zero parallelism bound with the default.
    pub fn normalized(mut self) -> Self {
        if self.parallel == 0 {
            log::warn!("parallel must be at least 1, using {DEFAULT_PARALLEL}");
            self.parallel = DEFAULT_PARALLEL;
        }
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, EvalError> {
        Ok(toml::from_str::<Self>(contents)?.normalized())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, EvalError> {
        Ok(serde_yaml::from_str::<Self>(contents)?.normalized())
    }

    pub fn from_json_str(contents: &str) -> Result<Self, EvalError> {
        serde_json::from_str::<Self>(contents)
            .map(Self::normalized)
            .map_err(|err| EvalError::Config(format!("json: {err}")))
    }

    /// Loads a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EvalError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| EvalError::Config(format!("{}: {err}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            _ => Err(EvalError::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }
}
