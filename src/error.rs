use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error types produced while evaluating samples.
///
/// Payloads are plain strings so a single failure can be stored on its
/// sample result and in the report's error list at the same time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A metric failed to score a sample
    #[error("metric {metric}: {message}")]
    Metric { metric: String, message: String },
    /// A lifecycle hook rejected a run or a sample
    #[error("hook error: {0}")]
    Hook(String),
    /// The evaluation context was cancelled
    #[error("context canceled")]
    Cancelled,
    /// The evaluation context deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    /// A dataset file does not exist
    #[error("dataset not found: {0}")]
    NotFound(String),
    /// Filesystem errors while reading or writing datasets
    #[error("IO error: {0}")]
    Io(String),
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// Invalid or unreadable runner configuration
    #[error("config error: {0}")]
    Config(String),
    /// Errors returned by a judge model provider
    #[error("Provider error: {0}")]
    Provider(String),
    /// A worker task ended without producing a result
    #[error("worker failed: {0}")]
    Worker(String),
}

impl EvalError {
    /// Builds a metric error tagged with the metric name.
    pub fn metric(metric: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Metric {
            metric: metric.into(),
            message: message.into(),
        }
    }

    /// Builds a hook error.
    pub fn hook(message: impl Into<String>) -> Self {
        EvalError::Hook(message.into())
    }

    /// Whether this error comes from cancellation or an expired deadline.
    pub fn is_context(&self) -> bool {
        matches!(self, EvalError::Cancelled | EvalError::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<toml::de::Error> for EvalError {
    fn from(err: toml::de::Error) -> Self {
        EvalError::Config(format!("toml: {err}"))
    }
}

impl From<serde_yaml::Error> for EvalError {
    fn from(err: serde_yaml::Error) -> Self {
        EvalError::Config(format!("yaml: {err}"))
    }
}

/// Errors serialize as their display string in exported reports.
impl Serialize for EvalError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
