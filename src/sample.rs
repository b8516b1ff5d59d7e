use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EvalError;

/// A supporting document retrieved for a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }
}

/// One input/output pair to be scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Prompt or question given to the system under test
    pub input: String,
    /// Output produced by the system under test
    pub output: String,
    /// Reference output, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    /// Documents the system retrieved to produce its output
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieved_docs: Vec<Document>,
    /// Free-form measurements such as latency or token counts
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Sample {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Sets the reference output.
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    /// Appends a retrieved document.
    pub fn document(mut self, doc: Document) -> Self {
        self.retrieved_docs.push(doc);
        self
    }

    /// Inserts a metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reads a numeric metadata entry.
    ///
    /// Returns `Ok(None)` when the key is absent, and a description of the
    /// offending value when it is present but not a number.
    pub fn numeric_meta(&self, key: &str) -> Result<Option<f64>, String> {
        match self.metadata.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| format!("metadata '{key}' is not a number: {value}")),
        }
    }
}

/// Where a dataset position ended up after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// The dispatcher stopped before reaching this position
    #[default]
    NotScheduled,
    /// Every metric was attempted without error
    Scored,
    /// A hook, a metric or the context failed the sample
    Failed,
}

/// Outcome of evaluating one dataset position.
///
/// Positions that were never dispatched keep the zero value: an empty
/// sample, no scores, no error and [`SampleStatus::NotScheduled`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleResult {
    pub sample: Sample,
    /// Scores of the metrics that succeeded, keyed by metric name
    pub scores: HashMap<String, f64>,
    /// First failure observed for this sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EvalError>,
    pub status: SampleStatus,
}

impl SampleResult {
    pub(crate) fn started(sample: Sample) -> Self {
        Self {
            sample,
            ..Self::default()
        }
    }

    pub(crate) fn failed(sample: Sample, error: EvalError) -> Self {
        Self {
            sample,
            scores: HashMap::new(),
            error: Some(error),
            status: SampleStatus::Failed,
        }
    }

    /// Keeps the first failure and marks the sample failed.
    pub(crate) fn record_error(&mut self, error: EvalError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Derives the final status from the recorded error.
    pub(crate) fn finish(mut self) -> Self {
        self.status = if self.error.is_some() {
            SampleStatus::Failed
        } else {
            SampleStatus::Scored
        };
        self
    }

    pub fn score(&self, metric: &str) -> Option<f64> {
        self.scores.get(metric).copied()
    }

    pub fn was_scheduled(&self) -> bool {
        self.status != SampleStatus::NotScheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_fills_optional_fields() {
        let sample = Sample::new("q", "a")
            .expected("a")
            .document(Document::new("doc1", "context"))
            .meta("latency_ms", 120);
        assert_eq!(sample.expected_output.as_deref(), Some("a"));
        assert_eq!(sample.retrieved_docs.len(), 1);
        assert_eq!(sample.numeric_meta("latency_ms"), Ok(Some(120.0)));
    }

    #[test]
    fn numeric_meta_rejects_strings() {
        let sample = Sample::new("q", "a").meta("latency_ms", "fast");
        assert_eq!(
            sample.numeric_meta("latency_ms"),
            Err("metadata 'latency_ms' is not a number: \"fast\"".to_string())
        );
        assert_eq!(sample.numeric_meta("missing"), Ok(None));
    }

    #[test]
    fn empty_fields_are_omitted() {
        let value = serde_json::to_value(Sample::new("q", "a")).expect("serialize");
        assert_eq!(value, json!({ "input": "q", "output": "a" }));
    }

    #[test]
    fn first_error_wins() {
        let mut result = SampleResult::started(Sample::new("q", "a"));
        result.record_error(EvalError::metric("m1", "first"));
        result.record_error(EvalError::metric("m2", "second"));
        let result = result.finish();
        assert_eq!(result.error, Some(EvalError::metric("m1", "first")));
        assert_eq!(result.status, SampleStatus::Failed);
    }

    #[test]
    fn default_result_is_not_scheduled() {
        let result = SampleResult::default();
        assert!(!result.was_scheduled());
        assert!(result.scores.is_empty());
    }
}
