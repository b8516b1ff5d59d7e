use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::EvalError, sample::Sample};

/// A named collection of samples stored as indented JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Reads a dataset file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EvalError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => EvalError::NotFound(path.display().to_string()),
            _ => EvalError::Io(format!("read {}: {err}", path.display())),
        })?;
        let dataset: Dataset = serde_json::from_slice(&data)?;
        log::debug!(
            "loaded dataset '{}' with {} samples from {}",
            dataset.name,
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Writes the dataset as indented JSON. Parent directories are not created.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EvalError> {
        let path = path.as_ref();
        let payload = serde_json::to_vec_pretty(self)?;
        fs::write(path, payload)
            .map_err(|err| EvalError::Io(format!("write {}: {err}", path.display())))
    }
}

impl From<Dataset> for Vec<Sample> {
    fn from(dataset: Dataset) -> Self {
        dataset.samples
    }
}

impl FromIterator<Sample> for Dataset {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            name: String::new(),
            samples: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::sample::Document;

    fn dataset() -> Dataset {
        Dataset::new(
            "qa",
            vec![
                Sample::new("What is Go?", "A language.")
                    .expected("A programming language.")
                    .document(Document::new("doc1", "Go is a programming language."))
                    .meta("latency_ms", 120)
                    .meta("usage", json!({ "input_tokens": 12, "tags": ["a", "b"] })),
                Sample::new("q2", "a2"),
            ],
        )
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("qa.json");
        let original = dataset();

        original.save(&path).expect("save dataset");
        let loaded = Dataset::load(&path).expect("load dataset");

        assert_eq!(loaded, original);
    }

    #[test]
    fn saved_file_is_indented_json() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("qa.json");
        dataset().save(&path).expect("save dataset");

        let text = fs::read_to_string(&path).expect("read back");
        assert!(text.contains("\n  \"name\": \"qa\""));
        assert!(text.contains("\"samples\""));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().expect("temp dir");
        let err = Dataset::load(dir.path().join("nope.json")).expect_err("missing");
        assert!(matches!(err, EvalError::NotFound(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ \"name\": ").expect("write");
        let err = Dataset::load(&path).expect_err("malformed");
        assert!(matches!(err, EvalError::JsonError(_)));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("qa.json");
        let err = dataset().save(&path).expect_err("no directory");
        assert!(matches!(err, EvalError::Io(_)));
    }

    #[test]
    fn converts_into_runner_samples() {
        let samples: Vec<Sample> = dataset().into();
        assert_eq!(samples.len(), 2);
        let collected: Dataset = samples.into_iter().collect();
        assert_eq!(collected.len(), 2);
    }
}
