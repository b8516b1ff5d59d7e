use async_trait::async_trait;

use crate::{context::EvalContext, error::EvalError, metric::Metric, sample::Sample};

const NAME: &str = "exact_match";

/// Scores 1.0 when the output equals the expected output, ignoring
/// surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct ExactMatch {
    case_insensitive: bool,
}

impl ExactMatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    fn matches(&self, output: &str, expected: &str) -> bool {
        let (output, expected) = (output.trim(), expected.trim());
        if self.case_insensitive {
            output.to_lowercase() == expected.to_lowercase()
        } else {
            output == expected
        }
    }
}

#[async_trait]
impl Metric for ExactMatch {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, _ctx: &EvalContext, sample: &Sample) -> Result<f64, EvalError> {
        let expected = sample
            .expected_output
            .as_deref()
            .ok_or_else(|| EvalError::metric(NAME, "sample has no expected output"))?;
        Ok(if self.matches(&sample.output, expected) {
            1.0
        } else {
            0.0
        })
    }
}
