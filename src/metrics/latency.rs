use std::time::Duration;

use async_trait::async_trait;

use crate::{context::EvalContext, error::EvalError, metric::Metric, sample::Sample};

const NAME: &str = "latency";
const DEFAULT_KEY: &str = "latency_ms";

/// Scores how far a sample's recorded latency stays under a budget.
///
/// A latency of zero scores 1.0, anything at or above the budget scores 0.0.
#[derive(Debug, Clone)]
pub struct Latency {
    budget_ms: f64,
    key: String,
}

impl Latency {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget_ms: budget.as_secs_f64() * 1000.0,
            key: DEFAULT_KEY.to_string(),
        }
    }

    /// Reads the latency from another metadata key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

#[async_trait]
impl Metric for Latency {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, _ctx: &EvalContext, sample: &Sample) -> Result<f64, EvalError> {
        let latency = sample
            .numeric_meta(&self.key)
            .map_err(|msg| EvalError::metric(NAME, msg))?
            .ok_or_else(|| EvalError::metric(NAME, format!("missing metadata '{}'", self.key)))?;
        if latency < 0.0 {
            return Err(EvalError::metric(NAME, format!("negative latency {latency}")));
        }
        if self.budget_ms <= 0.0 {
            return Ok(if latency == 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - (latency / self.budget_ms).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1.0)]
    #[case(250, 0.75)]
    #[case(1000, 0.0)]
    #[case(5000, 0.0)]
    #[tokio::test]
    async fn scores_against_budget(#[case] latency_ms: u64, #[case] expected: f64) {
        let metric = Latency::new(Duration::from_secs(1));
        let sample = Sample::new("q", "a").meta("latency_ms", latency_ms);
        let score = metric
            .score(&EvalContext::new(), &sample)
            .await
            .expect("score");
        assert!((score - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn custom_key() {
        let metric = Latency::new(Duration::from_millis(100)).key("ttft_ms");
        let sample = Sample::new("q", "a").meta("ttft_ms", 50);
        let score = metric
            .score(&EvalContext::new(), &sample)
            .await
            .expect("score");
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_or_invalid_latency_fails() {
        let metric = Latency::new(Duration::from_secs(1));
        let ctx = EvalContext::new();
        assert!(metric.score(&ctx, &Sample::new("q", "a")).await.is_err());
        let sample = Sample::new("q", "a").meta("latency_ms", "slow");
        let err = metric.score(&ctx, &sample).await.expect_err("non-numeric");
        assert_eq!(
            err,
            EvalError::metric(NAME, "metadata 'latency_ms' is not a number: \"slow\"")
        );
    }
}
