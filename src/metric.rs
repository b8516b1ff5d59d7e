use async_trait::async_trait;

use crate::{context::EvalContext, error::EvalError, sample::Sample};

/// A named scoring function over a [`Sample`].
///
/// Scores are expected in `[0, 1]`. Implementations that block (network
/// calls, sleeps) should watch `ctx` and return its error when it ends; the
/// runner never interrupts a call in progress.
#[async_trait]
pub trait Metric: Send + Sync {
    /// Stable identifier used as the report key.
    fn name(&self) -> &str;

    async fn score(&self, ctx: &EvalContext, sample: &Sample) -> Result<f64, EvalError>;
}

/// Synchronous scoring closure.
pub type ScoringFn = dyn Fn(&Sample) -> Result<f64, EvalError> + Send + Sync;

/// Adapts a closure into a [`Metric`].
pub struct FnMetric {
    name: String,
    scorer: Box<ScoringFn>,
}

impl FnMetric {
    pub fn new<F>(name: impl Into<String>, scorer: F) -> Self
    where
        F: Fn(&Sample) -> Result<f64, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            scorer: Box::new(scorer),
        }
    }
}

/// Shorthand for [`FnMetric::new`].
pub fn metric_fn<F>(name: impl Into<String>, scorer: F) -> FnMetric
where
    F: Fn(&Sample) -> Result<f64, EvalError> + Send + Sync + 'static,
{
    FnMetric::new(name, scorer)
}

#[async_trait]
impl Metric for FnMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn score(&self, _ctx: &EvalContext, sample: &Sample) -> Result<f64, EvalError> {
        (self.scorer)(sample)
    }
}

impl std::fmt::Debug for FnMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMetric").field("name", &self.name).finish()
    }
}
