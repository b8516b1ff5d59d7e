use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::OwnedSemaphorePermit;

use crate::{
    context::EvalContext,
    error::EvalError,
    hooks::Hooks,
    metric::Metric,
    sample::{Sample, SampleResult},
};

use super::state::SharedState;

/// Evaluates one dataset position on its own task.
pub(super) struct Worker {
    pub(super) ctx: EvalContext,
    pub(super) metrics: Arc<[Arc<dyn Metric>]>,
    pub(super) hooks: Hooks,
    pub(super) state: Arc<SharedState>,
    pub(super) stop_on_error: bool,
}

enum Outcome {
    /// Failed before the metric loop finished; no after-sample hook
    Rejected(SampleResult),
    Evaluated(SampleResult),
}

impl Worker {
    /// Runs hooks and metrics for `sample`, then writes slot `index`.
    ///
    /// The permit is held for the evaluation and released before the
    /// after-sample hook runs. A panic while evaluating fails this sample
    /// like any other error.
    pub(super) async fn run(self, index: usize, sample: Sample, permit: OwnedSemaphorePermit) {
        let outcome = AssertUnwindSafe(self.process(index, sample.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let err = panic_error(payload);
                log::error!("sample {index}: {err}");
                Outcome::Rejected(SampleResult::failed(sample, err))
            });

        match outcome {
            Outcome::Rejected(result) => {
                self.state.store(index, result, self.stop_on_error);
                drop(permit);
            }
            Outcome::Evaluated(result) => {
                self.state.store(index, result.clone(), self.stop_on_error);
                drop(permit);
                self.hooks.run_after_sample(&self.ctx, &result);
            }
        }
    }

    async fn process(&self, index: usize, sample: Sample) -> Outcome {
        if let Err(err) = self.hooks.run_before_sample(&self.ctx, &sample) {
            log::warn!("sample {index}: before-sample hook failed: {err}");
            return Outcome::Rejected(SampleResult::failed(sample, err));
        }
        Outcome::Evaluated(self.evaluate(index, sample).await)
    }

    async fn evaluate(&self, index: usize, sample: Sample) -> SampleResult {
        let mut result = SampleResult::started(sample);
        for metric in self.metrics.iter() {
            if let Some(err) = self.ctx.err() {
                log::warn!("sample {index}: {err} before metric {}", metric.name());
                result.record_error(err);
                break;
            }
            match metric.score(&self.ctx, &result.sample).await {
                Ok(score) => {
                    check_range(metric.name(), score);
                    result.scores.insert(metric.name().to_string(), score);
                }
                Err(err) => {
                    log::warn!("sample {index}: metric {} failed: {err}", metric.name());
                    result.record_error(err);
                    if self.stop_on_error {
                        break;
                    }
                }
            }
        }
        result.finish()
    }
}

fn check_range(metric: &str, score: f64) {
    if !(0.0..=1.0).contains(&score) {
        log::warn!("metric {metric} returned {score}, outside [0, 1]");
    }
}

/// Error recorded for a worker task that ended abnormally.
pub(super) fn join_failure(err: tokio::task::JoinError) -> EvalError {
    if err.is_panic() {
        panic_error(err.into_panic())
    } else {
        EvalError::Worker(err.to_string())
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> EvalError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match message {
        Some(msg) => EvalError::Worker(format!("worker panicked: {msg}")),
        None => EvalError::Worker("worker panicked".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_is_kept() {
        let err = panic_error(Box::new("scorer bug"));
        assert_eq!(err, EvalError::Worker("worker panicked: scorer bug".into()));
        let err = panic_error(Box::new(String::from("owned")));
        assert_eq!(err, EvalError::Worker("worker panicked: owned".into()));
        let err = panic_error(Box::new(42_u8));
        assert_eq!(err, EvalError::Worker("worker panicked".into()));
    }
}
