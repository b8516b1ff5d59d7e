use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::{sync::Semaphore, time::Instant};

use crate::{
    context::EvalContext,
    error::EvalError,
    hooks::Hooks,
    metric::Metric,
    report::{aggregate, Report},
    sample::{Sample, SampleResult},
};

use super::config::{timeout_millis, RunnerConfig};
use super::state::SharedState;
use super::worker::{join_failure, Worker};

/// Scores a dataset against a set of metrics with bounded concurrency.
///
/// Results keep dataset order whatever order workers finish in. Per-sample
/// failures are collected into the [`Report`]; only a failing before-run
/// hook makes [`Runner::run`] return an error.
pub struct Runner {
    metrics: Arc<[Arc<dyn Metric>]>,
    dataset: Arc<[Sample]>,
    config: RunnerConfig,
    hooks: Hooks,
}

impl Runner {
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::default()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &[Sample] {
        &self.dataset
    }

    /// Runs every sample through every metric.
    pub async fn run(&self, ctx: &EvalContext) -> Result<Report, EvalError> {
        let start = Instant::now();
        let (ctx, _deadline_guard) = match self.config.timeout() {
            Some(timeout) => {
                let (child, guard) = ctx.with_timeout(timeout);
                (child, Some(guard))
            }
            None => (ctx.clone(), None),
        };

        self.hooks.run_before_run(&ctx, &self.dataset)?;

        log::info!(
            "evaluating {} samples with {} metrics (parallel={})",
            self.dataset.len(),
            self.metrics.len(),
            self.config.parallel
        );

        let state = Arc::new(SharedState::new(self.dataset.len()));
        let semaphore = Arc::new(Semaphore::new(self.config.parallel));
        let mut handles = Vec::with_capacity(self.dataset.len());

        for (index, sample) in self.dataset.iter().enumerate() {
            if !self.may_dispatch(index, &ctx, &state) {
                break;
            }
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            // Re-check once the slot is ours: a worker may have stopped the
            // run while we were waiting.
            if !self.may_dispatch(index, &ctx, &state) {
                break;
            }

            log::debug!("dispatching sample {index}");
            let worker = Worker {
                ctx: ctx.clone(),
                metrics: Arc::clone(&self.metrics),
                hooks: self.hooks.clone(),
                state: Arc::clone(&state),
                stop_on_error: self.config.stop_on_error,
            };
            let handle = tokio::spawn(worker.run(index, sample.clone(), permit));
            handles.push((index, handle));
        }

        let (indices, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for (index, joined) in indices.into_iter().zip(join_all(handles).await) {
            if let Err(err) = joined {
                log::error!("sample {index}: worker task failed: {err}");
                let sample = self.dataset[index].clone();
                state.store_if_empty(index, SampleResult::failed(sample, join_failure(err)));
            }
        }

        let (results, stop_reason) = state.take();
        let report = aggregate(results, start.elapsed(), stop_reason);
        log::info!(
            "evaluation finished in {:?}: {} errors",
            report.duration,
            report.errors.len()
        );

        self.hooks.run_after_run(&ctx, &report);
        Ok(report)
    }

    fn may_dispatch(&self, index: usize, ctx: &EvalContext, state: &SharedState) -> bool {
        if state.is_stopped() {
            log::debug!("run stopped, not dispatching sample {index}");
            return false;
        }
        if let Some(err) = ctx.err() {
            log::debug!("{err}, not dispatching sample {index}");
            state.stop(err);
            return false;
        }
        true
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.metrics.iter().map(|m| m.name()).collect();
        f.debug_struct("Runner")
            .field("metrics", &names)
            .field("samples", &self.dataset.len())
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`Runner`].
#[derive(Default)]
pub struct RunnerBuilder {
    metrics: Vec<Arc<dyn Metric>>,
    dataset: Vec<Sample>,
    config: RunnerConfig,
    hooks: Hooks,
}

impl RunnerBuilder {
    /// Adds a metric.
    pub fn metric(mut self, metric: impl Metric + 'static) -> Self {
        self.metrics.push(Arc::new(metric));
        self
    }

    /// Adds several shared metrics at once.
    pub fn metrics(mut self, metrics: impl IntoIterator<Item = Arc<dyn Metric>>) -> Self {
        self.metrics.extend(metrics);
        self
    }

    /// Sets the samples to evaluate.
    pub fn dataset(mut self, samples: impl Into<Vec<Sample>>) -> Self {
        self.dataset = samples.into();
        self
    }

    /// Sets the concurrency bound. Zero is ignored.
    pub fn parallel(mut self, parallel: usize) -> Self {
        if parallel > 0 {
            self.config.parallel = parallel;
        }
        self
    }

    /// Sets the run deadline. A zero duration disables it; anything else
    /// is rounded up to whole milliseconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout_millis(timeout);
        self
    }

    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.config.stop_on_error = stop;
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces all scheduling settings at once. A zero parallelism bound
    /// keeps the current one.
    pub fn config(mut self, config: RunnerConfig) -> Self {
        let parallel = self.config.parallel;
        self.config = config;
        if self.config.parallel == 0 {
            log::warn!("parallel must be at least 1, keeping {parallel}");
            self.config.parallel = parallel;
        }
        self
    }

    pub fn build(self) -> Runner {
        Runner {
            metrics: self.metrics.into(),
            dataset: self.dataset.into(),
            config: self.config,
            hooks: self.hooks,
        }
    }
}
