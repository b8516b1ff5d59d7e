use std::fmt;
use std::sync::Arc;

use crate::{
    context::EvalContext,
    error::EvalError,
    report::Report,
    sample::{Sample, SampleResult},
};

pub type BeforeRunFn = dyn Fn(&EvalContext, &[Sample]) -> Result<(), EvalError> + Send + Sync;
pub type AfterRunFn = dyn Fn(&EvalContext, &Report) + Send + Sync;
pub type BeforeSampleFn = dyn Fn(&EvalContext, &Sample) -> Result<(), EvalError> + Send + Sync;
pub type AfterSampleFn = dyn Fn(&EvalContext, &SampleResult) + Send + Sync;

/// Optional callbacks around a run and around each sample.
///
/// An empty slot is a no-op. Only the before-hooks can fail: a before-run
/// failure aborts the run, a before-sample failure is recorded on that
/// sample and skips its metrics and its after-sample hook.
#[derive(Clone, Default)]
pub struct Hooks {
    before_run: Option<Arc<BeforeRunFn>>,
    after_run: Option<Arc<AfterRunFn>>,
    before_sample: Option<Arc<BeforeSampleFn>>,
    after_sample: Option<Arc<AfterSampleFn>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalContext, &[Sample]) -> Result<(), EvalError> + Send + Sync + 'static,
    {
        self.before_run = Some(Arc::new(f));
        self
    }

    pub fn after_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalContext, &Report) + Send + Sync + 'static,
    {
        self.after_run = Some(Arc::new(f));
        self
    }

    pub fn before_sample<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalContext, &Sample) -> Result<(), EvalError> + Send + Sync + 'static,
    {
        self.before_sample = Some(Arc::new(f));
        self
    }

    pub fn after_sample<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalContext, &SampleResult) + Send + Sync + 'static,
    {
        self.after_sample = Some(Arc::new(f));
        self
    }

    /// Combines two hook sets slot by slot.
    ///
    /// `self` runs first. Fallible hooks stop at the first error, so the
    /// second callback never sees a run or sample the first one rejected.
    pub fn merge(self, other: Hooks) -> Hooks {
        Hooks {
            before_run: merge_slot(self.before_run, other.before_run, chain_before_run),
            after_run: merge_slot(self.after_run, other.after_run, chain_after_run),
            before_sample: merge_slot(self.before_sample, other.before_sample, chain_before_sample),
            after_sample: merge_slot(self.after_sample, other.after_sample, chain_after_sample),
        }
    }

    pub(crate) fn run_before_run(
        &self,
        ctx: &EvalContext,
        samples: &[Sample],
    ) -> Result<(), EvalError> {
        match &self.before_run {
            Some(hook) => hook(ctx, samples),
            None => Ok(()),
        }
    }

    pub(crate) fn run_after_run(&self, ctx: &EvalContext, report: &Report) {
        if let Some(hook) = &self.after_run {
            hook(ctx, report);
        }
    }

    pub(crate) fn run_before_sample(
        &self,
        ctx: &EvalContext,
        sample: &Sample,
    ) -> Result<(), EvalError> {
        match &self.before_sample {
            Some(hook) => hook(ctx, sample),
            None => Ok(()),
        }
    }

    pub(crate) fn run_after_sample(&self, ctx: &EvalContext, result: &SampleResult) {
        if let Some(hook) = &self.after_sample {
            hook(ctx, result);
        }
    }
}

fn merge_slot<T: ?Sized>(
    first: Option<Arc<T>>,
    second: Option<Arc<T>>,
    chain: fn(Arc<T>, Arc<T>) -> Arc<T>,
) -> Option<Arc<T>> {
    match (first, second) {
        (Some(a), Some(b)) => Some(chain(a, b)),
        (a, b) => a.or(b),
    }
}

fn chain_before_run(a: Arc<BeforeRunFn>, b: Arc<BeforeRunFn>) -> Arc<BeforeRunFn> {
    Arc::new(move |ctx: &EvalContext, samples: &[Sample]| {
        a(ctx, samples)?;
        b(ctx, samples)
    })
}

fn chain_after_run(a: Arc<AfterRunFn>, b: Arc<AfterRunFn>) -> Arc<AfterRunFn> {
    Arc::new(move |ctx: &EvalContext, report: &Report| {
        a(ctx, report);
        b(ctx, report);
    })
}

fn chain_before_sample(a: Arc<BeforeSampleFn>, b: Arc<BeforeSampleFn>) -> Arc<BeforeSampleFn> {
    Arc::new(move |ctx: &EvalContext, sample: &Sample| {
        a(ctx, sample)?;
        b(ctx, sample)
    })
}

fn chain_after_sample(a: Arc<AfterSampleFn>, b: Arc<AfterSampleFn>) -> Arc<AfterSampleFn> {
    Arc::new(move |ctx: &EvalContext, result: &SampleResult| {
        a(ctx, result);
        b(ctx, result);
    })
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_run", &self.before_run.is_some())
            .field("after_run", &self.after_run.is_some())
            .field("before_sample", &self.before_sample.is_some())
            .field("after_sample", &self.after_sample.is_some())
            .finish()
    }
}
