use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{error::EvalError, sample::SampleResult};

/// Mutable state shared by the dispatcher and its workers.
///
/// The lock is only held for slot writes and flag checks, never across a
/// hook or metric call.
pub(super) struct SharedState {
    inner: Mutex<Inner>,
}

struct Inner {
    results: Vec<SampleResult>,
    stopped: bool,
    stop_reason: Option<EvalError>,
}

impl SharedState {
    /// Pre-sizes one empty slot per dataset position.
    pub(super) fn new(len: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                results: vec![SampleResult::default(); len],
                stopped: false,
                stop_reason: None,
            }),
        }
    }

    pub(super) fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Marks the run stopped, keeping the first reason recorded.
    pub(super) fn stop(&self, reason: EvalError) {
        let mut inner = self.lock();
        inner.stopped = true;
        inner.stop_reason.get_or_insert(reason);
    }

    /// Writes a finished result into its slot.
    ///
    /// With `escalate`, a failed result also stops the run.
    pub(super) fn store(&self, index: usize, result: SampleResult, escalate: bool) {
        let mut inner = self.lock();
        if escalate {
            if let Some(err) = &result.error {
                inner.stopped = true;
                if inner.stop_reason.is_none() {
                    inner.stop_reason = Some(err.clone());
                }
            }
        }
        if let Some(slot) = inner.results.get_mut(index) {
            *slot = result;
        }
    }

    /// Fills a slot whose worker never wrote it.
    pub(super) fn store_if_empty(&self, index: usize, result: SampleResult) {
        let mut inner = self.lock();
        if let Some(slot) = inner.results.get_mut(index) {
            if !slot.was_scheduled() {
                *slot = result;
            }
        }
    }

    /// Takes the results and the stop reason once every worker has finished.
    pub(super) fn take(&self) -> (Vec<SampleResult>, Option<EvalError>) {
        let mut inner = self.lock();
        (
            std::mem::take(&mut inner.results),
            inner.stop_reason.take(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
