#[path = "report/aggregate.rs"]
mod aggregate;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::{
    error::EvalError,
    sample::{SampleResult, SampleStatus},
};

pub(crate) use aggregate::aggregate;

/// Aggregated outcome of a run.
///
/// A report returned without error may still describe a degraded run:
/// inspect [`Report::errors`] or [`Report::is_clean`] before trusting the
/// averages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// One result per dataset position, in dataset order
    pub samples: Vec<SampleResult>,
    /// Mean score per metric over the samples that produced that metric
    pub metrics: BTreeMap<String, f64>,
    /// Wall-clock duration of the whole run
    #[serde(rename = "duration_ms", serialize_with = "duration_millis")]
    pub duration: Duration,
    /// Every sample error, in dataset order
    pub errors: Vec<EvalError>,
    /// First error that stopped dispatching, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<EvalError>,
}

impl Report {
    /// Mean score of `name`, if any sample produced it.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// True when every position was scheduled and none failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.stop_reason.is_none() && self.skipped() == 0
    }

    /// Positions the dispatcher never reached.
    pub fn skipped(&self) -> usize {
        self.count(SampleStatus::NotScheduled)
    }

    pub fn failed(&self) -> usize {
        self.count(SampleStatus::Failed)
    }

    pub fn to_json_pretty(&self) -> Result<String, EvalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn count(&self, status: SampleStatus) -> usize {
        self.samples.iter().filter(|r| r.status == status).count()
    }
}

fn duration_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} samples in {:?} ({} failed, {} skipped)",
            self.samples.len(),
            self.duration,
            self.failed(),
            self.skipped()
        )?;
        for (name, score) in &self.metrics {
            writeln!(f, "  {name}: {score:.4}")?;
        }
        if let Some(reason) = &self.stop_reason {
            writeln!(f, "  stopped: {reason}")?;
        }
        Ok(())
    }
}
