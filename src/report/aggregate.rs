use std::collections::BTreeMap;
use std::time::Duration;

use crate::{error::EvalError, sample::SampleResult};

use super::Report;

/// Builds a report from the finished result slots.
///
/// Averages only cover results that carry a score for the metric, so a
/// metric that never succeeded has no entry at all.
pub(crate) fn aggregate(
    samples: Vec<SampleResult>,
    duration: Duration,
    stop_reason: Option<EvalError>,
) -> Report {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut errors = Vec::new();

    for result in &samples {
        if let Some(err) = &result.error {
            errors.push(err.clone());
        }
        for (name, score) in &result.scores {
            let entry = totals.entry(name.clone()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }

    let metrics = totals
        .into_iter()
        .map(|(name, (sum, count))| (name, sum / count as f64))
        .collect();

    Report {
        samples,
        metrics,
        duration,
        errors,
        stop_reason,
    }
}
