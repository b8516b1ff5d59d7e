//! Concurrent evaluation engine for LLM outputs.
//!
//! A [`Runner`] scores every [`Sample`] of a dataset against a set of
//! [`Metric`]s, with a bounded number of samples in flight, an optional
//! deadline and optional stop-on-first-error. The result is a [`Report`]
//! holding per-sample results in dataset order, per-metric averages and
//! every error encountered.
//!
//! ```no_run
//! use std::time::Duration;
//! use llm_eval::{metrics::ExactMatch, EvalContext, Runner, Sample};
//!
//! # async fn demo() -> Result<(), llm_eval::EvalError> {
//! let runner = Runner::builder()
//!     .metric(ExactMatch::new())
//!     .dataset(vec![Sample::new("2 + 2?", "4").expected("4")])
//!     .parallel(4)
//!     .timeout(Duration::from_secs(30))
//!     .build();
//! let report = runner.run(&EvalContext::new()).await?;
//! if !report.errors.is_empty() {
//!     eprintln!("{report}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod context;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod hooks;
#[cfg(feature = "logging")]
pub mod logging;
pub mod metric;
pub mod metrics;
pub mod report;
pub mod sample;

pub use context::EvalContext;
pub use dataset::Dataset;
pub use error::EvalError;
pub use evaluator::{Runner, RunnerBuilder, RunnerConfig};
pub use hooks::Hooks;
pub use metric::{metric_fn, FnMetric, Metric, ScoringFn};
pub use report::Report;
pub use sample::{Document, Sample, SampleResult, SampleStatus};
