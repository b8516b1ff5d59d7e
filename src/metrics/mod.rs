//! Built-in metrics.
//!
//! Heuristic metrics read the sample and its metadata directly; the
//! hallucination metric asks a judge model through [`crate::chat::ChatProvider`].

mod cost;
mod exact_match;
mod hallucination;
mod latency;
mod toxicity;

pub use cost::Cost;
pub use exact_match::ExactMatch;
pub use hallucination::Hallucination;
pub use latency::Latency;
pub use toxicity::Toxicity;
