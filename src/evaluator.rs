#[path = "evaluator/config.rs"]
mod config;

#[path = "evaluator/state.rs"]
mod state;

#[path = "evaluator/worker.rs"]
mod worker;

#[path = "evaluator/runner.rs"]
mod runner;


pub use config::RunnerConfig;
pub use runner::{Runner, RunnerBuilder};
