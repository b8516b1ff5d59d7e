use async_trait::async_trait;

use crate::{context::EvalContext, error::EvalError, metric::Metric, sample::Sample};

const NAME: &str = "cost";
const INPUT_TOKENS: &str = "input_tokens";
const OUTPUT_TOKENS: &str = "output_tokens";

/// Scores the token cost of a sample against a per-sample budget.
///
/// Token counts come from the `input_tokens` and `output_tokens` metadata
/// entries; a missing count is treated as zero.
#[derive(Debug, Clone)]
pub struct Cost {
    input_price_per_1k: f64,
    output_price_per_1k: f64,
    budget: f64,
}

impl Cost {
    pub fn new(input_price_per_1k: f64, output_price_per_1k: f64, budget: f64) -> Self {
        Self {
            input_price_per_1k,
            output_price_per_1k,
            budget,
        }
    }

    /// Price of a sample in the same unit as the budget.
    pub fn price(&self, sample: &Sample) -> Result<f64, EvalError> {
        let tokens = |key: &str| {
            sample
                .numeric_meta(key)
                .map(|count| count.unwrap_or(0.0))
                .map_err(|msg| EvalError::metric(NAME, msg))
        };
        let input = tokens(INPUT_TOKENS)?;
        let output = tokens(OUTPUT_TOKENS)?;
        Ok(input / 1000.0 * self.input_price_per_1k + output / 1000.0 * self.output_price_per_1k)
    }
}

#[async_trait]
impl Metric for Cost {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, _ctx: &EvalContext, sample: &Sample) -> Result<f64, EvalError> {
        let price = self.price(sample)?;
        if self.budget <= 0.0 {
            return Ok(if price <= 0.0 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - (price / self.budget).clamp(0.0, 1.0))
    }
}
