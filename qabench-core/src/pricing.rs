//! OpenRouter pricing per million tokens, used to derive per-task cost.
//!
//! Prices are USD per million tokens, taken from <https://openrouter.ai/models>
//! (as of Jan 2025). Unknown model ids fall back to [`DEFAULT_PRICING`]
//! rather than erroring, so a new model can be benchmarked before its price
//! is added here.

use crate::backend::UsageSummary;

/// (input $/Mtok, output $/Mtok) pairs keyed by model id.
static PRICING: &[(&str, (f64, f64))] = &[
    ("openai/gpt-5.1", (1.25, 10.0)),
    ("openai/gpt-4o-mini", (0.15, 0.6)),
    ("z-ai/glm-4.7", (0.16, 0.80)),
    ("minimax/minimax-m2.1", (0.12, 0.48)),
    ("xiaomi/mimo-v2-flash", (0.10, 0.10)),
];

/// Conservative fallback for model ids missing from the table.
pub const DEFAULT_PRICING: (f64, f64) = (0.50, 2.0);

/// Look up (input, output) prices per million tokens for a model id.
pub fn pricing_for(model_id: &str) -> (f64, f64) {
    PRICING
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, prices)| *prices)
        .unwrap_or(DEFAULT_PRICING)
}

/// Cost in USD for a given token count against one model id.
pub fn calculate_cost(input_tokens: u64, output_tokens: u64, model_id: &str) -> f64 {
    let (input_price, output_price) = pricing_for(model_id);
    (input_tokens as f64 / 1_000_000.0) * input_price
        + (output_tokens as f64 / 1_000_000.0) * output_price
}

/// Total cost of a task's usage summary, summed across every model id the
/// backend touched.
pub fn cost_of_usage(usage: &UsageSummary) -> f64 {
    usage
        .models
        .iter()
        .map(|(model_id, u)| calculate_cost(u.input_tokens, u.output_tokens, model_id))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::known("openai/gpt-4o-mini", (0.15, 0.6))]
    #[case::known_flat("xiaomi/mimo-v2-flash", (0.10, 0.10))]
    #[case::unknown("mystery/model-x", DEFAULT_PRICING)]
    fn test_pricing_lookup(#[case] model_id: &str, #[case] expected: (f64, f64)) {
        assert_eq!(pricing_for(model_id), expected);
    }

    #[test]
    fn test_calculate_cost() {
        // 1M input + 1M output of gpt-4o-mini = 0.15 + 0.6
        let cost = calculate_cost(1_000_000, 1_000_000, "openai/gpt-4o-mini");
        assert!((cost - 0.75).abs() < 1e-9);

        // Unknown model uses the fallback rates
        let cost = calculate_cost(2_000_000, 500_000, "mystery/model-x");
        assert!((cost - (2.0 * 0.50 + 0.5 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cost_of_usage_sums_models() {
        let mut usage = UsageSummary::default();
        usage.record("openai/gpt-4o-mini", 1_000_000, 0);
        usage.record("openai/gpt-5.1", 0, 1_000_000);

        let cost = cost_of_usage(&usage);
        assert!((cost - (0.15 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cost_of_empty_usage() {
        assert_eq!(cost_of_usage(&UsageSummary::default()), 0.0);
    }
}
