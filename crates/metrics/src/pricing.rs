//! Per-model pricing and cost estimation.

use helpdesk_core::provider::Usage;

/// USD per million tokens, split by direction.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub const GPT_4O_MINI: ModelPricing = ModelPricing {
        input_per_million: 0.150,
        output_per_million: 0.600,
    };

    /// Pricing for a model name, defaulting to gpt-4o-mini rates for
    /// unknown models so cost stays an estimate rather than zero.
    pub fn for_model(model: &str) -> Self {
        match model {
            m if m.starts_with("gpt-4o-mini") => Self::GPT_4O_MINI,
            m if m.starts_with("gpt-4o") => ModelPricing {
                input_per_million: 2.50,
                output_per_million: 10.00,
            },
            m if m.starts_with("gpt-4.1-mini") => ModelPricing {
                input_per_million: 0.40,
                output_per_million: 1.60,
            },
            _ => Self::GPT_4O_MINI,
        }
    }

    /// Estimated cost in USD for the given usage.
    ///
    /// When the provider reports only a total (no prompt/completion
    /// split), tokens are priced at the midpoint of the two rates.
    pub fn cost(&self, usage: &Usage) -> f64 {
        if usage.prompt_tokens > 0 || usage.completion_tokens > 0 {
            f64::from(usage.prompt_tokens) / 1_000_000.0 * self.input_per_million
                + f64::from(usage.completion_tokens) / 1_000_000.0 * self.output_per_million
        } else {
            let blended = (self.input_per_million + self.output_per_million) / 2.0;
            f64::from(usage.total_tokens) / 1_000_000.0 * blended
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_usage_prices_each_direction() {
        let usage = Usage {
            prompt_tokens: 1_000_000,
            completion_tokens: 1_000_000,
            total_tokens: 2_000_000,
        };
        let cost = ModelPricing::GPT_4O_MINI.cost(&usage);
        assert!((cost - 0.750).abs() < 1e-9);
    }

    #[test]
    fn total_only_usage_uses_blended_rate() {
        let usage = Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 1_000_000,
        };
        let cost = ModelPricing::GPT_4O_MINI.cost(&usage);
        // (0.150 + 0.600) / 2 = 0.375 per million
        assert!((cost - 0.375).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_gets_default_pricing() {
        let pricing = ModelPricing::for_model("some-local-model");
        assert!((pricing.input_per_million - 0.150).abs() < 1e-9);
    }

    #[test]
    fn model_prefix_matching() {
        let mini = ModelPricing::for_model("gpt-4o-mini-2024-07-18");
        assert!((mini.input_per_million - 0.150).abs() < 1e-9);
        let full = ModelPricing::for_model("gpt-4o-2024-08-06");
        assert!((full.input_per_million - 2.50).abs() < 1e-9);
    }
}
