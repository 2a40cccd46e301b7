//! Static fallback tables — reference data used when neither the API nor the
//! rendered page yields a field.

/// Known per-provider stats for one model id.
#[derive(Debug, Clone)]
pub struct ProviderStats {
    pub model_id: &'static str,
    pub provider: &'static str,
    pub context: &'static str,
    pub max_output: &'static str,
    pub input_price: &'static str,
    pub output_price: &'static str,
}

pub const PROVIDER_STATS: &[ProviderStats] = &[
    ProviderStats { model_id: "deepseek/deepseek-chat",    provider: "deepseek",      context: "32K tokens",  max_output: "4K tokens", input_price: "$0.0005/1K tokens", output_price: "$0.0005/1K tokens" },
    ProviderStats { model_id: "deepseek/deepseek-chat",    provider: "fireworks",     context: "32K tokens",  max_output: "4K tokens", input_price: "$0.0006/1K tokens", output_price: "$0.0006/1K tokens" },
    ProviderStats { model_id: "deepseek/deepseek-chat",    provider: "together",      context: "32K tokens",  max_output: "4K tokens", input_price: "$0.0007/1K tokens", output_price: "$0.0007/1K tokens" },
    ProviderStats { model_id: "anthropic/claude-2-1",      provider: "anthropic",     context: "100K tokens", max_output: "4K tokens", input_price: "$0.008/1K tokens",  output_price: "$0.024/1K tokens" },
    ProviderStats { model_id: "anthropic/claude-instant",  provider: "anthropic",     context: "100K tokens", max_output: "4K tokens", input_price: "$0.0008/1K tokens", output_price: "$0.0024/1K tokens" },
    ProviderStats { model_id: "mistralai/mixtral-8x7b",    provider: "mistral ai",    context: "32K tokens",  max_output: "4K tokens", input_price: "$0.0004/1K tokens", output_price: "$0.0004/1K tokens" },
    ProviderStats { model_id: "mistralai/mistral-medium",  provider: "mistral ai",    context: "32K tokens",  max_output: "4K tokens", input_price: "$0.0002/1K tokens", output_price: "$0.0002/1K tokens" },
    ProviderStats { model_id: "openai/gpt-4-turbo",        provider: "openai",        context: "128K tokens", max_output: "4K tokens", input_price: "$0.01/1K tokens",   output_price: "$0.03/1K tokens" },
    ProviderStats { model_id: "openai/gpt-3-5-turbo",      provider: "openai",        context: "16K tokens",  max_output: "4K tokens", input_price: "$0.001/1K tokens",  output_price: "$0.002/1K tokens" },
    ProviderStats { model_id: "qwen/qwen-72b",             provider: "alibaba cloud", context: "32K tokens",  max_output: "4K tokens", input_price: "$0.0006/1K tokens", output_price: "$0.0006/1K tokens" },
];

/// Known per-model descriptions for when the API has none.
pub const DESCRIPTIONS: &[(&str, &str)] = &[
    ("deepseek/deepseek-chat",   "Advanced language model from DeepSeek with strong performance across various tasks."),
    ("anthropic/claude-2-1",     "Latest version of Claude with enhanced reasoning and analysis capabilities."),
    ("anthropic/claude-instant", "Faster version of Claude optimized for quick responses."),
    ("mistralai/mixtral-8x7b",   "Powerful mixture-of-experts model offering strong performance at an efficient price point."),
    ("mistralai/mistral-medium", "Balanced model offering good performance and efficiency."),
    ("openai/gpt-4-turbo",       "Latest version of GPT-4 with improved capabilities and larger context window."),
    ("openai/gpt-3-5-turbo",     "Fast and cost-effective model suitable for most language tasks."),
    ("qwen/qwen-72b",            "Large language model from Alibaba Cloud with strong multilingual capabilities."),
];

/// Display-name overrides for slugs that title-casing mangles.
pub const NAME_OVERRIDES: &[(&str, &str)] = &[
    ("gpt-4-turbo",    "GPT-4 Turbo"),
    ("gpt-3-5-turbo",  "GPT-3.5 Turbo"),
    ("claude-2-1",     "Claude 2.1"),
    ("deepseek-chat",  "DeepSeek Chat"),
    ("mixtral-8x7b",   "Mixtral 8x7B"),
    ("qwen-72b",       "Qwen 72B"),
];

/// Model ids processed even when the API listing omits them.
pub const EXTRA_MODEL_IDS: &[&str] = &[
    "deepseek/deepseek-chat",
    "anthropic/claude-2-1",
    "mistralai/mixtral-8x7b",
    "openai/gpt-4-turbo",
    "openai/gpt-3-5-turbo",
    "anthropic/claude-instant",
    "mistralai/mistral-medium",
    "qwen/qwen-72b",
];

// Generic defaults for a model nothing is known about.
pub const DEFAULT_CONTEXT: &str = "32K tokens";
pub const DEFAULT_MAX_OUTPUT: &str = "4K tokens";
pub const DEFAULT_PRICE: &str = "$0.0005/1K tokens";

/// All known stats rows for a model id, in table order.
pub fn lookup_stats(model_id: &str) -> impl Iterator<Item = &'static ProviderStats> + use<'_> {
    PROVIDER_STATS.iter().filter(move |s| s.model_id == model_id)
}

/// Stats for one (model, provider) pair.
pub fn lookup_provider_stats(model_id: &str, provider: &str) -> Option<&'static ProviderStats> {
    PROVIDER_STATS
        .iter()
        .find(|s| s.model_id == model_id && s.provider.eq_ignore_ascii_case(provider))
}

pub fn lookup_description(model_id: &str) -> Option<&'static str> {
    DESCRIPTIONS
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, d)| *d)
}

pub fn lookup_name(slug: &str) -> Option<&'static str> {
    NAME_OVERRIDES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, n)| *n)
}
