//! Pure payload-to-record conversion.
//!
//! Field precedence is deterministic: API field, then scraped page field,
//! then the static per-model table, then the generic template default. Each
//! price/token field is defaulted independently; partial data never blocks
//! record creation.

pub mod defaults;
pub mod rules;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::fetch::{ApiModel, ScrapedAppRow, ScrapedProvider, ScrapedRankingRow};
use crate::types::{
    AppRecord, ModelRecord, ProviderDetail, RankingCategory, RankingRecord, NOT_AVAILABLE,
};
use crate::util::clean_text;
use rules::PageDetail;

static RE_TOKEN_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9][0-9,]*(?:\.[0-9]+)?)\s*([kmb])?$").unwrap());

// ---------------------------------------------------------------------------
// Identifier helpers
// ---------------------------------------------------------------------------

/// Final path segment of a fully qualified model id.
pub fn slug_of(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

/// First path segment of a fully qualified model id.
pub fn provider_of(model_id: &str) -> &str {
    model_id.split('/').next().unwrap_or(model_id)
}

pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-readable name for a model id: title-cased slug, with a static
/// override table for the names title-casing mangles.
pub fn display_name(model_id: &str) -> String {
    let slug = slug_of(model_id);
    if let Some(name) = defaults::lookup_name(slug) {
        return name.to_string();
    }
    title_case(&slug.replace(['-', '_'], " "))
}

// ---------------------------------------------------------------------------
// Numeric parsing and display formatting
// ---------------------------------------------------------------------------

/// Parse a token-count display string: `"41.3b tokens"` is 41.3e9,
/// `"2.5k"` is 2500. Unparseable input is None.
pub fn parse_token_count(raw: &str) -> Option<f64> {
    let s = raw.trim().to_lowercase();
    let s = s.strip_suffix("tokens").unwrap_or(&s).trim();
    let caps = RE_TOKEN_COUNT.captures(s)?;
    let number: f64 = caps[1].replace(',', "").parse().ok()?;
    let scale = match caps.get(2).map(|m| m.as_str()) {
        Some("k") => 1e3,
        Some("m") => 1e6,
        Some("b") => 1e9,
        _ => 1.0,
    };
    Some(number * scale)
}

/// Token count for display, truncated to the nearest thousand.
pub fn format_token_display(count: u64) -> String {
    format!("{}K tokens", count / 1000)
}

fn format_price(value: f64) -> String {
    format!("${value}/1K tokens")
}

/// Price display for an API pricing value, taken as a per-1K amount.
/// Numeric values (and numeric strings) format as `"$<amount>/1K tokens"`;
/// any other string passes through unchanged rather than raising; nulls and
/// non-string oddities yield None so the fallback chain continues.
pub fn price_display(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(format_price),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else if let Ok(v) = t.trim_start_matches('$').parse::<f64>() {
                Some(format_price(v))
            } else {
                Some(t.to_string())
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

/// Build the canonical record for one model from whatever the fetchers
/// recovered. Works with no inputs at all: every field then comes from the
/// static tables or the generic defaults.
pub fn build_model_record(
    site_base: &str,
    model_id: &str,
    api: Option<&ApiModel>,
    page: &[ScrapedProvider],
) -> ModelRecord {
    let slug = slug_of(model_id).to_string();
    let url = format!("{}/{}", site_base.trim_end_matches('/'), model_id);

    // Provider universe: page sections, else the static table, else the
    // id's own prefix.
    let mut providers: Vec<String> = Vec::new();
    for section in page {
        if !providers.contains(&section.provider) {
            providers.push(section.provider.clone());
        }
    }
    if providers.is_empty() {
        for stats in defaults::lookup_stats(model_id) {
            if !providers.contains(&stats.provider.to_string()) {
                providers.push(stats.provider.to_string());
            }
        }
    }
    if providers.is_empty() {
        providers.push(provider_of(model_id).to_string());
    }

    let mut page_details: HashMap<&str, PageDetail> = HashMap::new();
    for section in page {
        page_details
            .entry(section.provider.as_str())
            .or_insert_with(|| PageDetail::from_cells(&section.cells));
    }

    // Model-level API fields apply to every provider row.
    let api_context = api
        .and_then(|a| {
            a.context_length
                .or_else(|| a.top_provider.as_ref().and_then(|t| t.context_length))
        })
        .map(format_token_display);
    let api_max_output = api
        .and_then(|a| a.top_provider.as_ref())
        .and_then(|t| t.max_completion_tokens)
        .map(format_token_display);
    let api_input = api
        .and_then(|a| a.pricing.as_ref())
        .and_then(|p| p.prompt.as_ref())
        .and_then(price_display);
    let api_output = api
        .and_then(|a| a.pricing.as_ref())
        .and_then(|p| p.completion.as_ref())
        .and_then(price_display);

    let mut provider_details = BTreeMap::new();
    for provider in &providers {
        let page_detail = page_details.get(provider.as_str()).cloned().unwrap_or_default();
        let table = defaults::lookup_provider_stats(model_id, provider);
        let detail = ProviderDetail {
            context: api_context
                .clone()
                .or(page_detail.context)
                .or_else(|| table.map(|t| t.context.to_string()))
                .unwrap_or_else(|| defaults::DEFAULT_CONTEXT.to_string()),
            max_output: api_max_output
                .clone()
                .or(page_detail.max_output)
                .or_else(|| table.map(|t| t.max_output.to_string()))
                .unwrap_or_else(|| defaults::DEFAULT_MAX_OUTPUT.to_string()),
            input_price: api_input
                .clone()
                .or(page_detail.input_price)
                .or_else(|| table.map(|t| t.input_price.to_string()))
                .unwrap_or_else(|| defaults::DEFAULT_PRICE.to_string()),
            output_price: api_output
                .clone()
                .or(page_detail.output_price)
                .or_else(|| table.map(|t| t.output_price.to_string()))
                .unwrap_or_else(|| defaults::DEFAULT_PRICE.to_string()),
            latency: page_detail
                .latency
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            throughput: page_detail
                .throughput
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            url: url.clone(),
        };
        provider_details.insert(provider.clone(), detail);
    }

    let description = api
        .and_then(|a| a.description.as_deref())
        .map(clean_text)
        .filter(|d| !d.is_empty())
        .or_else(|| defaults::lookup_description(model_id).map(str::to_string))
        .unwrap_or_else(|| generic_description(&title_case(&providers[0])));

    ModelRecord {
        name: display_name(model_id),
        slug,
        model_id: model_id.to_string(),
        providers,
        provider_details,
        description,
    }
}

/// The template used when nothing describes a model.
pub fn generic_description(provider_display: &str) -> String {
    format!("Advanced language model from {provider_display} with strong performance across a wide range of tasks.")
}

/// Turn scraped leaderboard rows into ranking records. A row with an
/// unparseable rank falls back to its 1-based index; a link that does not
/// resolve to a provider/model pair leaves the slug empty.
pub fn build_ranking_records(
    category: RankingCategory,
    rows: &[ScrapedRankingRow],
) -> Vec<RankingRecord> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| !row.model_name.is_empty())
        .map(|(idx, row)| RankingRecord {
            category,
            rank: row.rank.unwrap_or(idx as u32 + 1),
            model_name: row.model_name.clone(),
            model_slug: row.href.as_deref().and_then(slug_from_href),
            score: row.score_raw.as_deref().and_then(parse_score),
        })
        .collect()
}

/// Resolve a page link to a model slug; only `provider/model` shaped paths
/// count.
fn slug_from_href(href: &str) -> Option<String> {
    let path = href
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(href);
    let segments: Vec<&str> = path
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    match segments.as_slice() {
        [_provider, model] => Some((*model).to_string()),
        _ => None,
    }
}

fn parse_score(raw: &str) -> Option<f64> {
    parse_token_count(raw)
        .or_else(|| raw.trim().trim_end_matches('%').trim().parse().ok())
}

pub fn build_app_record(row: &ScrapedAppRow) -> AppRecord {
    AppRecord {
        app_name: row.name.clone(),
        app_url: row.url.clone(),
        token_count_raw: row.tokens_raw.clone(),
        token_count: parse_token_count(&row.tokens_raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{ApiPricing, ApiTopProvider};
    use serde_json::json;

    #[test]
    fn test_slug_and_provider() {
        assert_eq!(slug_of("acme/foo-bar"), "foo-bar");
        assert_eq!(provider_of("acme/foo-bar"), "acme");
        assert_eq!(slug_of("bare"), "bare");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("acme/foo-bar"), "Foo Bar");
        assert_eq!(display_name("openai/gpt-4-turbo"), "GPT-4 Turbo");
        assert_eq!(display_name("anthropic/claude-2-1"), "Claude 2.1");
    }

    #[test]
    fn test_parse_token_count() {
        assert_eq!(parse_token_count("41.3b tokens"), Some(41_300_000_000.0));
        assert_eq!(parse_token_count("2.5k"), Some(2500.0));
        assert_eq!(parse_token_count("12M Tokens"), Some(12_000_000.0));
        assert_eq!(parse_token_count("1,234 tokens"), Some(1234.0));
        assert_eq!(parse_token_count("900"), Some(900.0));
        assert_eq!(parse_token_count("lots"), None);
        assert_eq!(parse_token_count(""), None);
    }

    #[test]
    fn test_format_token_display() {
        assert_eq!(format_token_display(128_000), "128K tokens");
        assert_eq!(format_token_display(32_768), "32K tokens");
        assert_eq!(format_token_display(500), "0K tokens");
    }

    #[test]
    fn test_price_display() {
        assert_eq!(
            price_display(&json!(0.0025)).as_deref(),
            Some("$0.0025/1K tokens")
        );
        assert_eq!(
            price_display(&json!("0.0025")).as_deref(),
            Some("$0.0025/1K tokens")
        );
        // Non-numeric strings pass through unchanged.
        assert_eq!(
            price_display(&json!("contact sales")).as_deref(),
            Some("contact sales")
        );
        assert_eq!(price_display(&json!(null)), None);
        assert_eq!(price_display(&json!("")), None);
    }

    #[test]
    fn test_build_record_all_defaults() {
        // No API match, no scrapeable page data: everything is synthesized.
        let record = build_model_record("https://openrouter.ai", "acme/foo-bar", None, &[]);
        assert_eq!(record.name, "Foo Bar");
        assert_eq!(record.slug, "foo-bar");
        assert_eq!(record.providers, vec!["acme"]);
        let detail = &record.provider_details["acme"];
        assert_eq!(detail.context, defaults::DEFAULT_CONTEXT);
        assert_eq!(detail.max_output, defaults::DEFAULT_MAX_OUTPUT);
        assert_eq!(detail.input_price, defaults::DEFAULT_PRICE);
        assert_eq!(detail.output_price, defaults::DEFAULT_PRICE);
        assert_eq!(detail.latency, NOT_AVAILABLE);
        assert_eq!(detail.throughput, NOT_AVAILABLE);
        assert_eq!(detail.url, "https://openrouter.ai/acme/foo-bar");
        assert_eq!(record.description, generic_description("Acme"));
        assert!(record.is_consistent());
    }

    #[test]
    fn test_build_record_from_static_table() {
        let record =
            build_model_record("https://openrouter.ai", "deepseek/deepseek-chat", None, &[]);
        assert_eq!(record.name, "DeepSeek Chat");
        assert_eq!(record.providers, vec!["deepseek", "fireworks", "together"]);
        assert_eq!(
            record.provider_details["fireworks"].input_price,
            "$0.0006/1K tokens"
        );
        assert!(record.description.contains("DeepSeek"));
        assert!(record.is_consistent());
    }

    #[test]
    fn test_build_record_api_over_page() {
        let api = ApiModel {
            id: "acme/foo-bar".into(),
            description: Some("  An API description.  ".into()),
            context_length: Some(128_000),
            pricing: Some(ApiPricing {
                prompt: Some(json!("0.01")),
                completion: Some(json!(0.03)),
            }),
            top_provider: Some(ApiTopProvider {
                context_length: None,
                max_completion_tokens: Some(4096),
            }),
        };
        let page = vec![ScrapedProvider {
            provider: "acme".into(),
            cells: vec![
                ("Context".into(), "8K tokens".into()),
                ("Latency".into(), "0.41s".into()),
            ],
        }];
        let record = build_model_record("https://openrouter.ai", "acme/foo-bar", Some(&api), &page);
        let detail = &record.provider_details["acme"];
        // API wins over the page for fields it has.
        assert_eq!(detail.context, "128K tokens");
        assert_eq!(detail.max_output, "4K tokens");
        assert_eq!(detail.input_price, "$0.01/1K tokens");
        assert_eq!(detail.output_price, "$0.03/1K tokens");
        // Page fills what the API cannot.
        assert_eq!(detail.latency, "0.41s");
        assert_eq!(detail.throughput, NOT_AVAILABLE);
        assert_eq!(record.description, "An API description.");
    }

    #[test]
    fn test_build_record_page_providers_win() {
        let page = vec![
            ScrapedProvider {
                provider: "fireworks".into(),
                cells: vec![("Context".into(), "64K tokens".into())],
            },
            ScrapedProvider {
                provider: "together".into(),
                cells: vec![],
            },
        ];
        let record =
            build_model_record("https://openrouter.ai", "deepseek/deepseek-chat", None, &page);
        assert_eq!(record.providers, vec!["fireworks", "together"]);
        assert_eq!(record.provider_details["fireworks"].context, "64K tokens");
        // Provider without page cells falls back to the static table.
        assert_eq!(
            record.provider_details["together"].input_price,
            "$0.0007/1K tokens"
        );
    }

    #[test]
    fn test_build_ranking_records() {
        let rows = vec![
            ScrapedRankingRow {
                rank: Some(1),
                model_name: "GPT-4 Turbo".into(),
                href: Some("/openai/gpt-4-turbo".into()),
                score_raw: Some("1.2b tokens".into()),
            },
            ScrapedRankingRow {
                rank: None,
                model_name: "Mystery".into(),
                href: Some("/blog/post".into()),
                score_raw: None,
            },
        ];
        let records = build_ranking_records(RankingCategory::Programming, &rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank, 1);
        assert_eq!(records[0].model_slug.as_deref(), Some("gpt-4-turbo"));
        assert_eq!(records[0].score, Some(1_200_000_000.0));
        // Row index is the rank fallback; a non-model link resolves to None.
        assert_eq!(records[1].rank, 2);
        assert_eq!(records[1].model_slug, None);
        assert_eq!(records[1].score, None);
    }

    #[test]
    fn test_slug_from_href() {
        assert_eq!(slug_from_href("/acme/foo-bar"), Some("foo-bar".into()));
        assert_eq!(
            slug_from_href("https://openrouter.ai/acme/foo-bar?tab=pricing"),
            Some("foo-bar".into())
        );
        assert_eq!(slug_from_href("/models"), None);
        assert_eq!(slug_from_href("/a/b/c"), None);
    }

    #[test]
    fn test_build_app_record() {
        let row = ScrapedAppRow {
            name: "Writerly".into(),
            url: "https://writerly.example".into(),
            tokens_raw: "41.3b tokens".into(),
        };
        let record = build_app_record(&row);
        assert_eq!(record.token_count, Some(41_300_000_000.0));

        let odd = ScrapedAppRow {
            name: "Odd".into(),
            url: String::new(),
            tokens_raw: "a lot".into(),
        };
        assert_eq!(build_app_record(&odd).token_count, None);
    }
}
