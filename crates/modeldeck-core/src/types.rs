use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel for a stat the scrape could not recover.
pub const NOT_AVAILABLE: &str = "N/A";

/// Leaderboard category on the remote listing site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingCategory {
    General,
    Roleplay,
    Programming,
    Marketing,
    Science,
    Translation,
}

impl RankingCategory {
    pub const ALL: [RankingCategory; 6] = [
        RankingCategory::General,
        RankingCategory::Roleplay,
        RankingCategory::Programming,
        RankingCategory::Marketing,
        RankingCategory::Science,
        RankingCategory::Translation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankingCategory::General => "general",
            RankingCategory::Roleplay => "roleplay",
            RankingCategory::Programming => "programming",
            RankingCategory::Marketing => "marketing",
            RankingCategory::Science => "science",
            RankingCategory::Translation => "translation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Site path of the category leaderboard page.
    pub fn page_path(&self) -> String {
        format!("rankings/{}", self.as_str())
    }
}

impl std::fmt::Display for RankingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-provider stats for one model. Every field is a display string;
/// absent values hold the `N/A` sentinel, except `url` which always points
/// at the model's public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDetail {
    pub context: String,
    pub max_output: String,
    pub input_price: String,
    pub output_price: String,
    #[serde(default = "not_available")]
    pub latency: String,
    #[serde(default = "not_available")]
    pub throughput: String,
    pub url: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

impl ProviderDetail {
    /// A detail record with every stat unavailable.
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            context: NOT_AVAILABLE.to_string(),
            max_output: NOT_AVAILABLE.to_string(),
            input_price: NOT_AVAILABLE.to_string(),
            output_price: NOT_AVAILABLE.to_string(),
            latency: NOT_AVAILABLE.to_string(),
            throughput: NOT_AVAILABLE.to_string(),
            url: url.into(),
        }
    }
}

/// One catalog entry: a model as offered by one or more providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub slug: String,
    pub model_id: String,
    pub providers: Vec<String>,
    pub provider_details: BTreeMap<String, ProviderDetail>,
    pub description: String,
}

impl ModelRecord {
    /// Every provider in `providers` must have a matching detail entry.
    pub fn is_consistent(&self) -> bool {
        self.providers
            .iter()
            .all(|p| self.provider_details.contains_key(p))
    }
}

/// A model's position within one leaderboard category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub category: RankingCategory,
    pub rank: u32,
    pub model_name: String,
    /// None when the source link could not be resolved to a provider/model pair.
    pub model_slug: Option<String>,
    pub score: Option<f64>,
}

/// A third-party application showcased as a consumer of model usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    pub app_name: String,
    pub app_url: String,
    /// Original display string, e.g. "41.3b tokens".
    pub token_count_raw: String,
    /// Parsed numeric value, None if unparseable.
    pub token_count: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for c in RankingCategory::ALL {
            assert_eq!(RankingCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(RankingCategory::parse("Programming"), Some(RankingCategory::Programming));
        assert_eq!(RankingCategory::parse("  general "), Some(RankingCategory::General));
        assert_eq!(RankingCategory::parse("poetry"), None);
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&RankingCategory::Roleplay).unwrap();
        assert_eq!(json, "\"roleplay\"");
        let c: RankingCategory = serde_json::from_str("\"general\"").unwrap();
        assert_eq!(c, RankingCategory::General);
    }

    #[test]
    fn test_placeholder_detail() {
        let d = ProviderDetail::placeholder("https://example.com/acme/foo");
        assert_eq!(d.context, NOT_AVAILABLE);
        assert_eq!(d.input_price, NOT_AVAILABLE);
        assert_eq!(d.url, "https://example.com/acme/foo");
    }

    #[test]
    fn test_detail_serde_defaults_optional_stats() {
        // Older rows may lack latency/throughput; decoding fills the sentinel.
        let json = r#"{
            "context": "32K tokens",
            "max_output": "4K tokens",
            "input_price": "$0.0005/1K tokens",
            "output_price": "$0.0005/1K tokens",
            "url": "https://example.com/m"
        }"#;
        let d: ProviderDetail = serde_json::from_str(json).unwrap();
        assert_eq!(d.latency, NOT_AVAILABLE);
        assert_eq!(d.throughput, NOT_AVAILABLE);
    }

    #[test]
    fn test_model_record_consistency() {
        let mut details = BTreeMap::new();
        details.insert("acme".to_string(), ProviderDetail::placeholder("u"));
        let record = ModelRecord {
            name: "Foo Bar".into(),
            slug: "foo-bar".into(),
            model_id: "acme/foo-bar".into(),
            providers: vec!["acme".into()],
            provider_details: details,
            description: "d".into(),
        };
        assert!(record.is_consistent());

        let mut broken = record.clone();
        broken.providers.push("other".into());
        assert!(!broken.is_consistent());
    }
}
