use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::util::http;

/// One entry of the remote models-listing API. Everything but `id` is
/// optional; the normalizer fills the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiModel {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub pricing: Option<ApiPricing>,
    #[serde(default)]
    pub top_provider: Option<ApiTopProvider>,
}

/// Prices arrive as strings on some deployments and numbers on others,
/// so both fields stay raw JSON values until normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPricing {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
    #[serde(default)]
    pub completion: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTopProvider {
    #[serde(default)]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub max_completion_tokens: Option<u64>,
}

/// Fetch the full models listing. Returns an empty list on any failure;
/// callers treat that as "no data found".
pub async fn fetch_model_listing(config: &Config) -> Vec<ApiModel> {
    let url = format!("{}/models", config.api_base.trim_end_matches('/'));
    debug!("Fetching model listing from {}", url);

    let mut request = http::client()
        .get(&url)
        .header("Accept", "application/json")
        .timeout(Duration::from_secs(config.scrape.http_timeout_secs));
    if !config.api_key.is_empty() {
        request = request.bearer_auth(&config.api_key);
    }

    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("Model listing request failed: {}", e);
            return Vec::new();
        }
    };
    if !response.status().is_success() {
        warn!("Model listing returned {}", response.status());
        return Vec::new();
    }

    let payload = match response.json::<serde_json::Value>().await {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse model listing: {}", e);
            return Vec::new();
        }
    };

    parse_listing(&payload)
}

/// Decode the listing payload. Entries that fail to decode are skipped
/// individually so one malformed model never drops the whole listing.
pub(crate) fn parse_listing(payload: &serde_json::Value) -> Vec<ApiModel> {
    let entries = payload
        .get("data")
        .and_then(|d| d.as_array())
        .or_else(|| payload.as_array());
    let Some(entries) = entries else {
        warn!("Model listing has no data array");
        return Vec::new();
    };

    let mut models = Vec::new();
    for entry in entries {
        match serde_json::from_value::<ApiModel>(entry.clone()) {
            Ok(m) if !m.id.trim().is_empty() => models.push(m),
            Ok(_) => {}
            Err(e) => debug!("Skipping malformed listing entry: {}", e),
        }
    }
    models
}
