use async_trait::async_trait;

use crate::config::Config;
use crate::fetch::{self, ApiModel, ScrapedAppRow, ScrapedProvider, ScrapedRankingRow};
use crate::types::RankingCategory;

/// Seam between the orchestrator and the remote site. Every method is
/// best-effort: failures surface as empty results, never as errors.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn model_listing(&self) -> Vec<ApiModel>;
    async fn model_page(&self, model_id: &str) -> Vec<ScrapedProvider>;
    async fn ranking_page(&self, category: RankingCategory) -> Vec<ScrapedRankingRow>;
    async fn apps_page(&self) -> Vec<ScrapedAppRow>;
}

/// Live source backed by the listing site's API and rendered pages.
pub struct OpenRouterSource {
    config: Config,
}

impl OpenRouterSource {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RemoteSource for OpenRouterSource {
    async fn model_listing(&self) -> Vec<ApiModel> {
        fetch::fetch_model_listing(&self.config).await
    }

    async fn model_page(&self, model_id: &str) -> Vec<ScrapedProvider> {
        fetch::fetch_model_page(&self.config, model_id).await
    }

    async fn ranking_page(&self, category: RankingCategory) -> Vec<ScrapedRankingRow> {
        fetch::fetch_ranking_page(&self.config, category).await
    }

    async fn apps_page(&self) -> Vec<ScrapedAppRow> {
        fetch::fetch_apps_page(&self.config).await
    }
}
