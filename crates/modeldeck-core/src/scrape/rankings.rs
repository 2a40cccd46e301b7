//! The rankings job: one leaderboard fetch per category, replaced wholesale.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{RefreshController, RemoteSource};
use crate::normalize;
use crate::store::Store;
use crate::types::RankingCategory;

pub(crate) async fn run(ctrl: Arc<RefreshController>, store: Store, source: Arc<dyn RemoteSource>) {
    for category in RankingCategory::ALL {
        if ctrl.stop_requested() {
            info!("Stop requested; skipping remaining ranking categories");
            break;
        }
        let rows = source.ranking_page(category).await;
        let records = normalize::build_ranking_records(category, &rows);
        if records.is_empty() {
            // An empty scrape means "no data found"; keep the last
            // successful rows for this category.
            debug!("No ranking rows for {}; keeping previous data", category);
            continue;
        }
        match store.replace_rankings(category, &records) {
            Ok(()) => info!("Stored {} ranking rows for {}", records.len(), category),
            Err(e) => warn!("Failed to store {} rankings: {}", category, e),
        }
    }
}
