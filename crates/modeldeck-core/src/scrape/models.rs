//! The model job: enumerate the universe, process each id concurrently,
//! upsert each record the moment it is ready.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{RefreshController, RemoteSource};
use crate::config::Config;
use crate::fetch::ApiModel;
use crate::normalize;
use crate::store::Store;

pub(crate) async fn run(
    ctrl: Arc<RefreshController>,
    store: Store,
    source: Arc<dyn RemoteSource>,
    config: Config,
) {
    let listing = source.model_listing().await;
    info!("API listing returned {} models", listing.len());

    let universe = enumerate_universe(&listing, &config.scrape.extra_model_ids);
    ctrl.set_total(universe.len());
    info!("Processing {} model ids", universe.len());

    let api_by_id: HashMap<String, ApiModel> =
        listing.into_iter().map(|m| (m.id.clone(), m)).collect();

    let semaphore = Arc::new(Semaphore::new(config.scrape.workers.max(1)));
    let mut handles = Vec::new();
    for model_id in universe {
        if ctrl.stop_requested() {
            info!("Stop requested; skipping remaining models");
            break;
        }
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => break,
        };
        // The wait for a worker slot may span a stop request.
        if ctrl.stop_requested() {
            info!("Stop requested; skipping remaining models");
            break;
        }

        let api = api_by_id.get(&model_id).cloned();
        let store = store.clone();
        let source = source.clone();
        let site_base = config.site_base.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            debug!("Processing model {}", model_id);
            let page = source.model_page(&model_id).await;
            let record = normalize::build_model_record(&site_base, &model_id, api.as_ref(), &page);
            if let Err(e) = store.upsert_model(&record) {
                warn!("Failed to store model {}: {}", record.slug, e);
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

/// The universe of ids to process: the API listing plus the configured extra
/// list, order-preserving and deduplicated. Only `provider/model` shaped ids
/// qualify.
pub(crate) fn enumerate_universe(listing: &[ApiModel], extra: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in listing
        .iter()
        .map(|m| m.id.as_str())
        .chain(extra.iter().map(|s| s.as_str()))
    {
        let id = id.trim();
        if id.is_empty() || !id.contains('/') || id.starts_with('/') || id.ends_with('/') {
            continue;
        }
        if seen.insert(id.to_string()) {
            out.push(id.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(ids: &[&str]) -> Vec<ApiModel> {
        ids.iter()
            .map(|id| ApiModel {
                id: id.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_enumerate_universe_dedupes_and_keeps_order() {
        let listing = listed(&["acme/one", "acme/two", "acme/one"]);
        let extra = vec!["zeta/three".to_string(), "acme/two".to_string()];
        assert_eq!(
            enumerate_universe(&listing, &extra),
            vec!["acme/one", "acme/two", "zeta/three"]
        );
    }

    #[test]
    fn test_enumerate_universe_rejects_malformed_ids() {
        let listing = listed(&["no-slash", "", "  ", "/leading", "trailing/", "ok/fine"]);
        assert_eq!(enumerate_universe(&listing, &[]), vec!["ok/fine"]);
    }
}
