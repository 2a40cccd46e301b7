//! The apps job: scrape the showcase page, upsert by app name. Apps that
//! disappear upstream are deliberately left in place.

use std::sync::Arc;
use tracing::{info, warn};

use super::{RefreshController, RemoteSource};
use crate::normalize;
use crate::store::Store;

pub(crate) async fn run(ctrl: Arc<RefreshController>, store: Store, source: Arc<dyn RemoteSource>) {
    if ctrl.stop_requested() {
        return;
    }
    let rows = source.apps_page().await;
    info!("Scraped {} apps", rows.len());
    for row in rows {
        let record = normalize::build_app_record(&row);
        if record.app_name.is_empty() {
            continue;
        }
        if let Err(e) = store.upsert_app(&record) {
            warn!("Failed to store app {}: {}", record.app_name, e);
        }
    }
}
