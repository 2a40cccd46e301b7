//! SQLite cache of the last successful scrape per entity type.
//!
//! Connections are short-lived: every operation opens its own, so no
//! transaction ever spans fetch or normalize work. Collection-valued model
//! columns are stored as JSON text and decoded on read; a decode failure
//! defaults that row's collection instead of failing the whole query.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{AppRecord, ModelRecord, ProviderDetail, RankingCategory, RankingRecord};

#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA busy_timeout=30000;
            PRAGMA synchronous=NORMAL;
            ",
        )?;
        Ok(conn)
    }

    /// Idempotent schema creation.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS models (
                slug TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                model_id TEXT NOT NULL,
                providers TEXT NOT NULL,
                provider_details TEXT NOT NULL,
                description TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rankings (
                category TEXT NOT NULL,
                rank INTEGER NOT NULL,
                model_name TEXT NOT NULL,
                model_slug TEXT,
                score REAL,
                PRIMARY KEY (category, rank)
            );
            CREATE TABLE IF NOT EXISTS apps (
                app_name TEXT PRIMARY KEY,
                app_url TEXT NOT NULL,
                token_count_raw TEXT NOT NULL,
                token_count REAL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        debug!("Store initialized at {}", self.db_path.display());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Insert or replace one model, keyed by slug.
    pub fn upsert_model(&self, record: &ModelRecord) -> Result<()> {
        let conn = self.open()?;
        let providers = serde_json::to_string(&record.providers)?;
        let details = serde_json::to_string(&record.provider_details)?;
        conn.execute(
            "INSERT INTO models (slug, name, model_id, providers, provider_details, description, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(slug) DO UPDATE SET
                 name=excluded.name,
                 model_id=excluded.model_id,
                 providers=excluded.providers,
                 provider_details=excluded.provider_details,
                 description=excluded.description,
                 updated_at=excluded.updated_at",
            params![
                record.slug,
                record.name,
                record.model_id,
                providers,
                details,
                record.description,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        debug!("Upserted model {}", record.slug);
        Ok(())
    }

    /// Replace every row of one category in a single transaction.
    pub fn replace_rankings(&self, category: RankingCategory, rows: &[RankingRecord]) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM rankings WHERE category = ?1",
            params![category.as_str()],
        )?;
        for row in rows {
            tx.execute(
                "INSERT OR REPLACE INTO rankings (category, rank, model_name, model_slug, score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    category.as_str(),
                    row.rank,
                    row.model_name,
                    row.model_slug,
                    row.score,
                ],
            )?;
        }
        tx.commit()?;
        debug!("Replaced {} ranking rows for {}", rows.len(), category);
        Ok(())
    }

    /// Insert or replace one app, keyed by name. Stale apps are never deleted.
    pub fn upsert_app(&self, record: &AppRecord) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO apps (app_name, app_url, token_count_raw, token_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(app_name) DO UPDATE SET
                 app_url=excluded.app_url,
                 token_count_raw=excluded.token_count_raw,
                 token_count=excluded.token_count,
                 updated_at=excluded.updated_at",
            params![
                record.app_name,
                record.app_url,
                record.token_count_raw,
                record.token_count,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query layer: read-only accessors that log and return empty on
    // store-access failure instead of raising.
    // ------------------------------------------------------------------

    pub fn list_models(&self) -> Vec<ModelRecord> {
        match self.try_list_models() {
            Ok(models) => models,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                Vec::new()
            }
        }
    }

    fn try_list_models(&self) -> Result<Vec<ModelRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT slug, name, model_id, providers, provider_details, description
             FROM models ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_model)?;
        let mut models = Vec::new();
        for row in rows {
            match row {
                Ok(m) => models.push(m),
                Err(e) => warn!("Skipping unreadable model row: {}", e),
            }
        }
        Ok(models)
    }

    pub fn get_model(&self, slug: &str) -> Option<ModelRecord> {
        let result = (|| -> Result<Option<ModelRecord>> {
            let conn = self.open()?;
            let model = conn
                .query_row(
                    "SELECT slug, name, model_id, providers, provider_details, description
                     FROM models WHERE slug = ?1",
                    params![slug],
                    row_to_model,
                )
                .optional()?;
            Ok(model)
        })();
        match result {
            Ok(model) => model,
            Err(e) => {
                warn!("Failed to get model {}: {}", slug, e);
                None
            }
        }
    }

    pub fn list_rankings(&self, category: RankingCategory) -> Vec<RankingRecord> {
        let result = (|| -> Result<Vec<RankingRecord>> {
            let conn = self.open()?;
            let mut stmt = conn.prepare(
                "SELECT rank, model_name, model_slug, score
                 FROM rankings WHERE category = ?1 ORDER BY rank",
            )?;
            let rows = stmt.query_map(params![category.as_str()], |row| {
                Ok(RankingRecord {
                    category,
                    rank: row.get(0)?,
                    model_name: row.get(1)?,
                    model_slug: row.get(2)?,
                    score: row.get(3)?,
                })
            })?;
            Ok(rows.filter_map(|r| r.ok()).collect())
        })();
        match result {
            Ok(rankings) => rankings,
            Err(e) => {
                warn!("Failed to list {} rankings: {}", category, e);
                Vec::new()
            }
        }
    }

    pub fn list_apps(&self) -> Vec<AppRecord> {
        let result = (|| -> Result<Vec<AppRecord>> {
            let conn = self.open()?;
            let mut stmt = conn.prepare(
                "SELECT app_name, app_url, token_count_raw, token_count
                 FROM apps ORDER BY token_count DESC, app_name",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(AppRecord {
                    app_name: row.get(0)?,
                    app_url: row.get(1)?,
                    token_count_raw: row.get(2)?,
                    token_count: row.get(3)?,
                })
            })?;
            Ok(rows.filter_map(|r| r.ok()).collect())
        })();
        match result {
            Ok(apps) => apps,
            Err(e) => {
                warn!("Failed to list apps: {}", e);
                Vec::new()
            }
        }
    }

    pub fn model_count(&self) -> usize {
        let result = (|| -> Result<usize> {
            let conn = self.open()?;
            let count = conn.query_row("SELECT COUNT(*) FROM models", [], |row| row.get(0))?;
            Ok(count)
        })();
        match result {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count models: {}", e);
                0
            }
        }
    }
}

/// Decode one model row. A malformed JSON column yields an empty collection
/// for that record rather than an error.
fn row_to_model(row: &Row) -> rusqlite::Result<ModelRecord> {
    let providers_json: String = row.get(3)?;
    let details_json: String = row.get(4)?;

    let providers: Vec<String> = serde_json::from_str(&providers_json).unwrap_or_default();
    let provider_details: BTreeMap<String, ProviderDetail> =
        serde_json::from_str(&details_json).unwrap_or_default();

    Ok(ModelRecord {
        slug: row.get(0)?,
        name: row.get(1)?,
        model_id: row.get(2)?,
        providers,
        provider_details,
        description: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NOT_AVAILABLE;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path().join("models.db"));
        store.initialize().unwrap();
        (store, temp)
    }

    fn sample_model(slug: &str) -> ModelRecord {
        let model_id = format!("acme/{slug}");
        let mut details = BTreeMap::new();
        details.insert(
            "acme".to_string(),
            ProviderDetail {
                context: "32K tokens".into(),
                max_output: "4K tokens".into(),
                input_price: "$0.0005/1K tokens".into(),
                output_price: "$0.0005/1K tokens".into(),
                latency: NOT_AVAILABLE.into(),
                throughput: NOT_AVAILABLE.into(),
                url: format!("https://example.com/{model_id}"),
            },
        );
        ModelRecord {
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            model_id,
            providers: vec!["acme".into()],
            provider_details: details,
            description: "A test model.".into(),
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (store, _temp) = test_store();
        store.initialize().unwrap();
        store.initialize().unwrap();
        assert_eq!(store.model_count(), 0);
    }

    #[test]
    fn test_upsert_model_by_slug() {
        let (store, _temp) = test_store();
        let mut record = sample_model("foo-bar");
        store.upsert_model(&record).unwrap();
        assert_eq!(store.model_count(), 1);

        // Second upsert with the same slug replaces, not duplicates.
        record.description = "Updated.".into();
        store.upsert_model(&record).unwrap();
        assert_eq!(store.model_count(), 1);
        let loaded = store.get_model("foo-bar").unwrap();
        assert_eq!(loaded.description, "Updated.");
        assert_eq!(loaded.providers, vec!["acme"]);
        assert!(loaded.is_consistent());
    }

    #[test]
    fn test_get_model_missing() {
        let (store, _temp) = test_store();
        assert!(store.get_model("nope").is_none());
    }

    #[test]
    fn test_replace_rankings() {
        let (store, _temp) = test_store();
        let rows: Vec<RankingRecord> = (1..=3)
            .map(|i| RankingRecord {
                category: RankingCategory::Programming,
                rank: i,
                model_name: format!("Model {i}"),
                model_slug: Some(format!("model-{i}")),
                score: Some(i as f64 * 10.0),
            })
            .collect();
        store
            .replace_rankings(RankingCategory::Programming, &rows)
            .unwrap();
        assert_eq!(store.list_rankings(RankingCategory::Programming).len(), 3);
        // Other categories are untouched.
        assert!(store.list_rankings(RankingCategory::General).is_empty());

        // A refresh replaces the category wholesale.
        let fresh = vec![RankingRecord {
            category: RankingCategory::Programming,
            rank: 1,
            model_name: "Only".into(),
            model_slug: None,
            score: None,
        }];
        store
            .replace_rankings(RankingCategory::Programming, &fresh)
            .unwrap();
        let listed = store.list_rankings(RankingCategory::Programming);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].model_name, "Only");
        assert!(listed[0].model_slug.is_none());
    }

    #[test]
    fn test_upsert_app_keeps_stale_entries() {
        let (store, _temp) = test_store();
        let a = AppRecord {
            app_name: "Writerly".into(),
            app_url: "https://writerly.example".into(),
            token_count_raw: "41.3b tokens".into(),
            token_count: Some(41_300_000_000.0),
        };
        let b = AppRecord {
            app_name: "Coder".into(),
            app_url: "https://coder.example".into(),
            token_count_raw: "2.5k".into(),
            token_count: Some(2500.0),
        };
        store.upsert_app(&a).unwrap();
        store.upsert_app(&b).unwrap();

        // A later refresh that only sees one app leaves the other in place.
        let a2 = AppRecord {
            token_count_raw: "50b tokens".into(),
            token_count: Some(50_000_000_000.0),
            ..a.clone()
        };
        store.upsert_app(&a2).unwrap();

        let apps = store.list_apps();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].app_name, "Writerly"); // ordered by token_count desc
        assert_eq!(apps[0].token_count_raw, "50b tokens");
    }

    #[test]
    fn test_corrupt_json_column_defaults_to_empty() {
        let (store, _temp) = test_store();
        store.upsert_model(&sample_model("ok-model")).unwrap();

        // Corrupt the JSON columns behind the store's back.
        let conn = store.open().unwrap();
        conn.execute(
            "UPDATE models SET providers = 'not json', provider_details = '{broken'",
            [],
        )
        .unwrap();
        drop(conn);

        let models = store.list_models();
        assert_eq!(models.len(), 1);
        assert!(models[0].providers.is_empty());
        assert!(models[0].provider_details.is_empty());
        assert_eq!(models[0].slug, "ok-model");
    }

    #[test]
    fn test_query_layer_swallows_store_failure() {
        // Point at a directory that cannot be a database file.
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path());
        assert!(store.list_models().is_empty());
        assert!(store.list_apps().is_empty());
        assert!(store.get_model("x").is_none());
        assert_eq!(store.model_count(), 0);
    }
}
