//! Read-mostly HTTP surface over the query layer, plus the admin refresh
//! trigger. Failures surface as empty lists or a generic JSON error body,
//! never a stack trace.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::export;
use crate::scrape::{RefreshController, RemoteSource};
use crate::store::Store;
use crate::types::RankingCategory;

/// Shared application state for the HTTP API.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub refresh: Arc<RefreshController>,
    pub source: Arc<dyn RemoteSource>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/models/{slug}", get(get_model))
        .route("/api/rankings/{category}", get(list_rankings))
        .route("/api/apps", get(list_apps))
        .route("/api/status", get(status))
        .route("/api/refresh", post(trigger_refresh))
        .route("/api/refresh/stop", post(stop_refresh))
        .route("/export/models.csv", get(export_csv))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP API listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_models())
}

async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.store.get_model(&slug) {
        Some(model) => Json(model).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "model not found"})),
        )
            .into_response(),
    }
}

async fn list_rankings(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    match RankingCategory::parse(&category) {
        Some(category) => Json(state.store.list_rankings(category)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown category"})),
        )
            .into_response(),
    }
}

async fn list_apps(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_apps())
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": state.refresh.status(),
        "models": state.store.model_count(),
        "universe": state.refresh.total(),
        "stopRequested": state.refresh.stop_requested(),
    }))
}

async fn trigger_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let started = state.refresh.refresh_all(
        state.store.clone(),
        state.source.clone(),
        state.config.clone(),
    );
    Json(json!({
        "started": started,
        "status": state.refresh.status(),
    }))
}

async fn stop_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.refresh.request_stop();
    Json(json!({"status": state.refresh.status()}))
}

async fn export_csv(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let bytes = export::export_models_csv(&state.store);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"models.csv\"",
            ),
        ],
        bytes,
    )
}
