use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod sheets;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes())
        .merge(sheets::routes(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
