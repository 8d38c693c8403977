use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod requests;
pub mod responses;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/predict", post(handlers::post_predict))
        .route("/api/correction", post(handlers::post_correction))
        .route("/api/health", get(handlers::get_health))
        .with_state(state)
}
