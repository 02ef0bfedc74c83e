use std::sync::Arc;

use axum::{routing::get, Router};

use auth_cell::create_auth_router;
use extraction_cell::create_extraction_router;
use patient_cell::create_patient_router;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Patient Records API is running!" }))
        .nest("/api/auth", create_auth_router(state.clone()))
        .nest("/api/patients", create_patient_router(state.clone()))
        .nest("/api/extraction", create_extraction_router(state))
}
