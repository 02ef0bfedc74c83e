use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers::{login, profile, validate};

pub fn create_auth_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/validate", post(validate))
        .route("/profile", get(profile))
        .with_state(config)
}
