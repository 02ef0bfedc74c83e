use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::auth_middleware;

use crate::handlers::upload_document;

// Scanned multi-page records run well past axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn create_extraction_router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/upload", post(upload_document))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ))
        .with_state(config)
}
