use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use dispatch_cell::router::dispatch_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Field Dispatch API is running!" }))
        .nest("/dispatch", dispatch_routes(state))
}
