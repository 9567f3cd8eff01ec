use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use tracing::{error, info};

use shared_config::AppConfig;
use shared_models::{auth::User, error::AppError};
use shared_utils::extractor::BearerToken;

use crate::{
    DispatchError, DispatchRequest, DispatchResponse,
    services::{DispatchEngine, SupabaseDispatchStore},
};

/// Select a technician for a home visit. The assignment is not persisted.
pub async fn dispatch_technician(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, AppError> {
    info!("Dispatch request from user {} for slot at {}", user.id, request.start_at);

    request.validate()?;

    let store = Arc::new(SupabaseDispatchStore::new(&config, Some(token)));
    let engine = DispatchEngine::new(store);

    let result = engine.dispatch(&request).await.map_err(|e| {
        if let DispatchError::LoadFailure(_) = e {
            error!("Dispatch failed for user {}: {}", user.id, e);
        }
        AppError::from(e)
    })?;

    Ok(Json(DispatchResponse::from(result)))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
