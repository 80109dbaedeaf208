use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use ex314_persist::ThreadQuery;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Returns the health status of the API and its dependencies
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();

    match check_storage(&state).await {
        Ok(_) => services.insert("storage".to_string(), "available".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            services.insert("storage".to_string(), "unavailable".to_string())
        }
    };
    services.insert("llm".to_string(), state.config.llm.provider.clone());

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}

async fn check_storage(state: &AppState) -> ex314_persist::Result<()> {
    let query = ThreadQuery {
        limit: Some(1),
        ..Default::default()
    };
    state.persist.list_threads("_health_check", &query).await?;
    Ok(())
}
