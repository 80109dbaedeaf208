use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use ex314_persist::SearchHit;

use crate::{auth::CurrentUser, error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive text; fewer than 2 characters returns nothing
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub thread_id: String,
    pub thread_title: String,
    pub message_id: String,
    pub role: String,
    pub timestamp: DateTime<Utc>,
    pub snippet: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

impl From<SearchHit> for SearchResult {
    fn from(hit: SearchHit) -> Self {
        Self {
            thread_id: hit.thread_id,
            thread_title: hit.thread_title,
            message_id: hit.message_id,
            role: hit.role.as_str().to_string(),
            timestamp: hit.timestamp,
            snippet: hit.snippet,
        }
    }
}

/// Search message content across the caller's threads, newest first
#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching messages", body = SearchResponse)
    ),
    security(("bearer" = [])),
    tag = "search"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let hits = state.persist.search_messages(&user.user_id, &query.q).await?;
    tracing::debug!(user_id = %user.user_id, hits = hits.len(), "Search completed");

    Ok(Json(SearchResponse {
        results: hits.into_iter().map(SearchResult::from).collect(),
    }))
}
