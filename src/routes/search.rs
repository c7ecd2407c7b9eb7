use axum::{
    extract::{Query, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{CallerIdentity, RequestId},
    models::Candidate,
    routes::AppState,
    services::recommendations::SearchParams,
};

/// Handler for content-based product search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    caller: CallerIdentity,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Candidate>>> {
    tracing::info!(
        request_id = %request_id,
        subject = %caller.subject,
        query = %params.query,
        limit = params.limit,
        "Processing search request"
    );

    let results = state.recommendations.search(params).await?;
    Ok(Json(results))
}
