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
    services::recommendations::RecommendParams,
};

/// Handler for hybrid recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    caller: CallerIdentity,
    Query(params): Query<RecommendParams>,
) -> AppResult<Json<Vec<Candidate>>> {
    tracing::info!(
        request_id = %request_id,
        subject = %caller.subject,
        query = %params.query,
        limit = params.limit,
        tfidf_weight = params.tfidf_weight,
        min_score = params.min_score,
        "Processing recommendation request"
    );

    let recommendations = state.recommendations.recommend(params).await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(recommendations))
}
