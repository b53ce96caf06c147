use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::{AnalyticsEvent, RatingSummary, Review, ReviewSubmission};

use crate::errors::JsonApiError;
use crate::state::ServerState;

type ApiResult<T> = Result<Json<T>, JsonApiError>;

#[utoipa::path(
    get, path = "/businesses/{id}/reviews", tag = "reviews",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 200, description = "Reviews, newest first"))
)]
pub async fn list_reviews(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<Vec<Review>> {
    Ok(Json(state.services.reviews.list(&id).await?))
}

#[utoipa::path(
    post, path = "/businesses/{id}/reviews", tag = "reviews",
    params(("id" = String, Path, description = "Business id")),
    request_body = crate::openapi::ReviewSubmissionDoc,
    responses(
        (status = 201, description = "Stored"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn submit_review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<ReviewSubmission>,
) -> Result<(StatusCode, Json<Review>), JsonApiError> {
    let review = state.services.reviews.submit(&id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[utoipa::path(
    get, path = "/businesses/{id}/rating", tag = "reviews",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 200, description = "Average rating and review count"))
)]
pub async fn get_rating(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<RatingSummary> {
    Ok(Json(state.services.reviews.rating(&id).await?))
}

#[utoipa::path(
    post, path = "/businesses/{id}/analytics/events", tag = "analytics",
    params(("id" = String, Path, description = "Business id")),
    request_body = crate::openapi::AnalyticsEventDoc,
    responses(
        (status = 202, description = "Counted"),
        (status = 422, description = "Unknown event type"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn track_event(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(event): Json<AnalyticsEvent>,
) -> Result<StatusCode, JsonApiError> {
    state.services.analytics.track(&id, event).await?;
    Ok(StatusCode::ACCEPTED)
}
