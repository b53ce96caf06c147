use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use models::{
    AdDesign, Business, CategorySelection, CategorySuggestion, CategorySuggestionInput, Coupon, JobListingInput,
    RegisterBusinessInput, ServiceArea, UpdateBusinessInput,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::errors::JsonApiError;
use crate::state::ServerState;

type ApiResult<T> = Result<Json<T>, JsonApiError>;

#[utoipa::path(
    post, path = "/businesses", tag = "businesses",
    request_body = crate::openapi::RegisterBusinessDoc,
    responses(
        (status = 201, description = "Registered"),
        (status = 400, description = "Validation Error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterBusinessInput>,
) -> Result<(StatusCode, Json<Business>), JsonApiError> {
    let business = state.services.businesses.register(input).await?;
    Ok((StatusCode::CREATED, Json(business)))
}

#[utoipa::path(
    get, path = "/businesses/{id}", tag = "businesses",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get_business(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<Business> {
    Ok(Json(state.services.businesses.get(&id).await?))
}

#[utoipa::path(
    put, path = "/businesses/{id}", tag = "businesses",
    params(("id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Email belongs to another business")
    )
)]
pub async fn update_business(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateBusinessInput>,
) -> ApiResult<Business> {
    Ok(Json(state.services.businesses.update_profile(&id, input).await?))
}

pub async fn get_categories(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<CategorySelection>> {
    Ok(Json(state.services.categories.selections(&id).await?))
}

#[utoipa::path(
    put, path = "/businesses/{id}/categories", tag = "businesses",
    params(("id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Saved selections"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn save_categories(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(selections): Json<Vec<CategorySelection>>,
) -> ApiResult<Vec<CategorySelection>> {
    Ok(Json(state.services.categories.save_selections(&id, selections).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCategoryQuery {
    pub full_path: String,
}

#[utoipa::path(
    delete, path = "/businesses/{id}/categories", tag = "businesses",
    params(("id" = String, Path, description = "Business id"), RemoveCategoryQuery),
    responses((status = 200, description = "Remaining selections"), (status = 404, description = "Not Found"))
)]
pub async fn remove_category(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(q): Query<RemoveCategoryQuery>,
) -> ApiResult<Vec<CategorySelection>> {
    Ok(Json(state.services.categories.remove_selection(&id, &q.full_path).await?))
}

pub async fn get_service_area(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<ServiceArea> {
    Ok(Json(state.services.service_areas.get(&id).await?))
}

pub async fn save_service_area(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(area): Json<ServiceArea>,
) -> ApiResult<ServiceArea> {
    Ok(Json(state.services.service_areas.save(&id, area).await?))
}

pub async fn get_keywords(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<Vec<String>> {
    state.services.businesses.get(&id).await?;
    Ok(Json(state.services.businesses.keywords(&id).await?))
}

pub async fn save_keywords(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(keywords): Json<Vec<String>>,
) -> ApiResult<Vec<String>> {
    Ok(Json(state.services.businesses.save_keywords(&id, keywords).await?))
}

pub async fn get_coupons(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<Vec<Coupon>> {
    Ok(Json(state.services.coupons.list(&id).await?))
}

pub async fn save_coupons(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(coupons): Json<Vec<Coupon>>,
) -> ApiResult<Vec<Coupon>> {
    Ok(Json(state.services.coupons.save(&id, coupons).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct JobsQuery {
    /// `card` returns the display projection instead of stored listings.
    pub view: Option<String>,
}

#[utoipa::path(
    get, path = "/businesses/{id}/jobs", tag = "jobs",
    params(("id" = String, Path, description = "Business id"), JobsQuery),
    responses((status = 200, description = "Listings, newest first"))
)]
pub async fn list_jobs(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(q): Query<JobsQuery>,
) -> Result<Json<Value>, JsonApiError> {
    let encoded = if q.view.as_deref() == Some("card") {
        serde_json::to_value(state.services.jobs.list_formatted(&id).await?)
    } else {
        serde_json::to_value(state.services.jobs.list(&id).await?)
    };
    encoded.map(Json).map_err(|e| {
        error!(error = %e, "job listing encode failed");
        JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(e.to_string()))
    })
}

#[utoipa::path(
    post, path = "/businesses/{id}/jobs", tag = "jobs",
    params(("id" = String, Path, description = "Business id")),
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn create_job(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<JobListingInput>,
) -> Result<(StatusCode, Json<models::JobListing>), JsonApiError> {
    let job = state.services.jobs.create(&id, input).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn delete_job(
    State(state): State<ServerState>,
    Path((id, job_id)): Path<(String, String)>,
) -> StatusCode {
    match state.services.jobs.remove(&id, &job_id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!(error = %e, business_id = %id, %job_id, "job delete failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub async fn get_ad_design(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<AdDesign> {
    match state.services.ad_designs.get(&id).await? {
        Some(design) => Ok(Json(design)),
        None => Err(JsonApiError::not_found("ad design not found")),
    }
}

#[utoipa::path(
    put, path = "/businesses/{id}/ad-design", tag = "businesses",
    params(("id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Saved"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn save_ad_design(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(design): Json<AdDesign>,
) -> ApiResult<AdDesign> {
    Ok(Json(state.services.ad_designs.save(&id, design).await?))
}

#[utoipa::path(
    post, path = "/categories/suggestions", tag = "categories",
    responses((status = 201, description = "Suggestion recorded"), (status = 400, description = "Validation Error"))
)]
pub async fn suggest_category(
    State(state): State<ServerState>,
    Json(input): Json<CategorySuggestionInput>,
) -> Result<(StatusCode, Json<CategorySuggestion>), JsonApiError> {
    let suggestion = state.services.categories.suggest(input).await?;
    info!(suggestion_id = %suggestion.id, "category suggestion received");
    Ok((StatusCode::CREATED, Json(suggestion)))
}
