use axum::{
    extract::{Path, Query, State},
    Json,
};
use models::{ZipCodeRecord, ZipDistance};
use serde::Deserialize;

use crate::errors::JsonApiError;
use crate::state::ServerState;

const DEFAULT_RADIUS_MILES: f64 = 25.0;
const DEFAULT_RADIUS_LIMIT: usize = 50;

#[utoipa::path(
    get, path = "/zip-codes/{zip}", tag = "zip-codes",
    params(("zip" = String, Path, description = "Zip code")),
    responses((status = 200, description = "OK"), (status = 404, description = "Unknown zip"))
)]
pub async fn get_zip(State(state): State<ServerState>, Path(zip): Path<String>) -> Result<Json<ZipCodeRecord>, JsonApiError> {
    match state.services.zip_codes.get(&zip).await? {
        Some(record) => Ok(Json(record)),
        None => Err(JsonApiError::not_found(format!("zip code {zip} not found"))),
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RadiusQuery {
    pub miles: Option<f64>,
    pub limit: Option<usize>,
}

#[utoipa::path(
    get, path = "/zip-codes/{zip}/radius", tag = "zip-codes",
    params(("zip" = String, Path, description = "Centre zip code"), RadiusQuery),
    responses((status = 200, description = "Nearest first"), (status = 400, description = "Bad radius"), (status = 404, description = "Unknown centre"))
)]
pub async fn radius(
    State(state): State<ServerState>,
    Path(zip): Path<String>,
    Query(q): Query<RadiusQuery>,
) -> Result<Json<Vec<ZipDistance>>, JsonApiError> {
    let miles = q.miles.unwrap_or(DEFAULT_RADIUS_MILES);
    if !(miles.is_finite() && miles >= 0.0) {
        return Err(JsonApiError::bad_request("miles must be a non-negative number"));
    }
    let limit = q.limit.unwrap_or(DEFAULT_RADIUS_LIMIT);
    Ok(Json(state.services.zip_codes.within_radius(&zip, miles, limit).await?))
}
