use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use service::directory::Listing;

use crate::errors::JsonApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Landing page path, e.g. `/pet-care`.
    pub path: String,
}

#[utoipa::path(
    get, path = "/directory/pages", tag = "directory",
    params(PageQuery),
    responses((status = 200, description = "Listings on the page"), (status = 404, description = "Unknown page"))
)]
pub async fn for_page(State(state): State<ServerState>, Query(q): Query<PageQuery>) -> Result<Json<Vec<Listing>>, JsonApiError> {
    Ok(Json(state.services.directory.for_page(&q.path).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ZipFilter {
    pub zip: Option<String>,
}

#[utoipa::path(
    get, path = "/directory/category/{name}", tag = "directory",
    params(("name" = String, Path, description = "Category name in any known spelling"), ZipFilter),
    responses((status = 200, description = "Listings in the category"), (status = 400, description = "Invalid zip"))
)]
pub async fn by_category(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    Query(q): Query<ZipFilter>,
) -> Result<Json<Vec<Listing>>, JsonApiError> {
    let directory = &state.services.directory;
    let listings = match q.zip.as_deref().map(str::trim).filter(|z| !z.is_empty()) {
        Some(zip) => directory.by_category_and_zip(&name, zip).await?,
        None => directory.by_category(&name).await?,
    };
    Ok(Json(listings))
}

#[utoipa::path(
    get, path = "/directory/zip/{zip}", tag = "directory",
    params(("zip" = String, Path, description = "5-digit or ZIP+4")),
    responses((status = 200, description = "Local and nationwide listings"), (status = 400, description = "Invalid zip"))
)]
pub async fn by_zip(State(state): State<ServerState>, Path(zip): Path<String>) -> Result<Json<Vec<Listing>>, JsonApiError> {
    Ok(Json(state.services.directory.by_zip(&zip).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub zip: String,
}

#[utoipa::path(
    get, path = "/directory/search", tag = "directory",
    params(SearchQuery),
    responses((status = 200, description = "Matches sorted by name"), (status = 400, description = "Missing query or zip"))
)]
pub async fn search(State(state): State<ServerState>, Query(q): Query<SearchQuery>) -> Result<Json<Vec<Listing>>, JsonApiError> {
    Ok(Json(state.services.directory.search(&q.q, &q.zip).await?))
}
