use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use models::{Business, BusinessAnalytics, CategorySuggestion, ImportStats, RatingSummary, ZipCodeRecord};
use serde::{Deserialize, Serialize};
use service::admin::category_cleanup::{CategoryAnalysis, CleanupReport};
use service::admin::page_mapping::{BatchDiagnosisEntry, BatchFixResult, FixOutcome, PageDiagnosis};
use service::businesses::PurgeReport;
use service::pagination::{paginate, Page, Pagination};
use tracing::{error, info};

use crate::errors::JsonApiError;
use crate::state::ServerState;

type ApiResult<T> = Result<Json<T>, JsonApiError>;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[utoipa::path(
    get, path = "/admin/businesses", tag = "admin",
    params(ListQuery),
    responses((status = 200, description = "Newest first, paginated"), (status = 401, description = "Unauthorized"))
)]
pub async fn list_businesses(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> ApiResult<Page<Business>> {
    let defaults = Pagination::default();
    let p = Pagination { page: q.page.unwrap_or(defaults.page), per_page: q.per_page.unwrap_or(defaults.per_page) };
    let all = state.services.businesses.list().await?;
    Ok(Json(paginate(all, p)))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[utoipa::path(
    get, path = "/admin/businesses/search", tag = "admin",
    params(SearchQuery),
    responses((status = 200, description = "OK"), (status = 401, description = "Unauthorized"))
)]
pub async fn search_businesses(State(state): State<ServerState>, Query(q): Query<SearchQuery>) -> ApiResult<Vec<Business>> {
    Ok(Json(state.services.page_mapping.admin_search(&q.name, &q.category).await?))
}

#[utoipa::path(
    delete, path = "/admin/businesses/{id}", tag = "admin",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 200, description = "Purged"), (status = 404, description = "Not Found"))
)]
pub async fn delete_business(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<PurgeReport> {
    Ok(Json(state.services.businesses.delete(&id).await?))
}

#[utoipa::path(
    delete, path = "/admin/businesses/{id}/reviews/{review_id}", tag = "admin",
    params(("id" = String, Path, description = "Business id"), ("review_id" = String, Path, description = "Review id")),
    responses((status = 200, description = "Refreshed rating"), (status = 404, description = "Not Found"))
)]
pub async fn delete_review(
    State(state): State<ServerState>,
    Path((id, review_id)): Path<(String, String)>,
) -> ApiResult<RatingSummary> {
    Ok(Json(state.services.reviews.delete(&id, &review_id).await?))
}

#[utoipa::path(
    get, path = "/admin/businesses/{id}/analytics", tag = "admin",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 200, description = "Event counters and zip views"), (status = 404, description = "Not Found"))
)]
pub async fn business_analytics(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<BusinessAnalytics> {
    Ok(Json(state.services.analytics.summary(&id).await?))
}

#[utoipa::path(
    delete, path = "/admin/businesses/{id}/analytics", tag = "admin",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 204, description = "Counters cleared"))
)]
pub async fn reset_analytics(State(state): State<ServerState>, Path(id): Path<String>) -> Result<StatusCode, JsonApiError> {
    let removed = state.services.analytics.reset(&id).await?;
    info!(business_id = %id, removed, "analytics reset by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/admin/page-mapping/{id}", tag = "admin",
    params(("id" = String, Path, description = "Business id")),
    responses((status = 200, description = "Diagnosis"), (status = 404, description = "Not Found"))
)]
pub async fn diagnose_page_mapping(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<PageDiagnosis> {
    Ok(Json(state.services.page_mapping.diagnose(&id).await?))
}

#[utoipa::path(
    post, path = "/admin/page-mapping/{id}", tag = "admin",
    params(("id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Fixed"),
        (status = 400, description = "No page for the business's category"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn fix_page_mapping(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<FixOutcome> {
    Ok(Json(state.services.page_mapping.fix(&id).await?))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[utoipa::path(
    get, path = "/admin/page-mapping", tag = "admin",
    params(LimitQuery),
    responses((status = 200, description = "Per-business mapping status"))
)]
pub async fn batch_diagnose(State(state): State<ServerState>, Query(q): Query<LimitQuery>) -> ApiResult<Vec<BatchDiagnosisEntry>> {
    let limit = q.limit.unwrap_or(service::admin::page_mapping::DEFAULT_BATCH_LIMIT);
    Ok(Json(state.services.page_mapping.batch_diagnose(limit).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFixRequest {
    pub business_ids: Vec<String>,
}

#[utoipa::path(
    post, path = "/admin/page-mapping/batch-fix", tag = "admin",
    request_body = crate::openapi::BatchFixDoc,
    responses((status = 200, description = "Success and failure counts"))
)]
pub async fn batch_fix(State(state): State<ServerState>, Json(req): Json<BatchFixRequest>) -> ApiResult<BatchFixResult> {
    Ok(Json(state.services.page_mapping.batch_fix(&req.business_ids).await?))
}

#[utoipa::path(
    get, path = "/admin/categories/analysis", tag = "admin",
    responses((status = 200, description = "Corrupted, orphaned and valid category keys"))
)]
pub async fn analyze_categories(State(state): State<ServerState>) -> ApiResult<CategoryAnalysis> {
    Ok(Json(state.services.category_cleanup.analyze().await?))
}

#[utoipa::path(
    post, path = "/admin/categories/cleanup", tag = "admin",
    responses((status = 200, description = "Cleanup report"))
)]
pub async fn cleanup_categories(State(state): State<ServerState>) -> ApiResult<CleanupReport> {
    let report = state.services.category_cleanup.cleanup().await?;
    info!(created = report.created_indexes, "category indexes rebuilt via admin api");
    Ok(Json(report))
}

pub async fn list_suggestions(State(state): State<ServerState>) -> ApiResult<Vec<CategorySuggestion>> {
    Ok(Json(state.services.categories.list_suggestions().await?))
}

#[utoipa::path(
    post, path = "/admin/zip-codes/import", tag = "admin",
    responses((status = 200, description = "Import statistics"))
)]
pub async fn import_zip_codes(State(state): State<ServerState>, Json(records): Json<Vec<ZipCodeRecord>>) -> ApiResult<ImportStats> {
    Ok(Json(state.services.zip_codes.import(records).await?))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiKeyRecord {
    pub user: String,
    pub api_key: String,
}

#[utoipa::path(get, path = "/admin/api-keys", tag = "admin", responses((status = 200, description = "OK")))]
pub async fn list_api_keys(State(state): State<ServerState>) -> ApiResult<Vec<ApiKeyRecord>> {
    let items = state
        .services
        .api_keys
        .list()
        .await?
        .into_iter()
        .map(|(user, api_key)| ApiKeyRecord { user, api_key })
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    post, path = "/admin/api-keys", tag = "admin",
    request_body = crate::openapi::ApiKeyRecordDoc,
    responses((status = 200, description = "OK"), (status = 400, description = "Bad Request"))
)]
pub async fn set_api_key(
    State(state): State<ServerState>,
    Json(payload): Json<ApiKeyRecord>,
) -> Result<Json<serde_json::Value>, JsonApiError> {
    state.services.api_keys.set(&payload.user, &payload.api_key).await?;
    Ok(Json(serde_json::json!({"ok": true})))
}

#[utoipa::path(
    delete, path = "/admin/api-keys/{user}", tag = "admin",
    params(("user" = String, Path, description = "Key owner")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_api_key(State(state): State<ServerState>, Path(user): Path<String>) -> StatusCode {
    match state.services.api_keys.delete(&user).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!(error = %e, %user, "api key delete failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
