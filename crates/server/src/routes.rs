use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::admin;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

pub mod admin_routes;
pub mod businesses;
pub mod directory;
pub mod reviews;
pub mod zip_codes;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health(axum::extract::State(state): axum::extract::State<ServerState>) -> Json<Health> {
    Json(Health { status: "ok", store: state.backend_name() })
}

pub async fn metrics() -> impl IntoResponse {
    common::metrics::encode_metrics()
}

/// Build the full application router: public, admin (API-key guarded) and docs.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/businesses", post(businesses::register))
        .route("/businesses/:id", get(businesses::get_business).put(businesses::update_business))
        .route(
            "/businesses/:id/categories",
            get(businesses::get_categories)
                .put(businesses::save_categories)
                .delete(businesses::remove_category),
        )
        .route(
            "/businesses/:id/service-area",
            get(businesses::get_service_area).put(businesses::save_service_area),
        )
        .route("/businesses/:id/keywords", get(businesses::get_keywords).put(businesses::save_keywords))
        .route("/businesses/:id/coupons", get(businesses::get_coupons).put(businesses::save_coupons))
        .route("/businesses/:id/jobs", get(businesses::list_jobs).post(businesses::create_job))
        .route("/businesses/:id/jobs/:job_id", delete(businesses::delete_job))
        .route("/businesses/:id/ad-design", get(businesses::get_ad_design).put(businesses::save_ad_design))
        .route("/businesses/:id/reviews", get(reviews::list_reviews).post(reviews::submit_review))
        .route("/businesses/:id/rating", get(reviews::get_rating))
        .route("/businesses/:id/analytics/events", post(reviews::track_event))
        .route("/categories/suggestions", post(businesses::suggest_category))
        .route("/directory/pages", get(directory::for_page))
        .route("/directory/category/:name", get(directory::by_category))
        .route("/directory/zip/:zip", get(directory::by_zip))
        .route("/directory/search", get(directory::search))
        .route("/zip-codes/:zip", get(zip_codes::get_zip))
        .route("/zip-codes/:zip/radius", get(zip_codes::radius));

    let admin = Router::new()
        .route("/admin/businesses", get(admin_routes::list_businesses))
        .route("/admin/businesses/search", get(admin_routes::search_businesses))
        .route("/admin/businesses/:id", delete(admin_routes::delete_business))
        .route("/admin/businesses/:id/reviews/:review_id", delete(admin_routes::delete_review))
        .route(
            "/admin/businesses/:id/analytics",
            get(admin_routes::business_analytics).delete(admin_routes::reset_analytics),
        )
        .route("/admin/page-mapping", get(admin_routes::batch_diagnose))
        .route("/admin/page-mapping/batch-fix", post(admin_routes::batch_fix))
        .route(
            "/admin/page-mapping/:id",
            get(admin_routes::diagnose_page_mapping).post(admin_routes::fix_page_mapping),
        )
        .route("/admin/categories/analysis", get(admin_routes::analyze_categories))
        .route("/admin/categories/cleanup", post(admin_routes::cleanup_categories))
        .route("/admin/categories/suggestions", get(admin_routes::list_suggestions))
        .route("/admin/zip-codes/import", post(admin_routes::import_zip_codes))
        .route("/admin/api-keys", get(admin_routes::list_api_keys).post(admin_routes::set_api_key))
        .route("/admin/api-keys/:user", delete(admin_routes::delete_api_key))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin::require_api_key));

    public
        .merge(admin)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
