use utoipa::OpenApi;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub store: String }

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBusinessDoc {
    pub first_name: String,
    pub last_name: String,
    pub business_name: String,
    pub zip_code: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFixDoc { pub business_ids: Vec<String> }

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRatingsDoc {
    pub service_quality: f64,
    pub cost_transparency: f64,
    pub communication: f64,
    pub expertise: f64,
    pub dependability: f64,
    pub professionalism: f64,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmissionDoc {
    pub user_id: Option<String>,
    pub user_name: String,
    pub ratings: ReviewRatingsDoc,
    pub comment: Option<String>,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEventDoc {
    /// `profile_view`, `contact_click`, `website_click` or `phone_click`.
    pub event_type: String,
    pub zip_code: Option<String>,
    pub timestamp: Option<i64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
}

#[derive(ToSchema)]
pub struct ApiKeyRecordDoc { pub user: String, pub api_key: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::businesses::register,
        crate::routes::businesses::get_business,
        crate::routes::businesses::update_business,
        crate::routes::businesses::save_categories,
        crate::routes::businesses::remove_category,
        crate::routes::businesses::list_jobs,
        crate::routes::businesses::create_job,
        crate::routes::businesses::save_ad_design,
        crate::routes::businesses::suggest_category,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::submit_review,
        crate::routes::reviews::get_rating,
        crate::routes::reviews::track_event,
        crate::routes::directory::for_page,
        crate::routes::directory::by_category,
        crate::routes::directory::by_zip,
        crate::routes::directory::search,
        crate::routes::zip_codes::get_zip,
        crate::routes::zip_codes::radius,
        crate::routes::admin_routes::list_businesses,
        crate::routes::admin_routes::search_businesses,
        crate::routes::admin_routes::delete_business,
        crate::routes::admin_routes::delete_review,
        crate::routes::admin_routes::business_analytics,
        crate::routes::admin_routes::reset_analytics,
        crate::routes::admin_routes::diagnose_page_mapping,
        crate::routes::admin_routes::fix_page_mapping,
        crate::routes::admin_routes::batch_diagnose,
        crate::routes::admin_routes::batch_fix,
        crate::routes::admin_routes::analyze_categories,
        crate::routes::admin_routes::cleanup_categories,
        crate::routes::admin_routes::import_zip_codes,
        crate::routes::admin_routes::list_api_keys,
        crate::routes::admin_routes::set_api_key,
        crate::routes::admin_routes::delete_api_key,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterBusinessDoc,
            BatchFixDoc,
            ReviewRatingsDoc,
            ReviewSubmissionDoc,
            AnalyticsEventDoc,
            ApiKeyRecordDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "businesses"),
        (name = "categories"),
        (name = "jobs"),
        (name = "reviews"),
        (name = "analytics"),
        (name = "directory"),
        (name = "zip-codes"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
