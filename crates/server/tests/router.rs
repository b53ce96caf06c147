use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use service::storage::MemoryStore;
use service::AppServices;
use tower::ServiceExt;

use server::routes;
use server::state::ServerState;

const ADMIN_KEY: &str = "test-admin-key";

async fn build_app() -> anyhow::Result<Router> {
    let services = AppServices::new(MemoryStore::new());
    services.api_keys.set("tester", ADMIN_KEY).await?;
    Ok(routes::build_router(ServerState::new(services), tower_http::cors::CorsLayer::very_permissive()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if uri.starts_with("/admin") {
        builder = builder.header("X-API-Key", ADMIN_KEY);
    }
    let req = match body {
        Some(v) => builder.header("content-type", "application/json").body(Body::from(serde_json::to_vec(&v)?))?,
        None => builder.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, value))
}

async fn register(app: &Router, name: &str, email: &str, zip: &str) -> anyhow::Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/businesses",
        Some(json!({"firstName": "Ada", "lastName": "Lovelace", "businessName": name, "email": email, "zipCode": zip})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok(body["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn health_reports_backend() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "store": "memory"}));
    Ok(())
}

#[tokio::test]
async fn registration_errors_map_to_status_codes() -> anyhow::Result<()> {
    let app = build_app().await?;
    register(&app, "Shop", "shop@example.com", "10001").await?;

    let (status, body) = send(
        &app,
        "POST",
        "/businesses",
        Some(json!({"firstName": "A", "lastName": "B", "businessName": "Dup", "email": "SHOP@example.com", "zipCode": "10001"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, body) = send(
        &app,
        "POST",
        "/businesses",
        Some(json!({"firstName": "A", "lastName": "B", "businessName": "Bad", "email": "bad@example.com", "zipCode": "12"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("zip"));

    let (status, _) = send(&app, "GET", "/businesses/missing", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn categories_drive_directory_pages() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = register(&app, "Happy Tails", "tails@example.com", "10001").await?;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/businesses/{id}/categories"),
        Some(json!([{"category": "Pet Care", "subcategory": "Grooming"}])),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/directory/pages?path=/pet-care", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["business"]["id"], id.as_str());
    assert_eq!(body[0]["displayName"], "Happy Tails");

    let (status, body) = send(&app, "GET", "/directory/category/Pet%20Care?zip=10001", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0), "no service area saved yet");

    let (status, _) = send(&app, "PUT", &format!("/businesses/{id}/service-area"), Some(json!({"zipCodes": ["10001"]}))).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/directory/category/Pet%20Care?zip=10001", None).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "GET", "/directory/pages?path=/unknown", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn jobs_and_coupons_round_trip() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = register(&app, "Diner", "diner@example.com", "10001").await?;

    let (status, job) = send(
        &app,
        "POST",
        &format!("/businesses/{id}/jobs"),
        Some(json!({"jobTitle": "Cook", "payType": "salary", "salaryMin": "40000", "salaryMax": "50000"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let (_, cards) = send(&app, "GET", &format!("/businesses/{id}/jobs?view=card"), None).await?;
    assert_eq!(cards[0]["salary"], "$40000-$50000/yr");

    let job_id = job["id"].as_str().unwrap_or_default();
    let (status, _) = send(&app, "DELETE", &format!("/businesses/{id}/jobs/{job_id}"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/businesses/{id}/jobs/{job_id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, coupons) = send(&app, "PUT", &format!("/businesses/{id}/coupons"), Some(json!([{"title": "2 for 1"}]))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(coupons[0]["id"].as_str().map_or(false, |s| !s.is_empty()));
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_key() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = Request::builder().uri("/admin/api-keys").body(Body::empty())?;
    assert_eq!(app.clone().oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder().uri(format!("/admin/api-keys?api_key={ADMIN_KEY}")).body(Body::empty())?;
    assert_eq!(app.clone().oneshot(req).await?.status(), StatusCode::OK);

    let req = Request::builder().uri("/admin/api-keys").header("X-API-Key", "wrong").body(Body::empty())?;
    assert_eq!(app.clone().oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_page_mapping_and_purge() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = register(&app, "Ledger", "ledger@example.com", "10001").await?;
    send(&app, "PUT", &format!("/businesses/{id}/categories"), Some(json!([{"category": "Insurance, Finance, Debt and Sales"}]))).await?;

    let (status, diag) = send(&app, "GET", &format!("/admin/page-mapping/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(diag["expectedPage"], "financial-services");
    assert_eq!(diag["isCorrectlyMapped"], true);

    let (status, fixed) = send(&app, "POST", "/admin/page-mapping/batch-fix", Some(json!({"businessIds": [id, "ghost"]}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fixed["success"], 1);
    assert_eq!(fixed["failed"], 1);

    let (_, listed) = send(&app, "GET", "/admin/businesses?perPage=5", None).await?;
    assert_eq!(listed["total"], 1);

    let (status, report) = send(&app, "DELETE", &format!("/admin/businesses/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["businessName"], "Ledger");
    let (status, _) = send(&app, "GET", &format!("/businesses/{id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn zip_import_and_radius() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, stats) = send(
        &app,
        "POST",
        "/admin/zip-codes/import",
        Some(json!([
            {"zip": "10001", "city": "New York", "state": "NY", "latitude": 40.7506, "longitude": -73.9972},
            {"zip": "10002", "city": "New York", "state": "NY", "latitude": 40.7157, "longitude": -73.9863},
            {"zip": "bad", "city": "X", "state": "NY", "latitude": 0.0, "longitude": 0.0}
        ])),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({"total": 3, "imported": 2, "skipped": 1, "errors": 0}));

    let (status, near) = send(&app, "GET", "/zip-codes/10001/radius?miles=5", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(near[0]["zip"], "10001");
    assert_eq!(near.as_array().map(Vec::len), Some(2));

    let (status, _) = send(&app, "GET", "/zip-codes/99999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn reviews_feed_rating_and_listing() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = register(&app, "Happy Tails", "tails@example.com", "10001").await?;
    send(&app, "PUT", &format!("/businesses/{id}/categories"), Some(json!([{"category": "Pet Care"}]))).await?;
    let ratings = |stars: u8| {
        json!({"serviceQuality": stars, "costTransparency": stars, "communication": stars,
               "expertise": stars, "dependability": stars, "professionalism": stars})
    };

    let (status, first) = send(
        &app,
        "POST",
        &format!("/businesses/{id}/reviews"),
        Some(json!({"userId": "u1", "userName": "Ada L.", "ratings": ratings(5), "comment": "Lovely"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["overallRating"], 5.0);
    let (status, _) =
        send(&app, "POST", &format!("/businesses/{id}/reviews"), Some(json!({"userName": "Bo", "ratings": ratings(2)}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) =
        send(&app, "POST", &format!("/businesses/{id}/reviews"), Some(json!({"userName": "Cy", "ratings": ratings(7)}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, rating) = send(&app, "GET", &format!("/businesses/{id}/rating"), None).await?;
    assert_eq!(rating, json!({"rating": 3.5, "reviewCount": 2}));
    let (_, listings) = send(&app, "GET", "/directory/pages?path=/pet-care", None).await?;
    assert_eq!(listings[0]["rating"], 3.5);
    assert_eq!(listings[0]["reviewCount"], 2);

    let review_id = first["id"].as_str().unwrap_or_default().to_string();
    let (status, rating) = send(&app, "DELETE", &format!("/admin/businesses/{id}/reviews/{review_id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating, json!({"rating": 2.0, "reviewCount": 1}));
    let (_, reviews) = send(&app, "GET", &format!("/businesses/{id}/reviews"), None).await?;
    assert_eq!(reviews.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn analytics_events_are_counted() -> anyhow::Result<()> {
    let app = build_app().await?;
    let id = register(&app, "Happy Tails", "tails@example.com", "10001").await?;
    for kind in ["profile_view", "profile_view", "phone_click"] {
        let (status, _) =
            send(&app, "POST", &format!("/businesses/{id}/analytics/events"), Some(json!({"eventType": kind, "zipCode": "10001"})))
                .await?;
        assert_eq!(status, StatusCode::ACCEPTED);
    }
    let (status, _) =
        send(&app, "POST", &format!("/businesses/{id}/analytics/events"), Some(json!({"eventType": "hover"}))).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, summary) = send(&app, "GET", &format!("/admin/businesses/{id}/analytics"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalEvents"], 3);
    assert_eq!(summary["profileViews"], 2);
    assert_eq!(summary["zipCodeAnalytics"][0]["count"], 3);

    let (status, _) = send(&app, "DELETE", &format!("/admin/businesses/{id}/analytics"), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, summary) = send(&app, "GET", &format!("/admin/businesses/{id}/analytics"), None).await?;
    assert_eq!(summary["totalEvents"], 0);
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, doc) = send(&app, "GET", "/api-docs/openapi.json", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/directory/search"].is_object());
    assert!(doc["paths"]["/businesses/{id}/reviews"]["post"].is_object());
    Ok(())
}
