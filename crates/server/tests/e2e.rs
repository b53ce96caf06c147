use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use configs::{AppConfig, StoreConfig};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::{routes, startup};
use service::storage::{KvStore, MemoryStore};

const BOOTSTRAP_KEY: &str = "e2e-bootstrap";

struct TestApp {
    base_url: String,
    snapshot: PathBuf,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let snapshot = std::env::temp_dir().join(format!("directory-e2e-{}/store.json", Uuid::new_v4()));
    let cfg = AppConfig {
        store: StoreConfig {
            snapshot_path: Some(snapshot.display().to_string()),
            bootstrap_admin_key: Some(BOOTSTRAP_KEY.into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let state = startup::build_state(&cfg).await?;

    let app: Router = routes::build_router(state, CorsLayer::very_permissive());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, snapshot })
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_bootstrap_key_unlocks_admin() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/admin/api-keys", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/admin/api-keys", app.base_url))
        .header("X-API-Key", BOOTSTRAP_KEY)
        .json(&json!({"user": "ops", "api_key": "ops-key"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let keys: Value = client
        .get(format!("{}/admin/api-keys?api_key=ops-key", app.base_url))
        .send()
        .await?
        .json()
        .await?;
    let users: Vec<&str> = keys.as_array().into_iter().flatten().filter_map(|k| k["user"].as_str()).collect();
    assert_eq!(users, vec!["bootstrap", "ops"]);
    Ok(())
}

#[tokio::test]
async fn e2e_registration_survives_restart() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/businesses", app.base_url))
        .json(&json!({
            "firstName": "Grace",
            "lastName": "Hopper",
            "businessName": "Compile Cafe",
            "email": "grace@example.com",
            "zipCode": "02139"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .put(format!("{}/businesses/{}/keywords", app.base_url, id))
        .json(&json!(["Espresso", "espresso ", "Pastry"]))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = client
        .get(format!("{}/directory/search?q=pastry&zip=02139", app.base_url))
        .send()
        .await?;
    let hits: Value = res.json().await?;
    assert_eq!(hits[0]["business"]["id"], id.as_str());

    let reopened = MemoryStore::with_snapshot(app.snapshot.clone()).await?;
    assert!(reopened.sismember("businesses", &id).await?);
    Ok(())
}
