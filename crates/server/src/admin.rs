use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, warn};

use crate::state::ServerState;

fn query_api_key(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut it = pair.splitn(2, '=');
        match (it.next(), it.next()) {
            (Some("api_key"), Some(v)) => Some(v.to_string()),
            _ => None,
        }
    })
}

/// Middleware: require a stored admin key in `X-API-Key` (or query `api_key`).
pub async fn require_api_key(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| req.uri().query().and_then(query_api_key));

    let key = match key {
        Some(k) if !k.trim().is_empty() => k,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match state.services.api_keys.is_valid(&key).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => {
            warn!(path = %req.uri().path(), "rejected admin request with unknown api key");
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(e) => {
            error!(error = %e, "api key lookup failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
