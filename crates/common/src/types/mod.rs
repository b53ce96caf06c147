use serde::Serialize;

/// Body returned by `GET /health`.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    /// Active key-value backend (`memory` or `redis`).
    pub store: &'static str,
}
