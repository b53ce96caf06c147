use std::sync::Arc;

use service::AppServices;

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct ServerState {
    pub services: Arc<AppServices>,
}

impl ServerState {
    pub fn new(services: AppServices) -> Self { Self { services: Arc::new(services) } }

    pub fn backend_name(&self) -> &'static str { self.services.store().backend_name() }
}
