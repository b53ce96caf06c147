#![cfg(test)]
use std::sync::Arc;

use models::{Business, CategorySelection, RegisterBusinessInput};

use crate::errors::ServiceError;
use crate::storage::MemoryStore;
use crate::AppServices;

/// Fresh in-memory store with every service wired over it.
pub fn services() -> (Arc<MemoryStore>, AppServices) {
    let store = MemoryStore::new();
    let services = AppServices::new(store.clone());
    (store, services)
}

pub async fn register(svc: &AppServices, name: &str, email: &str, zip: &str) -> Result<Business, ServiceError> {
    svc.businesses
        .register(RegisterBusinessInput {
            first_name: "Test".into(),
            last_name: "Owner".into(),
            business_name: name.into(),
            zip_code: zip.into(),
            email: email.into(),
            phone: None,
            description: None,
        })
        .await
}

pub fn selection(category: &str, subcategory: Option<&str>) -> CategorySelection {
    CategorySelection { category: category.into(), subcategory: subcategory.map(str::to_string), full_path: None }
}
