//! Operator tooling: page-mapping repair, category index cleanup and the API
//! keys that guard the admin routes.

pub mod api_keys;
pub mod category_cleanup;
pub mod page_mapping;

pub use api_keys::ApiKeyService;
pub use category_cleanup::CategoryCleanupService;
pub use page_mapping::PageMappingService;
