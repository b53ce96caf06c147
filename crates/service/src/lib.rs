//! Service layer for the business directory.
//! - Every operation goes through the `KvStore` trait, never a concrete backend.
//! - Index bookkeeping (category, page, zip and nationwide sets) lives here.
//! - Reuses validation and record definitions from the `models` crate.

pub mod errors;
pub mod storage;
pub mod keys;
pub mod codec;
pub mod index;
pub mod taxonomy;
pub mod pagination;
pub mod businesses;
pub mod categories;
pub mod service_area;
pub mod directory;
pub mod coupons;
pub mod jobs;
pub mod ad_design;
pub mod zip_codes;
pub mod reviews;
pub mod analytics;
pub mod admin;
#[cfg(test)]
pub mod test_support;

use std::sync::Arc;

use storage::KvStore;

/// Every service wired over one shared store.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn KvStore>,
    pub businesses: businesses::BusinessService,
    pub categories: categories::CategoryService,
    pub service_areas: service_area::ServiceAreaService,
    pub directory: directory::DirectoryService,
    pub coupons: coupons::CouponService,
    pub jobs: jobs::JobService,
    pub ad_designs: ad_design::AdDesignService,
    pub zip_codes: zip_codes::ZipCodeService,
    pub reviews: reviews::ReviewService,
    pub analytics: analytics::AnalyticsService,
    pub page_mapping: admin::PageMappingService,
    pub category_cleanup: admin::CategoryCleanupService,
    pub api_keys: admin::ApiKeyService,
}

impl AppServices {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let page_mapping = admin::PageMappingService::new(store.clone());
        let service_areas = service_area::ServiceAreaService::new(store.clone());
        let ad_designs = ad_design::AdDesignService::new(store.clone());
        let reviews = reviews::ReviewService::new(store.clone());
        Self {
            businesses: businesses::BusinessService::new(store.clone()),
            categories: categories::CategoryService::new(store.clone(), page_mapping.clone()),
            directory: directory::DirectoryService::new(
                store.clone(),
                ad_designs.clone(),
                service_areas.clone(),
                reviews.clone(),
            ),
            coupons: coupons::CouponService::new(store.clone()),
            jobs: jobs::JobService::new(store.clone()),
            zip_codes: zip_codes::ZipCodeService::new(store.clone()),
            category_cleanup: admin::CategoryCleanupService::new(store.clone()),
            api_keys: admin::ApiKeyService::new(store.clone()),
            analytics: analytics::AnalyticsService::new(store.clone()),
            reviews,
            service_areas,
            ad_designs,
            page_mapping,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> { &self.store }
}
