//! End-user discovery: listings by landing page, category, zip and keyword.

use std::collections::BTreeSet;
use std::sync::Arc;

use models::zip::five_digit_zip;
use models::Business;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::ad_design::AdDesignService;
use crate::businesses::{keywords_of, load_business};
use crate::errors::ServiceError;
use crate::reviews::ReviewService;
use crate::service_area::ServiceAreaService;
use crate::storage::KvStore;
use crate::{index, keys, taxonomy};

const UNNAMED: &str = "Unnamed Business";

/// A business as shown on a directory card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub business: Business,
    pub display_name: String,
    pub display_location: Option<String>,
    pub phone: Option<String>,
    pub subcategories: Vec<String>,
    /// From the cached review aggregates.
    pub rating: f64,
    pub review_count: u64,
}

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn KvStore>,
    ad_designs: AdDesignService,
    service_areas: ServiceAreaService,
    reviews: ReviewService,
}

impl DirectoryService {
    pub fn new(
        store: Arc<dyn KvStore>,
        ad_designs: AdDesignService,
        service_areas: ServiceAreaService,
        reviews: ReviewService,
    ) -> Self {
        Self { store, ad_designs, service_areas, reviews }
    }

    /// Businesses on a landing page: the page's category set plus the page set.
    #[instrument(skip(self))]
    pub async fn for_page(&self, path: &str) -> Result<Vec<Listing>, ServiceError> {
        let category = taxonomy::category_for_page(path).ok_or_else(|| ServiceError::not_found("page"))?;
        let store = self.store.as_ref();
        let mut ids: BTreeSet<String> = index::members(store, &keys::category_businesses(category)).await?.into_iter().collect();
        ids.extend(index::members(store, &keys::page_businesses(path.trim().to_lowercase().as_str())).await?);
        common::metrics::DIRECTORY_LOOKUPS_TOTAL.with_label_values(&["page"]).inc();
        self.listings(ids).await
    }

    pub async fn by_category(&self, name: &str) -> Result<Vec<Listing>, ServiceError> {
        let ids = self.category_ids(name).await?;
        common::metrics::DIRECTORY_LOOKUPS_TOTAL.with_label_values(&["category"]).inc();
        self.listings(ids).await
    }

    pub async fn by_zip(&self, zip: &str) -> Result<Vec<Listing>, ServiceError> {
        let ids = self.zip_ids(zip).await?;
        common::metrics::DIRECTORY_LOOKUPS_TOTAL.with_label_values(&["zip"]).inc();
        self.listings(ids).await
    }

    pub async fn by_category_and_zip(&self, name: &str, zip: &str) -> Result<Vec<Listing>, ServiceError> {
        let in_category = self.category_ids(name).await?;
        let in_zip = self.zip_ids(zip).await?;
        let ids: BTreeSet<String> = in_category.intersection(&in_zip).cloned().collect();
        common::metrics::DIRECTORY_LOOKUPS_TOTAL.with_label_values(&["category_zip"]).inc();
        self.listings(ids).await
    }

    /// Businesses serving `zip` whose keywords, name, category or description
    /// contain any whitespace-separated term of `query`.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, zip: &str) -> Result<Vec<Listing>, ServiceError> {
        if query.trim().is_empty() || zip.trim().is_empty() {
            return Err(ServiceError::Validation("search needs both a query and a zip code".into()));
        }
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let store = self.store.as_ref();
        let mut hits = BTreeSet::new();
        for id in index::members(store, keys::BUSINESSES).await? {
            let Some(b) = load_business(store, &id).await? else { continue };
            if !self.service_areas.serves(&id, zip).await? {
                continue;
            }
            let haystack = [
                keywords_of(store, &id).await?.join(" "),
                b.business_name.clone(),
                b.category.clone().unwrap_or_default(),
                b.description.clone().unwrap_or_default(),
            ]
            .join(" ")
            .to_lowercase();
            if terms.iter().any(|t| haystack.contains(t.as_str())) {
                hits.insert(id);
            }
        }
        common::metrics::DIRECTORY_LOOKUPS_TOTAL.with_label_values(&["search"]).inc();
        let mut out = self.listings(hits).await?;
        out.sort_by(|a, b| a.business.business_name.to_lowercase().cmp(&b.business.business_name.to_lowercase()));
        Ok(out)
    }

    async fn category_ids(&self, name: &str) -> Result<BTreeSet<String>, ServiceError> {
        let store = self.store.as_ref();
        let mut ids = BTreeSet::new();
        for variant in taxonomy::category_lookup_variants(name.trim()) {
            ids.extend(index::members(store, &keys::category(&variant)).await?);
            ids.extend(index::members(store, &keys::category_businesses(&variant)).await?);
        }
        Ok(ids)
    }

    async fn zip_ids(&self, zip: &str) -> Result<BTreeSet<String>, ServiceError> {
        let zip = five_digit_zip(zip).ok_or_else(|| ServiceError::Validation(format!("invalid zip code: {zip:?}")))?;
        let store = self.store.as_ref();
        let mut ids: BTreeSet<String> = index::members(store, &keys::zipcode_businesses(&zip)).await?.into_iter().collect();
        ids.extend(index::members(store, keys::NATIONWIDE_BUSINESSES).await?);
        Ok(ids)
    }

    async fn listings(&self, ids: BTreeSet<String>) -> Result<Vec<Listing>, ServiceError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(business) = load_business(self.store.as_ref(), &id).await? else {
                debug!(business_id = %id, "indexed business has no readable record");
                continue;
            };
            out.push(self.listing(business).await?);
        }
        Ok(out)
    }

    async fn listing(&self, business: Business) -> Result<Listing, ServiceError> {
        let info = self.ad_designs.business_info(&business.id).await?.unwrap_or_default();
        let display_name = [info.business_name.trim(), business.business_name.trim()]
            .into_iter()
            .find(|n| !n.is_empty())
            .unwrap_or(UNNAMED)
            .to_string();
        let phone = Some(info.phone.trim().to_string())
            .filter(|p| !p.is_empty())
            .or_else(|| business.phone.clone());
        let rating = self.reviews.rating(&business.id).await?;
        Ok(Listing {
            rating: rating.rating,
            review_count: rating.review_count,
            display_location: info.display_location(&business.zip_code),
            subcategories: business.all_subcategories.clone(),
            display_name,
            phone,
            business,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::businesses::write_business;
    use crate::test_support::{register, selection, services};
    use models::{AdDesign, BusinessInfo, ServiceArea};

    #[tokio::test]
    async fn page_lookup_uses_category_and_page_sets() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let a = register(&svc, "Happy Tails", "a@example.com", "10001").await?;
        svc.categories.save_selections(&a.id, vec![selection("Pet Care", Some("Grooming"))]).await?;
        let b = register(&svc, "Paw Patrol", "b@example.com", "10001").await?;
        store.sadd(&keys::page_businesses("pet-care"), &[b.id.clone()]).await?;

        let listings = svc.directory.for_page("/pet-care").await?;
        assert_eq!(listings.len(), 2);
        let tails = listings.iter().find(|l| l.business.id == a.id).map(|l| l.subcategories.clone());
        assert_eq!(tails, Some(vec!["Grooming".to_string()]));

        assert!(matches!(svc.directory.for_page("/nowhere").await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn category_lookup_covers_spellings() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let a = register(&svc, "Rest", "a@example.com", "10001").await?;
        let b = register(&svc, "Peace", "b@example.com", "10001").await?;
        store.sadd(&keys::category("Mortuary Services"), &[a.id.clone()]).await?;
        store.sadd(&keys::category_businesses("funeral-services"), &[b.id.clone()]).await?;
        store.set(&keys::category_businesses("Mortuary Services"), "\"corrupt\"").await?;

        let found = svc.directory.by_category("funeral-services").await?;
        assert_eq!(found.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn zip_lookup_includes_nationwide() -> Result<(), anyhow::Error> {
        let (_store, svc) = services();
        let local = register(&svc, "Local", "l@example.com", "10001").await?;
        let national = register(&svc, "National", "n@example.com", "90210").await?;
        svc.service_areas.save(&local.id, ServiceArea { zip_codes: vec!["10001".into()], ..Default::default() }).await?;
        svc.service_areas.save(&national.id, ServiceArea { is_nationwide: true, ..Default::default() }).await?;
        svc.categories.save_selections(&local.id, vec![selection("Pet Care", None)]).await?;

        assert_eq!(svc.directory.by_zip("10001").await?.len(), 2);
        assert_eq!(svc.directory.by_zip("30301").await?.len(), 1);
        let both = svc.directory.by_category_and_zip("Pet Care", "10001").await?;
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].business.id, local.id);
        assert!(matches!(svc.directory.by_zip("abc").await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn search_matches_terms_within_zip() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let groom = register(&svc, "Zed Grooming", "g@example.com", "10001").await?;
        let walk = register(&svc, "Able Walkers", "w@example.com", "10001").await?;
        let far = register(&svc, "Far Grooming", "f@example.com", "94105").await?;
        svc.businesses.save_keywords(&walk.id, vec!["dog".into()]).await?;
        let mut described = svc.businesses.get(&groom.id).await?;
        described.description = Some("We wash every DOG".into());
        write_business(store.as_ref(), &described).await?;

        let hits = svc.directory.search("Dog", "10001").await?;
        let names: Vec<&str> = hits.iter().map(|l| l.business.business_name.as_str()).collect();
        assert_eq!(names, vec!["Able Walkers", "Zed Grooming"]);
        assert!(svc.directory.search("grooming", "10001").await?.iter().all(|l| l.business.id != far.id));
        assert!(matches!(svc.directory.search(" ", "10001").await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn listing_prefers_ad_design_details() -> Result<(), anyhow::Error> {
        let (_store, svc) = services();
        let b = register(&svc, "Plain Name", "p@example.com", "10001").await?;
        svc.categories.save_selections(&b.id, vec![selection("Retail Stores", None)]).await?;
        let info = BusinessInfo { business_name: "Fancy Name".into(), city: "Austin".into(), state: "TX".into(), phone: "555-0100".into(), ..Default::default() };
        svc.ad_designs.save(&b.id, AdDesign { business_info: info, ..Default::default() }).await?;

        let listing = &svc.directory.by_category("Retail Stores").await?[0];
        assert_eq!(listing.display_name, "Fancy Name");
        assert_eq!(listing.display_location.as_deref(), Some("Austin, TX"));
        assert_eq!(listing.phone.as_deref(), Some("555-0100"));
        assert_eq!((listing.rating, listing.review_count), (0.0, 0));
        Ok(())
    }

    #[tokio::test]
    async fn listing_rating_comes_from_review_aggregates() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let b = register(&svc, "Happy Tails", "t@example.com", "10001").await?;
        svc.categories.save_selections(&b.id, vec![selection("Pet Care", None)]).await?;
        let submit = |stars: f64| models::ReviewSubmission {
            user_id: String::new(),
            user_name: "Sam P.".into(),
            ratings: models::ReviewRatings::uniform(stars),
            comment: String::new(),
        };
        svc.reviews.submit(&b.id, submit(5.0)).await?;
        svc.reviews.submit(&b.id, submit(4.0)).await?;
        svc.reviews.submit(&b.id, submit(4.0)).await?;

        let listing = &svc.directory.by_category("Pet Care").await?[0];
        assert_eq!((listing.rating, listing.review_count), (4.3, 3));

        store.set(&keys::rating(&b.id), "3.9").await?;
        let listing = &svc.directory.for_page("/pet-care").await?[0];
        assert_eq!((listing.rating, listing.review_count), (3.9, 3));
        Ok(())
    }
}
