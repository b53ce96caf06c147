use std::collections::BTreeMap;
use std::sync::Arc;

use models::{Business, CategorySelection};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::businesses::{load_business, require_business};
use crate::categories::selections_of;
use crate::codec::{decode_json, decode_string_list, encode_json, parse_flag};
use crate::errors::ServiceError;
use crate::storage::KvStore;
use crate::{index, keys, taxonomy};

pub const DEFAULT_BATCH_LIMIT: usize = 100;

/// `business:<id>:pages` as slug -> shown; values may be bools or flag strings.
pub async fn pages_of(store: &dyn KvStore, id: &str) -> Result<BTreeMap<String, bool>, ServiceError> {
    let Some(raw) = index::get_lenient(store, &keys::pages(id)).await? else { return Ok(BTreeMap::new()) };
    match decode_json::<BTreeMap<String, Value>>(&raw) {
        Some(map) => Ok(map
            .into_iter()
            .map(|(page, v)| {
                let shown = match v {
                    Value::Bool(b) => b,
                    other => parse_flag(&other.to_string()),
                };
                (page, shown)
            })
            .collect()),
        None => {
            warn!(business_id = %id, "page mappings are unreadable; treating as empty");
            Ok(BTreeMap::new())
        }
    }
}

async fn write_pages(store: &dyn KvStore, id: &str, pages: &BTreeMap<String, bool>) -> Result<(), ServiceError> {
    store.set(&keys::pages(id), &encode_json(pages)?).await?;
    Ok(())
}

fn expected_page(business: &Business) -> Option<&'static str> {
    business.category.as_deref().and_then(taxonomy::category_route)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedKeys {
    pub business_key: String,
    pub categories_key: String,
    pub pages_key: String,
    pub page_businesses_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDiagnosis {
    pub business: Business,
    pub categories: Vec<CategorySelection>,
    pub all_categories: Vec<String>,
    pub business_pages: BTreeMap<String, bool>,
    pub expected_page: Option<String>,
    pub is_correctly_mapped: bool,
    pub is_in_page_set: bool,
    pub page_businesses: u64,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub keys: InspectedKeys,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    pub business_id: String,
    pub expected_page: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDiagnosisEntry {
    pub business_id: String,
    pub business_name: String,
    pub category: String,
    pub expected_page: Option<String>,
    pub is_correctly_mapped: bool,
    pub is_in_page_set: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFixItem {
    pub business_id: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchFixResult {
    pub success: usize,
    pub failed: usize,
    pub results: Vec<BatchFixItem>,
}

/// Keeps `business:<id>:pages` and `page:<slug>:businesses` consistent with
/// each business's primary category.
#[derive(Clone)]
pub struct PageMappingService {
    store: Arc<dyn KvStore>,
}

impl PageMappingService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    /// Point the business at the page of its current primary category only.
    pub async fn sync_pages(&self, id: &str) -> Result<Option<&'static str>, ServiceError> {
        let store = self.store.as_ref();
        let business = require_business(store, id).await?;
        let expected = expected_page(&business);
        let mut pages = pages_of(store, id).await?;

        let stale: Vec<String> = pages.keys().filter(|p| Some(p.as_str()) != expected).cloned().collect();
        for page in stale {
            index::detach(store, &keys::page_businesses(&page), id).await?;
            if page == taxonomy::FINANCIAL_SERVICES {
                for spelling in taxonomy::FINANCE_CATEGORY_SPELLINGS {
                    index::detach(store, &keys::category(spelling), id).await?;
                    index::detach(store, &keys::category_businesses(spelling), id).await?;
                }
            }
            pages.remove(&page);
        }
        if let Some(slug) = expected {
            pages.insert(slug.to_string(), true);
            index::attach(store, &keys::page_businesses(slug), id).await?;
        }
        write_pages(store, id, &pages).await?;
        debug!(business_id = %id, page = ?expected, "page mapping synced");
        Ok(expected)
    }

    #[instrument(skip(self))]
    pub async fn diagnose(&self, id: &str) -> Result<PageDiagnosis, ServiceError> {
        let store = self.store.as_ref();
        let business = require_business(store, id).await?;
        let categories = selections_of(store, id).await?;
        let all_categories = index::get_lenient(store, &keys::all_categories(id))
            .await?
            .map(|raw| decode_string_list(&raw))
            .unwrap_or_default();
        let business_pages = pages_of(store, id).await?;
        let expected = expected_page(&business);

        let is_correctly_mapped = expected.map_or(false, |p| business_pages.get(p) == Some(&true));
        let (is_in_page_set, page_businesses) = match expected {
            Some(p) => {
                let key = keys::page_businesses(p);
                (store.sismember(&key, id).await?, store.scard(&key).await?)
            }
            None => (false, 0),
        };

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let primary = business.category.clone().unwrap_or_default();
        match expected {
            None => {
                issues.push(format!("Could not determine expected page for category \"{primary}\""));
                recommendations.push("Map this category to a specific page route".to_string());
            }
            Some(p) => {
                if !is_correctly_mapped {
                    issues.push(format!("Business is not mapped to the expected page \"{p}\" in its page mappings"));
                    recommendations.push(format!("Add \"{p}\" to the business's page mappings"));
                }
                if !is_in_page_set {
                    issues.push(format!("Business is not in the page:{p}:businesses set"));
                    recommendations.push(format!("Add business to the page:{p}:businesses set"));
                }
            }
        }
        if business_pages.is_empty() {
            issues.push("Business has no page mappings".to_string());
            recommendations.push("Rebuild page mappings for this business".to_string());
        }
        if all_categories.is_empty() {
            issues.push("Business has no categories in allCategories".to_string());
            recommendations.push("Update business categories".to_string());
        }

        Ok(PageDiagnosis {
            keys: InspectedKeys {
                business_key: keys::business(id),
                categories_key: keys::categories(id),
                pages_key: keys::pages(id),
                page_businesses_key: expected.map(keys::page_businesses),
            },
            business,
            categories,
            all_categories,
            business_pages,
            expected_page: expected.map(str::to_string),
            is_correctly_mapped,
            is_in_page_set,
            page_businesses,
            issues,
            recommendations,
        })
    }

    /// Add the expected page without touching other mappings.
    #[instrument(skip(self))]
    pub async fn fix(&self, id: &str) -> Result<FixOutcome, ServiceError> {
        let store = self.store.as_ref();
        let business = require_business(store, id).await?;
        let Some(expected) = expected_page(&business) else {
            return Err(ServiceError::Validation(format!(
                "Could not determine expected page for category \"{}\"",
                business.category.unwrap_or_default()
            )));
        };

        let mut actions = Vec::new();
        let mut pages = pages_of(store, id).await?;
        pages.insert(expected.to_string(), true);
        write_pages(store, id, &pages).await?;
        actions.push(format!("Added \"{expected}\" to business page mappings"));

        let set_key = keys::page_businesses(expected);
        if index::attach(store, &set_key, id).await? {
            actions.push(format!("Added business to {set_key} set"));
        } else {
            actions.push(format!("Business was already in {set_key} set"));
        }

        if expected == taxonomy::FINANCIAL_SERVICES {
            for spelling in taxonomy::FINANCE_CATEGORY_SPELLINGS {
                index::attach(store, &keys::category(spelling), id).await?;
                index::attach(store, &keys::category_businesses(spelling), id).await?;
                actions.push(format!("Added business to {} category", keys::category(spelling)));
            }
        }

        common::metrics::PAGE_MAPPINGS_FIXED_TOTAL.inc();
        info!(business_id = %id, page = expected, actions = actions.len(), "page mapping fixed");
        Ok(FixOutcome { business_id: id.to_string(), expected_page: expected.to_string(), actions })
    }

    /// Ids of every primary record key, sorted.
    pub async fn record_ids(&self) -> Result<Vec<String>, ServiceError> {
        let mut ids: Vec<String> = self
            .store
            .keys("business:*")
            .await?
            .iter()
            .filter_map(|k| keys::business_id_from_key(k))
            .map(str::to_string)
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub async fn batch_diagnose(&self, limit: usize) -> Result<Vec<BatchDiagnosisEntry>, ServiceError> {
        let limit = if limit == 0 { DEFAULT_BATCH_LIMIT } else { limit };
        let mut out = Vec::new();
        for id in self.record_ids().await?.into_iter().take(limit) {
            match self.diagnose(&id).await {
                Ok(d) => out.push(BatchDiagnosisEntry {
                    business_name: Some(d.business.business_name.clone())
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| "Unnamed Business".to_string()),
                    category: d.business.category.clone().unwrap_or_else(|| "No Category".to_string()),
                    business_id: id,
                    expected_page: d.expected_page,
                    is_correctly_mapped: d.is_correctly_mapped,
                    is_in_page_set: d.is_in_page_set,
                    issues: d.issues,
                }),
                Err(ServiceError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    pub async fn batch_fix(&self, ids: &[String]) -> Result<BatchFixResult, ServiceError> {
        let mut result = BatchFixResult::default();
        for id in ids {
            match self.fix(id).await {
                Ok(outcome) => {
                    result.success += 1;
                    result.results.push(BatchFixItem {
                        business_id: id.clone(),
                        success: true,
                        message: format!("mapped to {}", outcome.expected_page),
                    });
                }
                Err(ServiceError::Store(e)) => return Err(ServiceError::Store(e)),
                Err(e) => {
                    result.failed += 1;
                    result.results.push(BatchFixItem { business_id: id.clone(), success: false, message: e.to_string() });
                }
            }
        }
        info!(success = result.success, failed = result.failed, "batch page fix finished");
        Ok(result)
    }

    /// Case-insensitive name and category/subcategory substring filters; blank terms match all.
    pub async fn admin_search(&self, name_term: &str, category_term: &str) -> Result<Vec<Business>, ServiceError> {
        let name_term = name_term.trim().to_lowercase();
        let category_term = category_term.trim().to_lowercase();
        let mut out = Vec::new();
        for id in self.record_ids().await?.into_iter().take(DEFAULT_BATCH_LIMIT) {
            let Some(b) = load_business(self.store.as_ref(), &id).await? else { continue };
            let name_ok = name_term.is_empty() || b.business_name.to_lowercase().contains(&name_term);
            let category_ok = category_term.is_empty()
                || [&b.category, &b.subcategory]
                    .iter()
                    .any(|c| c.as_deref().unwrap_or_default().to_lowercase().contains(&category_term));
            if name_ok && category_ok {
                out.push(b);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::businesses::write_business;
    use crate::test_support::{register, selection, services};

    #[tokio::test]
    async fn diagnose_reports_missing_mapping() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let mut b = register(&svc, "Cash Co", "cash@example.com", "10001").await?;
        b.category = Some("Insurance, Finance, Debt and Sales".into());
        write_business(store.as_ref(), &b).await?;

        let d = svc.page_mapping.diagnose(&b.id).await?;
        assert_eq!(d.expected_page.as_deref(), Some("financial-services"));
        assert!(!d.is_correctly_mapped);
        assert!(!d.is_in_page_set);
        assert_eq!(d.issues.len(), 4);
        assert_eq!(d.issues.len(), d.recommendations.len());
        assert_eq!(d.keys.page_businesses_key.as_deref(), Some("page:financial-services:businesses"));
        Ok(())
    }

    #[tokio::test]
    async fn diagnose_unknown_category() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let mut b = register(&svc, "Rest", "rest@example.com", "10001").await?;
        b.category = Some("Mortuary Services".into());
        write_business(store.as_ref(), &b).await?;
        let d = svc.page_mapping.diagnose(&b.id).await?;
        assert_eq!(d.expected_page, None);
        assert!(d.issues[0].starts_with("Could not determine expected page"));
        assert!(matches!(svc.page_mapping.fix(&b.id).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn fix_adds_page_and_finance_spellings() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let mut b = register(&svc, "Cash Co", "cash@example.com", "10001").await?;
        b.category = Some("Debt Relief".into());
        write_business(store.as_ref(), &b).await?;

        let out = svc.page_mapping.fix(&b.id).await?;
        assert_eq!(out.expected_page, "financial-services");
        assert!(out.actions[1].starts_with("Added business to page:financial-services"));
        assert!(store.sismember("category:Financial Services:businesses", &b.id).await?);
        assert!(store.sismember("category:financeInsurance", &b.id).await?);

        let again = svc.page_mapping.fix(&b.id).await?;
        assert!(again.actions[1].starts_with("Business was already in"));

        let d = svc.page_mapping.diagnose(&b.id).await?;
        assert!(d.is_correctly_mapped && d.is_in_page_set);
        assert_eq!(d.page_businesses, 1);
        Ok(())
    }

    #[tokio::test]
    async fn sync_pages_drops_stale_page() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let b = register(&svc, "Switch", "s@example.com", "10001").await?;
        svc.categories.save_selections(&b.id, vec![selection("Pet Care", None)]).await?;
        svc.categories.save_selections(&b.id, vec![selection("Retail Stores", None)]).await?;
        assert!(!store.exists(&keys::page_businesses("pet-care")).await?);
        assert!(store.sismember(&keys::page_businesses("retail-stores"), &b.id).await?);
        let pages = pages_of(store.as_ref(), &b.id).await?;
        assert_eq!(pages.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn pages_accept_flag_strings() -> Result<(), anyhow::Error> {
        let (store, _svc) = services();
        store.set(&keys::pages("x"), r#""{\"pet-care\":\"true\",\"retail-stores\":0}""#).await?;
        let pages = pages_of(store.as_ref(), "x").await?;
        assert_eq!(pages.get("pet-care"), Some(&true));
        assert_eq!(pages.get("retail-stores"), Some(&false));
        Ok(())
    }

    #[tokio::test]
    async fn batch_and_search() -> Result<(), anyhow::Error> {
        let (_store, svc) = services();
        let a = register(&svc, "Happy Tails", "a@example.com", "10001").await?;
        let b = register(&svc, "Law Office", "b@example.com", "10001").await?;
        svc.categories.save_selections(&a.id, vec![selection("Pet Care", Some("Boarding"))]).await?;

        let report = svc.page_mapping.batch_diagnose(0).await?;
        assert_eq!(report.len(), 2);
        let b_entry = report.iter().find(|e| e.business_id == b.id).map(|e| e.category.clone());
        assert_eq!(b_entry.as_deref(), Some("No Category"));

        let fixed = svc.page_mapping.batch_fix(&[a.id.clone(), b.id.clone()]).await?;
        assert_eq!((fixed.success, fixed.failed), (1, 1));

        let hits = svc.page_mapping.admin_search("tails", "").await?;
        assert_eq!(hits.len(), 1);
        let hits = svc.page_mapping.admin_search("", "BOARD").await?;
        assert_eq!(hits[0].id, a.id);
        assert_eq!(svc.page_mapping.admin_search("", "").await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn diagnose_surfaces_store_errors() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let b = register(&svc, "Paws", "paws@example.com", "10001").await?;
        svc.categories.save_selections(&b.id, vec![selection("Pet Care", None)]).await?;
        store.del(&[keys::page_businesses("pet-care")]).await?;
        store.set(&keys::page_businesses("pet-care"), "corrupt").await?;
        assert!(matches!(svc.page_mapping.diagnose(&b.id).await, Err(ServiceError::Store(_))));
        Ok(())
    }
}
