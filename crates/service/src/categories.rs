use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use models::{CategorySelection, CategorySuggestion, CategorySuggestionInput};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::admin::page_mapping::PageMappingService;
use crate::businesses::{require_business, write_business};
use crate::codec::{decode_json, decode_string_list, encode_json};
use crate::errors::ServiceError;
use crate::storage::KvStore;
use crate::{index, keys};

/// Category names recorded in `selectedCategories`.
pub async fn selected_names(store: &dyn KvStore, id: &str) -> Result<Vec<String>, ServiceError> {
    Ok(index::get_lenient(store, &keys::selected_categories(id))
        .await?
        .map(|raw| decode_string_list(&raw))
        .unwrap_or_default())
}

/// Full selections from `business:<id>:categories`; unreadable data yields none.
pub async fn selections_of(store: &dyn KvStore, id: &str) -> Result<Vec<CategorySelection>, ServiceError> {
    let Some(raw) = index::get_lenient(store, &keys::categories(id)).await? else { return Ok(Vec::new()) };
    match decode_json::<Vec<CategorySelection>>(&raw) {
        Some(list) => Ok(list),
        None => {
            warn!(business_id = %id, "stored category selections are unreadable");
            Ok(Vec::new())
        }
    }
}

/// Every index key a category name can be listed under: the selection set
/// plus the bare and normalized sets written by page repair and cleanup.
fn category_index_keys(name: &str) -> [String; 3] {
    [
        keys::category_businesses(name),
        keys::category(name),
        keys::category(&keys::normalize_category_key(name)),
    ]
}

fn distinct<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn KvStore>,
    pages: PageMappingService,
}

impl CategoryService {
    pub fn new(store: Arc<dyn KvStore>, pages: PageMappingService) -> Self { Self { store, pages } }

    pub async fn selections(&self, id: &str) -> Result<Vec<CategorySelection>, ServiceError> {
        require_business(self.store.as_ref(), id).await?;
        selections_of(self.store.as_ref(), id).await
    }

    /// Replace a business's category selections and move its index memberships.
    #[instrument(skip(self, selections), fields(count = selections.len()))]
    pub async fn save_selections(
        &self,
        id: &str,
        selections: Vec<CategorySelection>,
    ) -> Result<Vec<CategorySelection>, ServiceError> {
        if selections.is_empty() {
            return Err(ServiceError::Validation("at least one category must be selected".into()));
        }
        let selections: Vec<CategorySelection> = selections
            .into_iter()
            .filter(|s| !s.category.trim().is_empty())
            .map(|mut s| {
                s.category = s.category.trim().to_string();
                s.subcategory = s.subcategory.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
                s.full_path = Some(s.path());
                s
            })
            .collect();
        if selections.is_empty() {
            return Err(ServiceError::Validation("every selection is missing a category".into()));
        }
        self.write_selections(id, selections).await
    }

    /// Drop the selection with `full_path`; the last one removed clears all category state.
    pub async fn remove_selection(&self, id: &str, full_path: &str) -> Result<Vec<CategorySelection>, ServiceError> {
        let current = self.selections(id).await?;
        let before = current.len();
        let remaining: Vec<CategorySelection> = current.into_iter().filter(|s| s.path() != full_path).collect();
        if remaining.len() == before {
            return Err(ServiceError::not_found("category selection"));
        }
        self.write_selections(id, remaining).await
    }

    async fn write_selections(
        &self,
        id: &str,
        selections: Vec<CategorySelection>,
    ) -> Result<Vec<CategorySelection>, ServiceError> {
        let store = self.store.as_ref();
        let mut business = require_business(store, id).await?;

        let names = distinct(selections.iter().map(|s| s.category.clone()));
        let subcategories = distinct(selections.iter().filter_map(|s| s.subcategory.clone()));

        let previous = distinct(
            selected_names(store, id)
                .await?
                .into_iter()
                .chain(business.referenced_categories()),
        );
        let current: Vec<&String> = names.iter().chain(subcategories.iter()).collect();
        let keep: BTreeSet<String> = current.iter().flat_map(|n| category_index_keys(n)).collect();
        for old in previous.iter().filter(|p| !current.contains(p)) {
            for key in category_index_keys(old) {
                if !keep.contains(&key) {
                    index::detach(store, &key, id).await?;
                }
            }
        }
        for name in &names {
            index::attach(store, &keys::category_businesses(name), id).await?;
        }

        if selections.is_empty() {
            store
                .del(&[
                    keys::selected_categories(id),
                    keys::categories(id),
                    keys::all_categories(id),
                    keys::all_subcategories(id),
                ])
                .await?;
        } else {
            store.set(&keys::selected_categories(id), &encode_json(&names)?).await?;
            store.set(&keys::categories(id), &encode_json(&selections)?).await?;
            store.set(&keys::all_categories(id), &encode_json(&names)?).await?;
            store.set(&keys::all_subcategories(id), &encode_json(&subcategories)?).await?;
        }

        business.category = names.first().cloned();
        business.subcategory = selections.first().and_then(|s| s.subcategory.clone());
        business.categories_count = names.len();
        business.all_categories = names;
        business.all_subcategories = subcategories;
        business.updated_at = Some(Utc::now());
        write_business(store, &business).await?;

        self.pages.sync_pages(id).await?;
        info!(business_id = %id, categories = business.categories_count, "category selections saved");
        Ok(selections)
    }

    pub async fn suggest(&self, input: CategorySuggestionInput) -> Result<CategorySuggestion, ServiceError> {
        input.validate()?;
        let suggestion = CategorySuggestion {
            id: Uuid::new_v4().to_string(),
            business_id: input.business_id.filter(|b| !b.trim().is_empty()),
            category: input.category.trim().to_string(),
            subcategory: input.subcategory.trim().to_string(),
            reason: input.reason.trim().to_string(),
            status: "pending".to_string(),
            created_at: Some(Utc::now()),
        };
        let mut fields = vec![
            ("id".to_string(), suggestion.id.clone()),
            ("category".to_string(), suggestion.category.clone()),
            ("subcategory".to_string(), suggestion.subcategory.clone()),
            ("reason".to_string(), suggestion.reason.clone()),
            ("status".to_string(), suggestion.status.clone()),
            ("createdAt".to_string(), Utc::now().to_rfc3339()),
        ];
        if let Some(b) = &suggestion.business_id {
            fields.push(("businessId".to_string(), b.clone()));
        }
        self.store.hset(&keys::category_suggestion(&suggestion.id), &fields).await?;
        index::attach(self.store.as_ref(), keys::CATEGORY_SUGGESTIONS, &suggestion.id).await?;
        info!(suggestion_id = %suggestion.id, category = %suggestion.category, "category suggested");
        Ok(suggestion)
    }

    /// Newest first.
    pub async fn list_suggestions(&self) -> Result<Vec<CategorySuggestion>, ServiceError> {
        let mut out = Vec::new();
        for id in index::members(self.store.as_ref(), keys::CATEGORY_SUGGESTIONS).await? {
            let mut h = self.store.hgetall(&keys::category_suggestion(&id)).await?;
            if h.is_empty() {
                continue;
            }
            let mut take = |k: &str| h.remove(k).unwrap_or_default();
            out.push(CategorySuggestion {
                id: id.clone(),
                category: take("category"),
                subcategory: take("subcategory"),
                reason: take("reason"),
                status: take("status"),
                business_id: Some(take("businessId")).filter(|b| !b.is_empty()),
                created_at: chrono::DateTime::parse_from_rfc3339(&take("createdAt"))
                    .ok()
                    .map(|t| t.with_timezone(&Utc)),
            });
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}
