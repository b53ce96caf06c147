use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::businesses::load_business;
use crate::errors::ServiceError;
use crate::storage::{KvError, KvStore};
use crate::{index, keys};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CorruptedKey {
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAnalysis {
    pub total_category_keys: usize,
    pub corrupted_keys: Vec<CorruptedKey>,
    pub valid_keys: Vec<String>,
    pub orphaned_keys: Vec<String>,
    pub business_categories: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub deleted_corrupted: usize,
    pub deleted_orphaned: usize,
    pub deleted_remaining: usize,
    pub created_indexes: usize,
    pub message: String,
    pub details: Vec<String>,
}

/// Finds category index keys holding the wrong value kind and rebuilds the
/// index from business records.
#[derive(Clone)]
pub struct CategoryCleanupService {
    store: Arc<dyn KvStore>,
}

impl CategoryCleanupService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    async fn index_keys(&self) -> Result<Vec<String>, ServiceError> {
        let mut found: Vec<String> = self
            .store
            .keys(&keys::category_pattern())
            .await?
            .into_iter()
            .filter(|k| !keys::is_suggestion_key(k))
            .collect();
        found.sort();
        Ok(found)
    }

    /// Category name -> ids of the businesses whose records reference it.
    async fn referenced(&self) -> Result<(BTreeMap<String, BTreeSet<String>>, usize), ServiceError> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut processed = 0;
        for id in index::members(self.store.as_ref(), keys::BUSINESSES).await? {
            let Some(b) = load_business(self.store.as_ref(), &id).await? else { continue };
            for name in b.referenced_categories() {
                map.entry(name).or_default().insert(id.clone());
            }
            processed += 1;
        }
        Ok((map, processed))
    }

    pub async fn analyze(&self) -> Result<CategoryAnalysis, ServiceError> {
        let keys = self.index_keys().await?;
        let mut analysis = CategoryAnalysis { total_category_keys: keys.len(), ..Default::default() };

        for key in keys {
            match self.store.smembers(&key).await {
                Ok(members) => {
                    if members.is_empty() {
                        analysis.orphaned_keys.push(key.clone());
                    }
                    analysis.valid_keys.push(key);
                }
                Err(e @ KvError::WrongType { .. }) => {
                    analysis.corrupted_keys.push(CorruptedKey { key, error: e.to_string() });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (referenced, _) = self.referenced().await?;
        analysis.business_categories = referenced.into_keys().collect();

        let recs = &mut analysis.recommendations;
        let corrupted = analysis.corrupted_keys.len();
        let orphaned = analysis.orphaned_keys.len();
        if corrupted > 0 {
            recs.push(format!(
                "Remove {corrupted} corrupted category keys that are causing \"t.map is not a function\" errors"
            ));
        }
        if orphaned > 0 {
            recs.push(format!("Remove {orphaned} orphaned category keys with no associated businesses"));
        }
        if !analysis.business_categories.is_empty() {
            recs.push(format!(
                "Rebuild category indexes for {} valid categories found in business data",
                analysis.business_categories.len()
            ));
        }
        if corrupted == 0 && orphaned == 0 {
            recs.push("Category data appears to be clean - no corrupted keys found".to_string());
        } else {
            recs.push("Run the cleanup process to fix all identified issues".to_string());
        }

        info!(total = analysis.total_category_keys, corrupted, orphaned, "category analysis finished");
        Ok(analysis)
    }

    /// Delete every category index key and rebuild both key forms from records.
    pub async fn cleanup(&self) -> Result<CleanupReport, ServiceError> {
        let analysis = self.analyze().await?;
        let mut details = vec![format!(
            "Found {} corrupted keys and {} orphaned keys",
            analysis.corrupted_keys.len(),
            analysis.orphaned_keys.len()
        )];

        let mut deleted_corrupted = 0;
        for c in &analysis.corrupted_keys {
            match self.store.del(&[c.key.clone()]).await {
                Ok(_) => {
                    deleted_corrupted += 1;
                    details.push(format!("Deleted corrupted key: {}", c.key));
                }
                Err(e) => details.push(format!("Error deleting {}: {e}", c.key)),
            }
        }
        let mut deleted_orphaned = 0;
        for key in &analysis.orphaned_keys {
            match self.store.del(&[key.clone()]).await {
                Ok(_) => {
                    deleted_orphaned += 1;
                    details.push(format!("Deleted orphaned key: {key}"));
                }
                Err(e) => details.push(format!("Error deleting {key}: {e}")),
            }
        }

        let mut deleted_remaining = 0;
        for key in self.index_keys().await? {
            match self.store.del(&[key.clone()]).await {
                Ok(_) => deleted_remaining += 1,
                Err(e) => details.push(format!("Error deleting {key}: {e}")),
            }
        }
        details.push(format!("Deleted {deleted_remaining} remaining category keys for fresh rebuild"));

        let (referenced, processed) = self.referenced().await?;
        details.push(format!("Processed {processed} businesses and found {} unique categories", referenced.len()));

        let mut created_indexes = 0;
        for (name, ids) in &referenced {
            let members: Vec<String> = ids.iter().cloned().collect();
            let normalized = keys::category(&keys::normalize_category_key(name));
            let named = keys::category_businesses(name);
            let mut ok = true;
            for key in [&normalized, &named] {
                if let Err(e) = self.store.sadd(key, &members).await {
                    warn!(%key, error = %e, "failed to rebuild category index");
                    details.push(format!("Error creating index for {name}: {e}"));
                    ok = false;
                }
            }
            if ok {
                created_indexes += 1;
                details.push(format!("Created index {normalized} with {} businesses", members.len()));
            }
        }

        let removed = deleted_corrupted + deleted_orphaned + deleted_remaining;
        common::metrics::CATEGORY_KEYS_REMOVED_TOTAL.inc_by(removed as u64);
        let message = format!(
            "Successfully cleaned up categories: deleted {deleted_corrupted} corrupted keys, {deleted_orphaned} orphaned keys, and {deleted_remaining} total keys, then rebuilt {created_indexes} clean category indexes"
        );
        info!(deleted_corrupted, deleted_orphaned, deleted_remaining, created_indexes, "category cleanup finished");
        Ok(CleanupReport { deleted_corrupted, deleted_orphaned, deleted_remaining, created_indexes, message, details })
    }
}
