use std::{collections::BTreeSet, sync::Arc};

use chrono::Utc;
use models::business::normalize_email;
use models::{Business, RegisterBusinessInput, UpdateBusinessInput};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::codec::{decode_json, decode_string_list, encode_json};
use crate::errors::ServiceError;
use crate::storage::KvStore;
use crate::{categories, index, jobs, keys, reviews, service_area, taxonomy};

/// Load `business:<id>`; undecodable records are logged and treated as absent.
pub async fn load_business(store: &dyn KvStore, id: &str) -> Result<Option<Business>, ServiceError> {
    let Some(raw) = index::get_lenient(store, &keys::business(id)).await? else { return Ok(None) };
    match decode_json::<Business>(&raw) {
        Some(mut b) => {
            if b.id.is_empty() {
                b.id = id.to_string();
            }
            Ok(Some(b))
        }
        None => {
            warn!(business_id = %id, "business record is not valid JSON; skipping");
            Ok(None)
        }
    }
}

pub async fn require_business(store: &dyn KvStore, id: &str) -> Result<Business, ServiceError> {
    load_business(store, id).await?.ok_or_else(|| ServiceError::not_found("business"))
}

pub async fn write_business(store: &dyn KvStore, business: &Business) -> Result<(), ServiceError> {
    store.set(&keys::business(&business.id), &encode_json(business)?).await?;
    Ok(())
}

/// Newest first; records without a timestamp sort last, ties by id.
pub fn sort_newest_first(list: &mut [Business]) {
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// What a purge removed.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub business_id: String,
    pub business_name: Option<String>,
    pub deleted_keys: Vec<String>,
    pub index_memberships_removed: usize,
}

/// Registration, profile and removal of business records.
#[derive(Clone)]
pub struct BusinessService {
    store: Arc<dyn KvStore>,
}

impl BusinessService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterBusinessInput) -> Result<Business, ServiceError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        let email_key = keys::business_email(&email);
        if self.store.exists(&email_key).await? {
            return Err(ServiceError::Conflict(format!("a business is already registered with {email}")));
        }

        let now = Utc::now();
        let business = Business {
            id: Uuid::new_v4().to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            business_name: input.business_name.trim().to_string(),
            zip_code: input.zip_code.trim().to_string(),
            email,
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            description: input.description.filter(|d| !d.trim().is_empty()),
            created_at: Some(now),
            updated_at: Some(now),
            ..Default::default()
        };

        write_business(self.store.as_ref(), &business).await?;
        self.store.set(&email_key, &business.id).await?;
        index::attach(self.store.as_ref(), keys::BUSINESSES, &business.id).await?;

        common::metrics::BUSINESSES_REGISTERED_TOTAL.inc();
        info!(business_id = %business.id, "business registered");
        Ok(business)
    }

    pub async fn get(&self, id: &str) -> Result<Business, ServiceError> {
        require_business(self.store.as_ref(), id).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, ServiceError> {
        Ok(self.store.exists(&keys::business_email(&normalize_email(email))).await?)
    }

    /// All members of `businesses` with a readable record, newest first.
    pub async fn list(&self) -> Result<Vec<Business>, ServiceError> {
        let ids = index::members(self.store.as_ref(), keys::BUSINESSES).await?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(b) = load_business(self.store.as_ref(), &id).await? {
                out.push(b);
            }
        }
        sort_newest_first(&mut out);
        Ok(out)
    }

    #[instrument(skip(self, input))]
    pub async fn update_profile(&self, id: &str, input: UpdateBusinessInput) -> Result<Business, ServiceError> {
        input.validate()?;
        let mut business = self.get(id).await?;

        if let Some(email) = input.email.as_deref().map(normalize_email) {
            if email != business.email {
                let new_key = keys::business_email(&email);
                match self.store.get(&new_key).await? {
                    Some(owner) if owner != business.id => {
                        return Err(ServiceError::Conflict(format!("{email} belongs to another business")));
                    }
                    _ => {}
                }
                if !business.email.is_empty() {
                    self.store.del(&[keys::business_email(&business.email)]).await?;
                }
                self.store.set(&new_key, &business.id).await?;
                business.email = email;
                business.is_email_verified = false;
            }
        }
        if let Some(v) = input.first_name { business.first_name = v.trim().to_string(); }
        if let Some(v) = input.last_name { business.last_name = v.trim().to_string(); }
        if let Some(v) = input.business_name { business.business_name = v.trim().to_string(); }
        if let Some(v) = input.zip_code { business.zip_code = v.trim().to_string(); }
        if let Some(v) = input.phone { business.phone = Some(v).filter(|p| !p.trim().is_empty()); }
        if let Some(v) = input.description { business.description = Some(v).filter(|d| !d.trim().is_empty()); }
        business.updated_at = Some(Utc::now());

        write_business(self.store.as_ref(), &business).await?;
        Ok(business)
    }

    /// Trimmed, lowercased, de-duplicated search keywords.
    pub async fn save_keywords(&self, id: &str, keywords: Vec<String>) -> Result<Vec<String>, ServiceError> {
        self.get(id).await?;
        let mut seen = BTreeSet::new();
        let cleaned: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        self.store.set(&keys::keywords(id), &encode_json(&cleaned)?).await?;
        Ok(cleaned)
    }

    pub async fn keywords(&self, id: &str) -> Result<Vec<String>, ServiceError> {
        keywords_of(self.store.as_ref(), id).await
    }

    /// Remove a business and every index entry that points at it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<PurgeReport, ServiceError> {
        let store = self.store.as_ref();
        let business = load_business(store, id).await?;
        let listed = store.sismember(keys::BUSINESSES, id).await?;
        let aux_keys = store.keys(&keys::business_pattern(id)).await?;
        if business.is_none() && !listed && aux_keys.is_empty() {
            return Err(ServiceError::not_found("business"));
        }

        let mut report = PurgeReport {
            business_id: id.to_string(),
            business_name: business.as_ref().map(|b| b.business_name.clone()),
            ..Default::default()
        };
        let mut removed = 0usize;
        let detach = |key: String| async move { index::detach(store, &key, id).await };

        if let Some(b) = &business {
            if !b.email.is_empty() {
                let email_key = keys::business_email(&b.email);
                if store.get(&email_key).await?.as_deref() == Some(id) {
                    store.del(&[email_key.clone()]).await?;
                    report.deleted_keys.push(email_key);
                }
            }
        }
        for key in [keys::BUSINESSES.to_string(), keys::NATIONWIDE_BUSINESSES.to_string()] {
            removed += detach(key).await? as usize;
        }

        let mut names: Vec<String> = categories::selected_names(store, id).await?;
        for sel in categories::selections_of(store, id).await? {
            names.push(sel.category);
        }
        if let Some(b) = &business {
            names.extend(b.referenced_categories());
        }
        let names: BTreeSet<String> = names.into_iter().filter(|n| !n.trim().is_empty()).collect();
        for name in &names {
            for key in [
                keys::category_businesses(name),
                keys::category(name),
                keys::category(&keys::normalize_category_key(name)),
            ] {
                removed += detach(key).await? as usize;
            }
        }

        let mut pages: BTreeSet<String> = crate::admin::page_mapping::pages_of(store, id).await?.into_keys().collect();
        if let Some(slug) = business.as_ref().and_then(|b| b.category.as_deref()).and_then(taxonomy::category_route) {
            pages.insert(slug.to_string());
            if slug == taxonomy::FINANCIAL_SERVICES {
                for spelling in taxonomy::FINANCE_CATEGORY_SPELLINGS {
                    removed += detach(keys::category(spelling)).await? as usize;
                    removed += detach(keys::category_businesses(spelling)).await? as usize;
                }
            }
        }
        for page in &pages {
            removed += detach(keys::page_businesses(page)).await? as usize;
        }

        let mut zips: BTreeSet<String> = service_area::stored_zips(store, id).await?.into_iter().collect();
        if let Some(zip) = business.as_ref().and_then(|b| models::zip::five_digit_zip(&b.zip_code)) {
            zips.insert(zip);
        }
        for zip in &zips {
            removed += detach(keys::zipcode_businesses(zip)).await? as usize;
        }

        report.deleted_keys.extend(reviews::purge_reviews(store, id).await?);

        let mut doomed: Vec<String> = jobs::job_ids(store, id).await?.iter().map(|j| keys::job(id, j)).collect();
        doomed.push(keys::jobs(id));
        doomed.extend(aux_keys);
        doomed.extend(store.keys(&keys::analytics_pattern(id)).await?);
        doomed.push(keys::business(id));
        let mut deleted = Vec::new();
        for key in doomed {
            if store.del(&[key.clone()]).await? > 0 {
                deleted.push(key);
            }
        }
        report.deleted_keys.extend(deleted);
        report.index_memberships_removed = removed;

        common::metrics::BUSINESSES_PURGED_TOTAL.inc();
        info!(
            business_id = %id,
            keys = report.deleted_keys.len(),
            memberships = removed,
            "business purged"
        );
        Ok(report)
    }
}

pub async fn keywords_of(store: &dyn KvStore, id: &str) -> Result<Vec<String>, ServiceError> {
    Ok(index::get_lenient(store, &keys::keywords(id))
        .await?
        .map(|raw| decode_string_list(&raw))
        .unwrap_or_default())
}
