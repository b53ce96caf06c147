use std::collections::BTreeSet;
use std::sync::Arc;

use models::zip::five_digit_zip;
use models::ServiceArea;
use tracing::{info, instrument, warn};

use crate::businesses::{load_business, require_business};
use crate::codec::{decode_json, decode_zip_list, encode_json, parse_flag};
use crate::errors::ServiceError;
use crate::storage::{KeyKind, KvStore};
use crate::{index, keys};

/// Zips under `business:<id>:zipcodes`, stored as a set or as a legacy JSON list.
async fn zip_key_members(store: &dyn KvStore, id: &str) -> Result<Vec<String>, ServiceError> {
    let key = keys::zipcodes(id);
    match store.kind(&key).await? {
        Some(KeyKind::Set) => Ok(store.smembers(&key).await?),
        Some(KeyKind::String) => Ok(store
            .get(&key)
            .await?
            .map(|raw| decode_zip_list(&raw))
            .unwrap_or_default()),
        Some(KeyKind::Hash) => {
            warn!(%key, "zip list stored as a hash; ignoring");
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

async fn stored_area(store: &dyn KvStore, id: &str) -> Result<Option<ServiceArea>, ServiceError> {
    let Some(raw) = index::get_lenient(store, &keys::service_area(id)).await? else { return Ok(None) };
    let area = decode_json::<ServiceArea>(&raw);
    if area.is_none() {
        warn!(business_id = %id, "service area JSON is unreadable");
    }
    Ok(area)
}

async fn nationwide_flag(store: &dyn KvStore, id: &str) -> Result<bool, ServiceError> {
    Ok(index::get_lenient(store, &keys::nationwide(id)).await?.map_or(false, |raw| parse_flag(&raw)))
}

/// Every zip a business is recorded against, from both the zip key and the area JSON.
pub async fn stored_zips(store: &dyn KvStore, id: &str) -> Result<Vec<String>, ServiceError> {
    let mut zips: BTreeSet<String> = zip_key_members(store, id).await?.into_iter().collect();
    if let Some(area) = stored_area(store, id).await? {
        zips.extend(area.zip_codes);
    }
    Ok(zips.into_iter().filter_map(|z| five_digit_zip(&z)).collect())
}

#[derive(Clone)]
pub struct ServiceAreaService {
    store: Arc<dyn KvStore>,
}

impl ServiceAreaService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    #[instrument(skip(self, area), fields(nationwide = area.is_nationwide))]
    pub async fn save(&self, id: &str, area: ServiceArea) -> Result<ServiceArea, ServiceError> {
        area.validate()?;
        let store = self.store.as_ref();
        require_business(store, id).await?;

        let zips = area.normalized_zips();
        let area = ServiceArea {
            zip_codes: zips.clone(),
            central_zip: area.central_zip.as_deref().and_then(five_digit_zip),
            ..area
        };

        for old in stored_zips(store, id).await?.iter().filter(|z| !zips.contains(z)) {
            index::detach(store, &keys::zipcode_businesses(old), id).await?;
        }
        for zip in &zips {
            index::attach(store, &keys::zipcode_businesses(zip), id).await?;
        }

        let zip_key = keys::zipcodes(id);
        store.del(&[zip_key.clone()]).await?;
        if !zips.is_empty() {
            store.sadd(&zip_key, &zips).await?;
        }

        if area.is_nationwide {
            store.set(&keys::nationwide(id), "true").await?;
            index::attach(store, keys::NATIONWIDE_BUSINESSES, id).await?;
        } else {
            store.del(&[keys::nationwide(id)]).await?;
            index::detach(store, keys::NATIONWIDE_BUSINESSES, id).await?;
        }
        store.set(&keys::service_area(id), &encode_json(&area)?).await?;

        info!(business_id = %id, zips = zips.len(), "service area saved");
        Ok(area)
    }

    /// The stored area, rebuilt from the zip key and flag when no JSON exists.
    pub async fn get(&self, id: &str) -> Result<ServiceArea, ServiceError> {
        let store = self.store.as_ref();
        require_business(store, id).await?;
        if let Some(area) = stored_area(store, id).await? {
            return Ok(area);
        }
        let mut zips: Vec<String> = zip_key_members(store, id).await?.iter().filter_map(|z| five_digit_zip(z)).collect();
        zips.sort();
        zips.dedup();
        Ok(ServiceArea { zip_codes: zips, is_nationwide: nationwide_flag(store, id).await?, ..Default::default() })
    }

    pub async fn is_nationwide(&self, id: &str) -> Result<bool, ServiceError> {
        if nationwide_flag(self.store.as_ref(), id).await? {
            return Ok(true);
        }
        Ok(stored_area(self.store.as_ref(), id).await?.map_or(false, |a| a.is_nationwide))
    }

    /// Nationwide, a listed service zip, or the registration zip.
    pub async fn serves(&self, id: &str, zip: &str) -> Result<bool, ServiceError> {
        let Some(zip) = five_digit_zip(zip) else { return Ok(false) };
        if self.is_nationwide(id).await? {
            return Ok(true);
        }
        if stored_zips(self.store.as_ref(), id).await?.contains(&zip) {
            return Ok(true);
        }
        Ok(load_business(self.store.as_ref(), id)
            .await?
            .and_then(|b| five_digit_zip(&b.zip_code))
            .map_or(false, |home| home == zip))
    }
}
