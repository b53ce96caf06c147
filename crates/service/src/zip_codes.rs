//! Reference data for US zip codes and radius lookups over it.

use std::sync::Arc;

use models::zip::{five_digit_zip, is_valid_zip};
use models::{ImportStats, ZipCodeRecord, ZipDistance};
use tracing::{debug, info, warn};

use crate::codec::{decode_json, encode_json};
use crate::errors::ServiceError;
use crate::storage::KvStore;
use crate::{index, keys};

const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance in miles.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Clone)]
pub struct ZipCodeService {
    store: Arc<dyn KvStore>,
}

impl ZipCodeService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    pub async fn save(&self, mut record: ZipCodeRecord) -> Result<(), ServiceError> {
        record.validate()?;
        if let Some(zip) = five_digit_zip(&record.zip) {
            record.zip = zip;
        }
        record.state = record.state.trim().to_uppercase();
        self.store.set(&keys::zip(&record.zip), &encode_json(&record)?).await?;
        if !record.state.is_empty() {
            index::attach(self.store.as_ref(), &keys::zip_state_index(&record.state), &record.zip).await?;
        }
        Ok(())
    }

    /// Store every valid record; invalid ones are counted as skipped.
    pub async fn import(&self, records: Vec<ZipCodeRecord>) -> Result<ImportStats, ServiceError> {
        let mut stats = ImportStats { total: records.len(), ..Default::default() };
        for record in records {
            let zip = record.zip.clone();
            match self.save(record).await {
                Ok(()) => stats.imported += 1,
                Err(ServiceError::Model(e)) => {
                    debug!(%zip, error = %e, "skipping zip record");
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!(%zip, error = %e, "zip record import failed");
                    stats.errors += 1;
                }
            }
        }
        info!(total = stats.total, imported = stats.imported, skipped = stats.skipped, errors = stats.errors, "zip import finished");
        Ok(stats)
    }

    pub async fn get(&self, zip: &str) -> Result<Option<ZipCodeRecord>, ServiceError> {
        let Some(zip) = five_digit_zip(zip) else { return Ok(None) };
        Ok(index::get_lenient(self.store.as_ref(), &keys::zip(&zip))
            .await?
            .and_then(|raw| decode_json::<ZipCodeRecord>(&raw)))
    }

    /// Stored zips within `miles` of `zip`, nearest first, the centre included.
    pub async fn within_radius(&self, zip: &str, miles: f64, limit: usize) -> Result<Vec<ZipDistance>, ServiceError> {
        let centre = self.get(zip).await?.ok_or_else(|| ServiceError::not_found("zip code"))?;
        let mut out = Vec::new();
        for key in self.store.keys(&keys::zip_pattern()).await? {
            let Some(raw) = index::get_lenient(self.store.as_ref(), &key).await? else { continue };
            let Some(record) = decode_json::<ZipCodeRecord>(&raw) else {
                warn!(%key, "zip record is unreadable");
                continue;
            };
            let distance = haversine_miles(centre.latitude, centre.longitude, record.latitude, record.longitude);
            if distance <= miles {
                out.push(ZipDistance { record, distance_miles: distance });
            }
        }
        out.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles).then_with(|| a.record.zip.cmp(&b.record.zip)));
        out.truncate(limit);
        Ok(out)
    }

    /// Format check first, then presence in the reference data.
    pub async fn validate(&self, zip: &str) -> Result<bool, ServiceError> {
        if !is_valid_zip(zip) {
            return Ok(false);
        }
        Ok(self.get(zip).await?.is_some())
    }
}
