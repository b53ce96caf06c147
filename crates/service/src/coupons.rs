use std::sync::Arc;

use models::Coupon;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::businesses::require_business;
use crate::codec::encode_json;
use crate::errors::ServiceError;
use crate::storage::{KvError, KvStore};
use crate::keys;

#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn KvStore>,
}

impl CouponService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    /// Replace the business's coupons; coupons without an id get one.
    pub async fn save(&self, business_id: &str, coupons: Vec<Coupon>) -> Result<Vec<Coupon>, ServiceError> {
        require_business(self.store.as_ref(), business_id).await?;
        for c in &coupons {
            c.validate()?;
        }
        let coupons: Vec<Coupon> = coupons
            .into_iter()
            .map(|mut c| {
                if c.id.trim().is_empty() {
                    c.id = Uuid::new_v4().to_string();
                }
                c
            })
            .collect();
        let key = keys::coupons(business_id);
        self.store.del(&[key.clone()]).await?;
        self.store.set(&key, &encode_json(&coupons)?).await?;
        info!(business_id = %business_id, count = coupons.len(), "coupons saved");
        Ok(coupons)
    }

    /// Stored coupons; a corrupt value is deleted and reads as empty.
    pub async fn list(&self, business_id: &str) -> Result<Vec<Coupon>, ServiceError> {
        let key = keys::coupons(business_id);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(KvError::WrongType { .. }) => return self.heal(&key, "value is not a string").await,
            Err(e) => return Err(e.into()),
        };
        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner).unwrap_or(Value::String(inner)),
            Ok(v) => v,
            Err(e) => return self.heal(&key, &e.to_string()).await,
        };
        if !value.is_array() {
            return self.heal(&key, "value is not an array").await;
        }
        match serde_json::from_value::<Vec<Coupon>>(value) {
            Ok(list) => Ok(list),
            Err(e) => self.heal(&key, &e.to_string()).await,
        }
    }

    async fn heal(&self, key: &str, reason: &str) -> Result<Vec<Coupon>, ServiceError> {
        warn!(%key, %reason, "corrupt coupon data; deleting");
        self.store.del(&[key.to_string()]).await?;
        common::metrics::CORRUPT_VALUES_HEALED_TOTAL.inc();
        Ok(Vec::new())
    }
}
