use std::sync::Arc;

use chrono::Utc;
use models::{AdDesign, BusinessInfo};
use tracing::{info, warn};

use crate::businesses::require_business;
use crate::codec::{decode_json, encode_json};
use crate::errors::ServiceError;
use crate::storage::KvStore;
use crate::{index, keys};

/// The AdBox design a business builds for its listing.
#[derive(Clone)]
pub struct AdDesignService {
    store: Arc<dyn KvStore>,
}

impl AdDesignService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    pub async fn save(&self, business_id: &str, mut design: AdDesign) -> Result<AdDesign, ServiceError> {
        require_business(self.store.as_ref(), business_id).await?;
        design.validate()?;
        design.updated_at = Some(Utc::now());
        self.store.set(&keys::ad_design(business_id), &encode_json(&design)?).await?;
        self.store
            .set(&keys::ad_design_info(business_id), &encode_json(&design.business_info)?)
            .await?;
        info!(business_id = %business_id, design_id = design.design_id, "ad design saved");
        Ok(design)
    }

    pub async fn get(&self, business_id: &str) -> Result<Option<AdDesign>, ServiceError> {
        let Some(raw) = index::get_lenient(self.store.as_ref(), &keys::ad_design(business_id)).await? else {
            return Ok(None);
        };
        let design = decode_json::<AdDesign>(&raw);
        if design.is_none() {
            warn!(business_id = %business_id, "ad design is unreadable");
        }
        Ok(design)
    }

    /// The standalone business-info block, else the one embedded in the design.
    pub async fn business_info(&self, business_id: &str) -> Result<Option<BusinessInfo>, ServiceError> {
        if let Some(raw) = index::get_lenient(self.store.as_ref(), &keys::ad_design_info(business_id)).await? {
            if let Some(info) = decode_json::<BusinessInfo>(&raw) {
                return Ok(Some(info));
            }
        }
        Ok(self.get(business_id).await?.map(|d| d.business_info))
    }
}
