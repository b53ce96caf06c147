//! Per-business visitor counters: event totals and views by visitor zip code.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use models::{AnalyticsEvent, AnalyticsEventType, BusinessAnalytics, ZipCodeAnalytics};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::businesses::require_business;
use crate::codec::{decode_json, encode_json};
use crate::errors::ServiceError;
use crate::storage::{KeyKind, KvError, KvStore};
use crate::{index, keys};

const TOTAL_EVENTS: &str = "total_events";

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ZipMeta {
    zip_code: String,
    last_viewed: Option<i64>,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    source: String,
}

fn visitor_zip(zip: Option<&str>) -> Option<&str> {
    let zip = zip?.trim();
    (zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit())).then_some(zip)
}

fn count(map: &HashMap<String, String>, field: &str) -> i64 {
    map.get(field).and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn KvStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    pub async fn track(&self, business_id: &str, event: AnalyticsEvent) -> Result<(), ServiceError> {
        let store = self.store.as_ref();
        require_business(store, business_id).await?;
        let events_key = keys::analytics_events(business_id);
        let zips_key = keys::analytics_zipcodes(business_id);
        self.ensure_hash(&events_key).await?;
        self.ensure_hash(&zips_key).await?;

        store.hincrby(&events_key, event.event_type.field(), 1).await?;
        store.hincrby(&events_key, TOTAL_EVENTS, 1).await?;

        match visitor_zip(event.zip_code.as_deref()) {
            Some(zip) => {
                store.hincrby(&zips_key, zip, 1).await?;
                let meta = ZipMeta {
                    zip_code: zip.to_string(),
                    last_viewed: Some(event.timestamp.unwrap_or_else(|| Utc::now().timestamp_millis())),
                    city: event.city.trim().to_string(),
                    state: event.state.trim().to_string(),
                    source: event.source.trim().to_string(),
                };
                store.set(&keys::analytics_zip_meta(business_id, zip), &encode_json(&meta)?).await?;
            }
            None => {
                if let Some(zip) = &event.zip_code {
                    warn!(business_id = %business_id, %zip, "ignoring malformed visitor zip");
                }
            }
        }
        common::metrics::ANALYTICS_EVENTS_TOTAL.with_label_values(&[event.event_type.field()]).inc();
        Ok(())
    }

    /// Counters keep `hincrby` working; any other value kind is dropped.
    async fn ensure_hash(&self, key: &str) -> Result<(), ServiceError> {
        match self.store.kind(key).await? {
            None | Some(KeyKind::Hash) => Ok(()),
            Some(kind) => {
                warn!(%key, ?kind, "analytics counter key holds the wrong kind; resetting");
                self.store.del(&[key.to_string()]).await?;
                common::metrics::CORRUPT_VALUES_HEALED_TOTAL.inc();
                Ok(())
            }
        }
    }

    async fn counters(&self, key: &str) -> Result<HashMap<String, String>, ServiceError> {
        match self.store.hgetall(key).await {
            Ok(map) => Ok(map),
            Err(KvError::WrongType { key }) => {
                warn!(%key, "analytics counters are not a hash; reporting zero");
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn summary(&self, business_id: &str) -> Result<BusinessAnalytics, ServiceError> {
        let store = self.store.as_ref();
        require_business(store, business_id).await?;
        let events = self.counters(&keys::analytics_events(business_id)).await?;

        let mut zips = Vec::new();
        for (zip, raw) in self.counters(&keys::analytics_zipcodes(business_id)).await? {
            let views = raw.trim().parse::<i64>().unwrap_or(0);
            if views <= 0 {
                continue;
            }
            let meta = index::get_lenient(store, &keys::analytics_zip_meta(business_id, &zip))
                .await?
                .and_then(|raw| decode_json::<ZipMeta>(&raw))
                .unwrap_or_default();
            zips.push(ZipCodeAnalytics {
                zip_code: zip,
                count: views,
                city: meta.city,
                state: meta.state,
                last_viewed: meta.last_viewed,
            });
        }
        zips.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.zip_code.cmp(&b.zip_code)));

        Ok(BusinessAnalytics {
            business_id: business_id.to_string(),
            total_events: count(&events, TOTAL_EVENTS),
            profile_views: count(&events, AnalyticsEventType::ProfileView.field()),
            contact_clicks: count(&events, AnalyticsEventType::ContactClick.field()),
            website_clicks: count(&events, AnalyticsEventType::WebsiteClick.field()),
            phone_clicks: count(&events, AnalyticsEventType::PhoneClick.field()),
            zip_code_analytics: zips,
        })
    }

    /// Drop every analytics key of the business; returns how many were removed.
    pub async fn reset(&self, business_id: &str) -> Result<u64, ServiceError> {
        let doomed = self.store.keys(&keys::analytics_pattern(business_id)).await?;
        let removed = if doomed.is_empty() { 0 } else { self.store.del(&doomed).await? };
        info!(business_id = %business_id, removed, "analytics reset");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{register, services};

    fn event(kind: AnalyticsEventType, zip: Option<&str>) -> AnalyticsEvent {
        AnalyticsEvent {
            event_type: kind,
            zip_code: zip.map(str::to_string),
            timestamp: Some(1_700_000_000_000),
            city: "Austin".into(),
            state: "TX".into(),
            source: "card".into(),
        }
    }

    #[tokio::test]
    async fn counts_events_and_zip_views() -> Result<(), anyhow::Error> {
        let (_store, svc) = services();
        let b = register(&svc, "Happy Tails", "t@example.com", "10001").await?;
        svc.analytics.track(&b.id, event(AnalyticsEventType::ProfileView, Some("78701"))).await?;
        svc.analytics.track(&b.id, event(AnalyticsEventType::ProfileView, Some("78701"))).await?;
        svc.analytics.track(&b.id, event(AnalyticsEventType::PhoneClick, Some("10001"))).await?;
        svc.analytics.track(&b.id, event(AnalyticsEventType::WebsiteClick, Some("7870"))).await?;

        let s = svc.analytics.summary(&b.id).await?;
        assert_eq!((s.total_events, s.profile_views, s.phone_clicks, s.website_clicks, s.contact_clicks), (4, 2, 1, 1, 0));
        let zips: Vec<(&str, i64)> = s.zip_code_analytics.iter().map(|z| (z.zip_code.as_str(), z.count)).collect();
        assert_eq!(zips, vec![("78701", 2), ("10001", 1)]);
        assert_eq!(s.zip_code_analytics[0].city, "Austin");
        assert_eq!(s.zip_code_analytics[0].last_viewed, Some(1_700_000_000_000));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_kind_counters_are_reset() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let b = register(&svc, "Happy Tails", "t@example.com", "10001").await?;
        store.set(&keys::analytics_events(&b.id), "{\"profile_view\":9}").await?;
        assert_eq!(svc.analytics.summary(&b.id).await?.total_events, 0);

        svc.analytics.track(&b.id, event(AnalyticsEventType::ContactClick, None)).await?;
        let s = svc.analytics.summary(&b.id).await?;
        assert_eq!((s.total_events, s.contact_clicks), (1, 1));
        assert!(s.zip_code_analytics.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reset_and_unknown_business() -> Result<(), anyhow::Error> {
        let (store, svc) = services();
        let b = register(&svc, "Happy Tails", "t@example.com", "10001").await?;
        svc.analytics.track(&b.id, event(AnalyticsEventType::ProfileView, Some("78701"))).await?;
        assert_eq!(svc.analytics.reset(&b.id).await?, 3);
        assert!(store.keys(&keys::analytics_pattern(&b.id)).await?.is_empty());
        assert_eq!(svc.analytics.summary(&b.id).await?.total_events, 0);

        let missing = svc.analytics.track("nope", event(AnalyticsEventType::ProfileView, None)).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
