//! Customer reviews and the cached per-business rating aggregates.
//!
//! `business:<id>:rating` and `business:<id>:reviewCount` are rewritten on
//! every review change and recomputed from the reviews when either is missing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use models::review::round_tenth;
use models::{RatingSummary, Review, ReviewSubmission};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::businesses::require_business;
use crate::codec::{decode_json, encode_json};
use crate::errors::ServiceError;
use crate::storage::KvStore;
use crate::{index, keys};

pub async fn review_ids(store: &dyn KvStore, business_id: &str) -> Result<Vec<String>, ServiceError> {
    index::members(store, &keys::business_reviews(business_id)).await
}

async fn load_review(store: &dyn KvStore, review_id: &str) -> Result<Option<Review>, ServiceError> {
    let Some(raw) = index::get_lenient(store, &keys::review(review_id)).await? else { return Ok(None) };
    match decode_json::<Review>(&raw) {
        Some(mut r) => {
            if r.id.is_empty() {
                r.id = review_id.to_string();
            }
            Ok(Some(r.normalize()))
        }
        None => {
            warn!(%review_id, "review record is not valid JSON; skipping");
            Ok(None)
        }
    }
}

fn submitted_at(review: &Review) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(review.date.trim()).ok().map(|d| d.with_timezone(&Utc))
}

/// Delete every review filed under the business; returns the deleted keys.
pub async fn purge_reviews(store: &dyn KvStore, business_id: &str) -> Result<Vec<String>, ServiceError> {
    let mut deleted = Vec::new();
    for id in review_ids(store, business_id).await? {
        let Some(review) = load_review(store, &id).await? else { continue };
        if !review.business_id.is_empty() && review.business_id != business_id {
            continue;
        }
        if !review.user_id.is_empty() {
            index::detach(store, &keys::user_reviews(&review.user_id), &id).await?;
        }
        let key = keys::review(&id);
        if store.del(&[key.clone()]).await? > 0 {
            deleted.push(key);
        }
    }
    Ok(deleted)
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn KvStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    #[instrument(skip(self, input), fields(user = %input.user_name))]
    pub async fn submit(&self, business_id: &str, input: ReviewSubmission) -> Result<Review, ServiceError> {
        input.validate()?;
        let store = self.store.as_ref();
        require_business(store, business_id).await?;

        let user_id = input.user_id.trim().to_string();
        let review = Review {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            verified: !user_id.is_empty(),
            user_id,
            user_name: input.user_name.trim().to_string(),
            overall_rating: Some(input.ratings.overall()),
            ratings: Some(input.ratings),
            rating: None,
            comment: input.comment.trim().to_string(),
            date: Utc::now().to_rfc3339(),
        };
        store.set(&keys::review(&review.id), &encode_json(&review)?).await?;
        index::attach(store, &keys::business_reviews(business_id), &review.id).await?;
        if !review.user_id.is_empty() {
            index::attach(store, &keys::user_reviews(&review.user_id), &review.id).await?;
        }
        let summary = self.refresh_rating(business_id).await?;

        common::metrics::REVIEWS_SUBMITTED_TOTAL.inc();
        info!(
            business_id = %business_id,
            review_id = %review.id,
            stars = review.stars(),
            rating = summary.rating,
            "review stored"
        );
        Ok(review)
    }

    /// Readable reviews, newest first; undated ones last.
    pub async fn list(&self, business_id: &str) -> Result<Vec<Review>, ServiceError> {
        let store = self.store.as_ref();
        let mut out = Vec::new();
        for id in review_ids(store, business_id).await? {
            match load_review(store, &id).await? {
                Some(r) => out.push(r),
                None => debug!(business_id = %business_id, review_id = %id, "indexed review has no readable record"),
            }
        }
        out.sort_by(|a, b| submitted_at(b).cmp(&submitted_at(a)).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Cached aggregates, recomputed and stored when either key is missing.
    pub async fn rating(&self, business_id: &str) -> Result<RatingSummary, ServiceError> {
        let store = self.store.as_ref();
        let rating = index::get_lenient(store, &keys::rating(business_id)).await?;
        let count = index::get_lenient(store, &keys::review_count(business_id)).await?;
        match (rating, count) {
            (Some(rating), Some(count)) => Ok(RatingSummary {
                rating: round_tenth(rating.trim().parse::<f64>().ok().filter(|r| r.is_finite()).unwrap_or(0.0)),
                review_count: count.trim().parse().unwrap_or(0),
            }),
            _ => self.refresh_rating(business_id).await,
        }
    }

    /// Recompute the aggregates from the stored reviews and write them.
    ///
    /// The average covers reviews with a positive rating; the count covers
    /// every readable review.
    pub async fn refresh_rating(&self, business_id: &str) -> Result<RatingSummary, ServiceError> {
        let reviews = self.list(business_id).await?;
        let rated: Vec<f64> = reviews.iter().map(Review::stars).filter(|s| s.is_finite() && *s > 0.0).collect();
        let summary = if rated.is_empty() {
            RatingSummary::default()
        } else {
            let average = rated.iter().sum::<f64>() / rated.len() as f64;
            RatingSummary { rating: round_tenth(average), review_count: reviews.len() as u64 }
        };
        let store = self.store.as_ref();
        store.set(&keys::rating(business_id), &format!("{:.1}", summary.rating)).await?;
        store.set(&keys::review_count(business_id), &summary.review_count.to_string()).await?;
        debug!(business_id = %business_id, rating = summary.rating, count = summary.review_count, "rating aggregates written");
        Ok(summary)
    }

    /// Remove one review from the business and refresh its aggregates.
    pub async fn delete(&self, business_id: &str, review_id: &str) -> Result<RatingSummary, ServiceError> {
        let store = self.store.as_ref();
        let review = load_review(store, review_id)
            .await?
            .filter(|r| r.business_id.is_empty() || r.business_id == business_id);
        let listed = index::detach(store, &keys::business_reviews(business_id), review_id).await?;
        if review.is_none() && !listed {
            return Err(ServiceError::not_found("review"));
        }
        if let Some(r) = &review {
            if !r.user_id.is_empty() {
                index::detach(store, &keys::user_reviews(&r.user_id), review_id).await?;
            }
            store.del(&[keys::review(review_id)]).await?;
        }
        info!(business_id = %business_id, %review_id, "review deleted");
        self.refresh_rating(business_id).await
    }
}
