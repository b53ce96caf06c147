use std::sync::Arc;

use chrono::Utc;
use models::{FormattedJob, JobListing, JobListingInput};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::businesses::require_business;
use crate::codec::{decode_json, decode_string_list, encode_json};
use crate::errors::ServiceError;
use crate::storage::{KeyKind, KvStore};
use crate::{index, keys};

/// Job ids listed under `jobs:<businessId>`; a JSON array, or a set from older writers.
pub async fn job_ids(store: &dyn KvStore, business_id: &str) -> Result<Vec<String>, ServiceError> {
    let key = keys::jobs(business_id);
    match store.kind(&key).await? {
        Some(KeyKind::String) => Ok(store.get(&key).await?.map(|raw| decode_string_list(&raw)).unwrap_or_default()),
        Some(KeyKind::Set) => Ok(store.smembers(&key).await?),
        Some(KeyKind::Hash) => {
            warn!(%key, "job list stored as a hash; ignoring");
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

async fn write_ids(store: &dyn KvStore, business_id: &str, ids: &[String]) -> Result<(), ServiceError> {
    let key = keys::jobs(business_id);
    store.del(&[key.clone()]).await?;
    if !ids.is_empty() {
        store.set(&key, &encode_json(ids)?).await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn KvStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn KvStore>) -> Self { Self { store } }

    #[instrument(skip(self, input), fields(title = %input.job_title))]
    pub async fn create(&self, business_id: &str, input: JobListingInput) -> Result<JobListing, ServiceError> {
        input.validate()?;
        let store = self.store.as_ref();
        require_business(store, business_id).await?;

        let now = Utc::now();
        let job = JobListing {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            details: input,
        };
        store.set(&keys::job(business_id, &job.id), &encode_json(&job)?).await?;

        let mut ids = job_ids(store, business_id).await?;
        ids.push(job.id.clone());
        write_ids(store, business_id, &ids).await?;

        info!(business_id = %business_id, job_id = %job.id, "job listing created");
        Ok(job)
    }

    /// Newest first; unreadable listings are skipped.
    pub async fn list(&self, business_id: &str) -> Result<Vec<JobListing>, ServiceError> {
        let store = self.store.as_ref();
        let mut out = Vec::new();
        for id in job_ids(store, business_id).await? {
            let Some(raw) = index::get_lenient(store, &keys::job(business_id, &id)).await? else {
                debug!(business_id = %business_id, job_id = %id, "listed job has no record");
                continue;
            };
            match decode_json::<JobListing>(&raw) {
                Some(mut job) => {
                    if job.id.is_empty() {
                        job.id = id;
                    }
                    if job.business_id.is_empty() {
                        job.business_id = business_id.to_string();
                    }
                    out.push(job);
                }
                None => warn!(business_id = %business_id, job_id = %id, "job record is unreadable; skipping"),
            }
        }
        out.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(out)
    }

    pub async fn list_formatted(&self, business_id: &str) -> Result<Vec<FormattedJob>, ServiceError> {
        Ok(self.list(business_id).await?.iter().map(JobListing::format).collect())
    }

    /// `false` when the id was not listed for this business.
    pub async fn remove(&self, business_id: &str, job_id: &str) -> Result<bool, ServiceError> {
        let store = self.store.as_ref();
        store.del(&[keys::job(business_id, job_id)]).await?;
        let ids = job_ids(store, business_id).await?;
        if !ids.iter().any(|i| i == job_id) {
            return Ok(false);
        }
        let remaining: Vec<String> = ids.into_iter().filter(|i| i != job_id).collect();
        write_ids(store, business_id, &remaining).await?;
        info!(business_id = %business_id, job_id = %job_id, "job listing removed");
        Ok(true)
    }
}
