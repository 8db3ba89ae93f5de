//! Repository for the `jobs` collection.

use std::future::Future;

use filesure_core::status::JobStatus;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Collection, Database};

use crate::error::DbError;
use crate::models::job::{self, Job};

/// Filter matching every job waiting for a downloader.
pub fn pending_filter() -> Document {
    doc! { "jobStatus": JobStatus::Pending.as_str() }
}

/// Read access to the job queue, plus the optional claim.
pub trait JobStore: Send + Sync {
    /// Fetch one arbitrary pending job, in the store's default order.
    ///
    /// Pure read: nothing is written and nothing is locked.
    fn find_pending(&self) -> impl Future<Output = Result<Option<Job>, DbError>> + Send;

    /// Move a job from `pending` to `in-progress` if it is still pending.
    ///
    /// Returns `true` when exactly one record was modified.
    fn claim(&self, id: &Bson) -> impl Future<Output = Result<bool, DbError>> + Send;
}

/// MongoDB-backed [`JobStore`].
#[derive(Debug, Clone)]
pub struct JobRepo {
    collection: Collection<Job>,
}

impl JobRepo {
    pub fn new(db: &Database, collection: &str) -> Self {
        Self {
            collection: db.collection::<Job>(collection),
        }
    }
}

impl JobStore for JobRepo {
    async fn find_pending(&self) -> Result<Option<Job>, DbError> {
        let job = self
            .collection
            .find_one(pending_filter())
            .projection(job::projection())
            .await?;
        Ok(job)
    }

    async fn claim(&self, id: &Bson) -> Result<bool, DbError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.clone(), "jobStatus": JobStatus::Pending.as_str() },
                doc! { "$set": { "jobStatus": JobStatus::InProgress.as_str() } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }
}
