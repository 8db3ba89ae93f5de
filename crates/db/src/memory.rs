//! In-memory [`JobStore`] used as a fake job queue in tests.
//!
//! Documents are kept in insertion order, which is the "store default order"
//! the picker sees.

use std::sync::{Mutex, MutexGuard, PoisonError};

use filesure_core::status::JobStatus;
use mongodb::bson::{self, Bson, Document};

use crate::error::DbError;
use crate::models::job::Job;
use crate::repositories::JobStore;

#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    documents: Mutex<Vec<Document>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: Mutex::new(documents.into_iter().collect()),
        }
    }

    /// Copy of every stored document, in insertion order.
    pub fn snapshot(&self) -> Vec<Document> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Document>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_pending(document: &Document) -> bool {
    document.get_str("jobStatus").ok() == Some(JobStatus::Pending.as_str())
}

impl JobStore for InMemoryJobStore {
    async fn find_pending(&self) -> Result<Option<Job>, DbError> {
        let found = self.lock().iter().find(|d| is_pending(d)).cloned();
        match found {
            Some(document) => Ok(Some(bson::from_document(document)?)),
            None => Ok(None),
        }
    }

    async fn claim(&self, id: &Bson) -> Result<bool, DbError> {
        let mut documents = self.lock();
        let target = documents
            .iter_mut()
            .find(|d| d.get("_id") == Some(id) && is_pending(d));
        match target {
            Some(document) => {
                document.insert("jobStatus", JobStatus::InProgress.as_str());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
