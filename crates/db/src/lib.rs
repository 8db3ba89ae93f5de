//! MongoDB access for the job picker.
//!
//! The [`Client`] is created explicitly by the caller with [`create_client`]
//! and shut down explicitly when the run is over; nothing here holds a
//! process-wide handle.

pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod models;
pub mod repositories;

pub use error::DbError;
pub use mongodb::{Client, Database};

/// Default connection string when `MONGO_URI` is not set.
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// Default database holding the job queue.
pub const DEFAULT_DATABASE: &str = "filesure";

/// Default job queue collection.
pub const DEFAULT_JOBS_COLLECTION: &str = "jobs";

/// Create a client from a connection string.
///
/// This parses the URI and sets up the connection pool; the first server
/// round-trip happens on the first query.
pub async fn create_client(uri: &str) -> Result<Client, DbError> {
    let client = Client::with_uri_str(uri).await?;
    tracing::debug!("MongoDB client created");
    Ok(client)
}
