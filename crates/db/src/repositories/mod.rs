//! Job store access.
//!
//! [`JobStore`] is the seam the picker depends on. [`JobRepo`] implements it
//! over a MongoDB collection; `InMemoryJobStore` (feature `test-util`) implements
//! it for tests.

pub mod job_repo;

pub use job_repo::{JobRepo, JobStore};
