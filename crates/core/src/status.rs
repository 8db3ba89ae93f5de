//! Job status values as stored in the `jobStatus` field.

use std::fmt;

/// The job statuses the picker touches.
///
/// [`JobStatus::Pending`] is the only value the picker reads.
/// [`JobStatus::InProgress`] is written by the optional claim step; every
/// later status belongs to the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    InProgress,
}

impl JobStatus {
    /// Return the string stored in the `jobStatus` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
