//! Pick one pending job and hand it to the downloader.
//!
//! The default flow is a plain read followed by a dispatch. Nothing is
//! claimed, so two pickers running at the same time can both select and
//! dispatch the same pending job. The downloader owns every status
//! transition after dispatch. Enabling [`RunOptions::claim`] adds a
//! conditional `pending -> in-progress` update before dispatch.

use std::io::{self, Write};

use filesure_core::dispatch::{DispatchReport, Dispatcher};
use filesure_core::types::JobId;
use filesure_db::models::job::Job;
use filesure_db::repositories::JobStore;
use filesure_db::DbError;

/// Notice printed when the queue has nothing pending.
pub const NO_PENDING_JOB: &str = "No pending job found.";

#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    #[error("Job store error: {0}")]
    Store(#[from] DbError),

    #[error("Failed to write to stdout: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub claim: bool,
}

/// Result of a single picker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The queue had no pending job; the downloader was not started.
    NoPendingJob,
    /// Claim mode only: another picker moved the job first.
    ClaimLost(JobId),
    /// The downloader was started for this job. `report` is `None` when the
    /// process could not be spawned at all.
    Dispatched {
        job_id: JobId,
        report: Option<DispatchReport>,
    },
}

/// Fetch one pending job without modifying it.
pub async fn find_next_pending<S: JobStore>(store: &S) -> Result<Option<Job>, DbError> {
    store.find_pending().await
}

/// Run the downloader for `job_id` and wait for it.
///
/// Failures are logged and swallowed: neither a non-zero exit nor a missing
/// downloader affects the picker's own result.
pub async fn dispatch<D: Dispatcher>(dispatcher: &D, job_id: &JobId) -> Option<DispatchReport> {
    match dispatcher.dispatch(job_id).await {
        Ok(report) => {
            if report.success {
                tracing::info!(%job_id, duration_ms = report.duration_ms, "Downloader finished");
            } else {
                tracing::warn!(
                    %job_id,
                    exit_code = ?report.exit_code,
                    duration_ms = report.duration_ms,
                    "Downloader exited unsuccessfully",
                );
            }
            Some(report)
        }
        Err(e) => {
            tracing::warn!(%job_id, error = %e, "Downloader could not be run");
            None
        }
    }
}

/// One full picker pass: find, announce, (optionally claim), dispatch.
///
/// Contract lines go to `out`; everything else is logged. Only store and
/// output failures are returned as errors.
pub async fn run_once<S, D, W>(
    store: &S,
    dispatcher: &D,
    options: RunOptions,
    out: &mut W,
) -> Result<Outcome, PickerError>
where
    S: JobStore,
    D: Dispatcher,
    W: Write,
{
    let Some(job) = find_next_pending(store).await? else {
        writeln!(out, "{NO_PENDING_JOB}")?;
        out.flush()?;
        tracing::debug!("Job queue has no pending job");
        return Ok(Outcome::NoPendingJob);
    };

    let job_id = job.job_id();

    if options.claim && !store.claim(&job.id).await? {
        writeln!(out, "Job {job_id} was claimed by another picker.")?;
        out.flush()?;
        tracing::info!(%job_id, "Lost claim race, not dispatching");
        return Ok(Outcome::ClaimLost(job_id));
    }

    writeln!(out, "Running job: {job_id}")?;
    // The child shares our stdout, so this line must land before its output.
    out.flush()?;
    tracing::info!(%job_id, claimed = options.claim, "Dispatching job to downloader");

    let report = dispatch(dispatcher, &job_id).await;

    Ok(Outcome::Dispatched { job_id, report })
}
