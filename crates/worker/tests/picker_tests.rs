//! Integration tests for the picker flow.
//!
//! Uses [`InMemoryJobStore`] as the job queue. Dispatch is checked with a
//! recording dispatcher and with real `sh` stub downloaders.

use std::sync::Mutex;

use assert_matches::assert_matches;
use filesure_core::dispatch::{
    DispatchError, DispatchReport, Dispatcher, DownloaderCommand, ProcessDispatcher,
};
use filesure_core::types::JobId;
use filesure_db::memory::InMemoryJobStore;
use filesure_db::DbError;
use filesure_worker::picker::{run_once, Outcome, PickerError, RunOptions, NO_PENDING_JOB};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Dispatcher that records every job id instead of spawning anything.
#[derive(Default)]
struct RecordingDispatcher {
    calls: Mutex<Vec<JobId>>,
}

impl RecordingDispatcher {
    fn calls(&self) -> Vec<JobId> {
        self.calls.lock().unwrap().clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, job_id: &JobId) -> Result<DispatchReport, DispatchError> {
        self.calls.lock().unwrap().push(job_id.clone());
        Ok(DispatchReport {
            exit_code: Some(0),
            success: true,
            duration_ms: 0,
        })
    }
}

fn pending(oid: &str) -> Document {
    doc! {
        "_id": ObjectId::parse_str(oid).unwrap(),
        "jobStatus": "pending",
        "companyName": "Acme Ltd",
    }
}

async fn run(
    store: &InMemoryJobStore,
    dispatcher: &impl Dispatcher,
    options: RunOptions,
) -> (Result<Outcome, PickerError>, String) {
    let mut out = Vec::new();
    let result = run_once(store, dispatcher, options, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

// ---------------------------------------------------------------------------
// Default (read-only) flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_queue_prints_notice_and_never_dispatches() {
    let store = InMemoryJobStore::with_documents([
        doc! { "_id": ObjectId::new(), "jobStatus": "complete" },
        doc! { "_id": ObjectId::new(), "jobStatus": "failed" },
    ]);
    let dispatcher = RecordingDispatcher::default();

    let (result, stdout) = run(&store, &dispatcher, RunOptions::default()).await;

    assert_eq!(result.unwrap(), Outcome::NoPendingJob);
    assert_eq!(stdout, format!("{NO_PENDING_JOB}\n"));
    assert!(dispatcher.calls().is_empty());
}

#[tokio::test]
async fn single_pending_job_is_announced_and_dispatched_once() {
    let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
    let dispatcher = RecordingDispatcher::default();

    let (result, stdout) = run(&store, &dispatcher, RunOptions::default()).await;

    assert_eq!(stdout, "Running job: 507f1f77bcf86cd799439011\n");
    assert_eq!(
        dispatcher.calls(),
        vec![JobId::new("507f1f77bcf86cd799439011")]
    );
    assert_matches!(
        result,
        Ok(Outcome::Dispatched { job_id, report: Some(_) }) if job_id.as_str() == "507f1f77bcf86cd799439011"
    );
}

#[tokio::test]
async fn multiple_pending_jobs_dispatch_only_the_first_in_store_order() {
    let store = InMemoryJobStore::with_documents([
        doc! { "_id": ObjectId::new(), "jobStatus": "complete" },
        pending("000000000000000000000002"),
        pending("000000000000000000000001"),
        pending("000000000000000000000003"),
    ]);
    let dispatcher = RecordingDispatcher::default();

    let (result, _) = run(&store, &dispatcher, RunOptions::default()).await;

    assert!(result.is_ok());
    assert_eq!(
        dispatcher.calls(),
        vec![JobId::new("000000000000000000000002")]
    );
}

#[tokio::test]
async fn default_flow_never_writes_to_the_store() {
    let store = InMemoryJobStore::with_documents([
        pending("507f1f77bcf86cd799439011"),
        pending("507f1f77bcf86cd799439012"),
    ]);
    let before = store.snapshot();

    let (result, _) = run(&store, &RecordingDispatcher::default(), RunOptions::default()).await;

    assert!(result.is_ok());
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn repeated_runs_pick_the_same_unclaimed_job() {
    let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
    let dispatcher = RecordingDispatcher::default();

    run(&store, &dispatcher, RunOptions::default()).await.0.unwrap();
    run(&store, &dispatcher, RunOptions::default()).await.0.unwrap();

    assert_eq!(dispatcher.calls().len(), 2);
    assert_eq!(dispatcher.calls()[0], dispatcher.calls()[1]);
}

#[tokio::test]
async fn run_once_can_be_driven_from_a_spawned_task() {
    let handle = tokio::spawn(async move {
        let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
        let dispatcher = RecordingDispatcher::default();
        let mut out = Vec::new();
        let outcome = run_once(&store, &dispatcher, RunOptions::default(), &mut out).await;
        (outcome, dispatcher.calls())
    });

    let (outcome, calls) = handle.await.expect("task panicked");
    assert_matches!(outcome, Ok(Outcome::Dispatched { .. }));
    assert_eq!(calls, vec![JobId::new("507f1f77bcf86cd799439011")]);
}

#[tokio::test]
async fn malformed_pending_record_is_a_store_error() {
    let store = InMemoryJobStore::with_documents([doc! { "jobStatus": "pending" }]);
    let dispatcher = RecordingDispatcher::default();

    let (result, stdout) = run(&store, &dispatcher, RunOptions::default()).await;

    assert_matches!(result, Err(PickerError::Store(DbError::Decode(_))));
    assert!(stdout.is_empty());
    assert!(dispatcher.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Downloader failures do not affect the picker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_downloader_does_not_fail_the_run() {
    let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
    let dispatcher = ProcessDispatcher::new(DownloaderCommand::new("sh", ["-c", "exit 1"]));

    let (result, stdout) = run(&store, &dispatcher, RunOptions::default()).await;

    assert_eq!(stdout, "Running job: 507f1f77bcf86cd799439011\n");
    assert_matches!(
        result,
        Ok(Outcome::Dispatched { report: Some(DispatchReport { success: false, exit_code: Some(1), .. }), .. })
    );
}

#[tokio::test]
async fn missing_downloader_does_not_fail_the_run() {
    let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
    let dispatcher = ProcessDispatcher::new(DownloaderCommand::new(
        "/nonexistent/downloader",
        Vec::<String>::new(),
    ));

    let (result, _) = run(&store, &dispatcher, RunOptions::default()).await;

    assert_matches!(result, Ok(Outcome::Dispatched { report: None, .. }));
}

#[tokio::test]
async fn stub_downloader_receives_job_id_as_only_argument() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("calls.txt");
    let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
    // Appends "<argc> <args...>" per invocation; $0 is the record path.
    let dispatcher = ProcessDispatcher::new(DownloaderCommand::new(
        "sh",
        [
            "-c",
            r#"echo "$# $*" >> "$0""#,
            record.to_str().unwrap(),
        ],
    ));

    let (result, _) = run(&store, &dispatcher, RunOptions::default()).await;

    assert!(result.is_ok());
    assert_eq!(
        std::fs::read_to_string(&record).unwrap(),
        "1 507f1f77bcf86cd799439011\n"
    );
}

// ---------------------------------------------------------------------------
// Claim mode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn claim_mode_marks_job_in_progress_before_dispatch() {
    let store = InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]);
    let dispatcher = RecordingDispatcher::default();

    let (result, _) = run(&store, &dispatcher, RunOptions { claim: true }).await;

    assert_matches!(result, Ok(Outcome::Dispatched { .. }));
    assert_eq!(dispatcher.calls().len(), 1);
    assert_eq!(
        store.snapshot()[0].get_str("jobStatus").unwrap(),
        "in-progress"
    );

    // The job is no longer pending, so a second claiming picker finds nothing.
    let (second, _) = run(&store, &dispatcher, RunOptions { claim: true }).await;
    assert_eq!(second.unwrap(), Outcome::NoPendingJob);
    assert_eq!(dispatcher.calls().len(), 1);
}

/// Store whose read still sees a pending job that a concurrent picker has
/// already claimed.
struct StaleReadStore {
    inner: InMemoryJobStore,
}

impl filesure_db::repositories::JobStore for StaleReadStore {
    async fn find_pending(
        &self,
    ) -> Result<Option<filesure_db::models::job::Job>, DbError> {
        self.inner.find_pending().await
    }

    async fn claim(&self, _id: &mongodb::bson::Bson) -> Result<bool, DbError> {
        Ok(false)
    }
}

#[tokio::test]
async fn lost_claim_skips_dispatch() {
    let store = StaleReadStore {
        inner: InMemoryJobStore::with_documents([pending("507f1f77bcf86cd799439011")]),
    };
    let dispatcher = RecordingDispatcher::default();
    let mut out = Vec::new();

    let result = run_once(&store, &dispatcher, RunOptions { claim: true }, &mut out).await;

    assert_matches!(result, Ok(Outcome::ClaimLost(id)) if id.as_str() == "507f1f77bcf86cd799439011");
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Job 507f1f77bcf86cd799439011 was claimed by another picker.\n"
    );
    assert!(dispatcher.calls().is_empty());
}
