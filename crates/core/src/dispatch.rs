//! Downloader dispatch.
//!
//! Defines [`Dispatcher`], the seam between the picker and the external
//! downloader process, and [`ProcessDispatcher`], which spawns the
//! downloader with inherited standard streams and waits for it to exit.

use std::future::Future;
use std::io;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;

use crate::types::JobId;

/// Default downloader program.
pub const DEFAULT_DOWNLOADER_PROGRAM: &str = "python";

/// Default downloader script, resolved relative to the working directory.
pub const DEFAULT_DOWNLOADER_SCRIPT: &str = "downloader.py";

/// Program and leading arguments used to launch the downloader.
///
/// The job id is always appended as the final argument, so with the default
/// `python downloader.py` the script sees exactly one positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl DownloaderCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Full argument vector (excluding the program) for `job_id`.
    pub fn args_for(&self, job_id: &JobId) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(job_id.to_string());
        args
    }
}

impl Default for DownloaderCommand {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOADER_PROGRAM, [DEFAULT_DOWNLOADER_SCRIPT])
    }
}

/// What happened to a downloader run that was successfully spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Process exit code (`None` if killed by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
    pub duration_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to spawn downloader '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed waiting for downloader: {0}")]
    Wait(#[source] io::Error),
}

/// Hands a job over to the downloader.
pub trait Dispatcher: Send + Sync {
    /// Run the downloader for `job_id` and wait for it to finish.
    ///
    /// A non-zero exit is reported in [`DispatchReport`], not as an error.
    fn dispatch(
        &self,
        job_id: &JobId,
    ) -> impl Future<Output = Result<DispatchReport, DispatchError>> + Send;
}

/// Dispatcher that launches the downloader as a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessDispatcher {
    command: DownloaderCommand,
}

impl ProcessDispatcher {
    pub fn new(command: DownloaderCommand) -> Self {
        Self { command }
    }
}

impl Dispatcher for ProcessDispatcher {
    async fn dispatch(&self, job_id: &JobId) -> Result<DispatchReport, DispatchError> {
        let args = self.command.args_for(job_id);

        tracing::debug!(
            program = %self.command.program,
            ?args,
            "Spawning downloader",
        );

        let start = Instant::now();

        // The child writes straight to our terminal; nothing is captured.
        let mut child = Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DispatchError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        let status = child.wait().await.map_err(DispatchError::Wait)?;

        Ok(DispatchReport {
            exit_code: status.code(),
            success: status.success(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
