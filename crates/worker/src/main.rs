//! `job-picker` -- start the downloader for one pending job.
//!
//! Looks up a single job with `jobStatus: "pending"` and runs
//! `python downloader.py <job_id>` for it, then exits. Meant to be invoked
//! repeatedly by an external scheduler.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default                     | Description                      |
//! |----------------------|----------|-----------------------------|----------------------------------|
//! | `MONGO_URI`          | no       | `mongodb://localhost:27017` | Job store connection string      |
//! | `MONGO_DB`           | no       | `filesure`                  | Database holding the job queue   |
//! | `JOBS_COLLECTION`    | no       | `jobs`                      | Job queue collection             |
//! | `DOWNLOADER_PROGRAM` | no       | `python`                    | Downloader executable            |
//! | `DOWNLOADER_ARGS`    | no       | `downloader.py`             | Arguments placed before the id   |
//! | `JOB_PICKER_CLAIM`   | no       | `false`                     | Claim the job before dispatching |
//!
//! Stdout carries only the picker's notices and the downloader's output;
//! logs go to stderr.

use anyhow::Context;
use filesure_core::dispatch::ProcessDispatcher;
use filesure_db::repositories::JobRepo;
use filesure_worker::config::PickerConfig;
use filesure_worker::picker::{self, RunOptions};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "filesure_worker=info,filesure_db=info,filesure_core=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PickerConfig::from_env().context("Invalid job picker configuration")?;

    tracing::debug!(
        database = %config.database,
        collection = %config.collection,
        program = %config.downloader.program,
        claim = config.claim,
        "Starting job picker",
    );

    let client = filesure_db::create_client(&config.mongo_uri)
        .await
        .context("Failed to create MongoDB client")?;
    let repo = JobRepo::new(&client.database(&config.database), &config.collection);
    let dispatcher = ProcessDispatcher::new(config.downloader.clone());

    let result = picker::run_once(
        &repo,
        &dispatcher,
        RunOptions {
            claim: config.claim,
        },
        &mut std::io::stdout(),
    )
    .await;

    drop(repo);
    client.shutdown().await;

    let outcome = result.context("Failed to pick a pending job")?;
    tracing::debug!(?outcome, "Job picker finished");

    Ok(())
}
