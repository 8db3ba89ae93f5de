use filesure_core::dispatch::{
    DownloaderCommand, DEFAULT_DOWNLOADER_PROGRAM, DEFAULT_DOWNLOADER_SCRIPT,
};
use filesure_db::{DEFAULT_DATABASE, DEFAULT_JOBS_COLLECTION, DEFAULT_MONGO_URI};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a boolean (true/false), got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

/// Job picker configuration loaded from environment variables.
///
/// Every field has a default matching the local development setup, so an
/// empty environment is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerConfig {
    /// MongoDB connection string.
    pub mongo_uri: String,
    /// Database holding the job queue.
    pub database: String,
    /// Job queue collection.
    pub collection: String,
    /// How to launch the downloader; the job id is appended.
    pub downloader: DownloaderCommand,
    /// Atomically move the job to `in-progress` before dispatching.
    pub claim: bool,
}

impl PickerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default                     |
    /// |----------------------|-----------------------------|
    /// | `MONGO_URI`          | `mongodb://localhost:27017` |
    /// | `MONGO_DB`           | `filesure`                  |
    /// | `JOBS_COLLECTION`    | `jobs`                      |
    /// | `DOWNLOADER_PROGRAM` | `python`                    |
    /// | `DOWNLOADER_ARGS`    | `downloader.py`             |
    /// | `JOB_PICKER_CLAIM`   | `false`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset, except `DOWNLOADER_ARGS` where an empty
    /// value means "no leading arguments".
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mongo_uri = non_empty("MONGO_URI").unwrap_or_else(|| DEFAULT_MONGO_URI.into());
        let database = non_empty("MONGO_DB").unwrap_or_else(|| DEFAULT_DATABASE.into());
        let collection =
            non_empty("JOBS_COLLECTION").unwrap_or_else(|| DEFAULT_JOBS_COLLECTION.into());

        let program =
            non_empty("DOWNLOADER_PROGRAM").unwrap_or_else(|| DEFAULT_DOWNLOADER_PROGRAM.into());
        let args: Vec<String> = match lookup("DOWNLOADER_ARGS") {
            Some(raw) => raw.split_whitespace().map(str::to_string).collect(),
            None => vec![DEFAULT_DOWNLOADER_SCRIPT.to_string()],
        };

        let claim = match non_empty("JOB_PICKER_CLAIM") {
            Some(raw) => parse_flag("JOB_PICKER_CLAIM", &raw)?,
            None => false,
        };

        Ok(Self {
            mongo_uri,
            database,
            collection,
            downloader: DownloaderCommand::new(program, args),
            claim,
        })
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: raw.to_string(),
        }),
    }
}
