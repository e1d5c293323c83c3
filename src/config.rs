//! Environment-sourced configuration, loaded once at startup.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::{SyncError, SyncResult};

const DEFAULT_REMOTE_DIR: &str = "/upload";
const DEFAULT_DOCSTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_COLLECTION: &str = "trips";
/// Cron expression with seconds field: 07:00 every day.
const DEFAULT_SCHEDULE: &str = "0 0 7 * * *";
const DEFAULT_SCHEDULE_TZ: &str = "America/Sao_Paulo";

/// Credentials and location of the partner SFTP drop.
#[derive(Debug, Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Private key used for authentication.
    pub key_path: PathBuf,
    /// Remote directory the daily exports land in.
    pub remote_dir: String,
}

/// Which destination the pipeline delivers to.
#[derive(Debug, Clone)]
pub enum SinkConfig {
    /// Whole-batch POST to the reporting-sheet endpoint. Not idempotent:
    /// re-running the same export appends duplicate rows downstream.
    Append { url: String },
    /// Keyed, batched upsert into the document store. Idempotent by trip id.
    Upsert {
        endpoint: String,
        project_id: String,
        collection: String,
        token: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sftp: SftpConfig,
    pub sink: SinkConfig,
    /// Cron expression evaluated in `schedule_tz`.
    pub schedule: String,
    pub schedule_tz: Tz,
    /// Run one sync immediately at startup, before the first scheduled tick.
    pub run_on_start: bool,
    /// Groups dropped by the document-store projection.
    pub excluded_groups: Vec<String>,
}

impl AppConfig {
    /// Load from the process environment. Missing required variables are
    /// fatal here, before any run is scheduled.
    pub fn from_env() -> SyncResult<Self> {
        let sftp = SftpConfig {
            host: required("SFTP_HOST")?,
            port: parse_or("SFTP_PORT", 22)?,
            username: required("SFTP_USERNAME")?,
            key_path: PathBuf::from(required("SFTP_KEY_PATH")?),
            remote_dir: optional("SFTP_REMOTE_DIR")
                .unwrap_or_else(|| DEFAULT_REMOTE_DIR.to_string()),
        };

        let sink = match optional("SINK_MODE").as_deref() {
            Some("append") => SinkConfig::Append {
                url: required("APPEND_URL")?,
            },
            Some("upsert") | None => SinkConfig::Upsert {
                endpoint: optional("DOCSTORE_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_DOCSTORE_ENDPOINT.to_string()),
                project_id: required("DOCSTORE_PROJECT_ID")?,
                collection: optional("DOCSTORE_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
                token: required("DOCSTORE_TOKEN")?,
            },
            Some(other) => {
                return Err(SyncError::InvalidConfig {
                    name: "SINK_MODE",
                    reason: format!("unknown mode `{other}`, expected `append` or `upsert`"),
                })
            }
        };

        let schedule_tz = optional("SCHEDULE_TZ")
            .unwrap_or_else(|| DEFAULT_SCHEDULE_TZ.to_string())
            .parse::<Tz>()
            .map_err(|e| SyncError::InvalidConfig {
                name: "SCHEDULE_TZ",
                reason: e.to_string(),
            })?;

        Ok(Self {
            sftp,
            sink,
            schedule: optional("SYNC_SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
            schedule_tz,
            run_on_start: matches!(
                optional("RUN_ON_START").as_deref(),
                Some("1") | Some("true")
            ),
            excluded_groups: parse_groups(&optional("EXCLUDED_GROUPS").unwrap_or_default()),
        })
    }
}

/// Split the comma-separated exclusion list, dropping empty entries.
pub fn parse_groups(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn required(name: &'static str) -> SyncResult<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(SyncError::MissingEnv(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_or<T>(name: &'static str, default: T) -> SyncResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(name) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| SyncError::InvalidConfig {
            name,
            reason: e.to_string(),
        }),
    }
}
