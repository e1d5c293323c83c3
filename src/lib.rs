//! Daily trip-export synchronization.
//!
//! One run, in order:
//! - Locate yesterday's export on the partner SFTP drop by naming convention.
//! - Download it and parse the semicolon-delimited table, skipping any
//!   banner lines before the real header.
//! - Project rows onto a fixed output schema, dropping excluded groups.
//! - Deliver the result to a reporting sheet (whole-batch append) or a
//!   document store (keyed upsert, batched under the store's write ceiling).
//!
//! Data shape:
//! - `RawRecord`: header-keyed fields, one per data row
//! - `ProjectedRecord`: fixed output schema (see [`transform`])

pub mod config;
pub mod ingest;
pub mod locate;
pub mod pipeline;
pub mod schedule;
pub mod sink;
pub mod source;
pub mod transform;

pub use crate::pipeline::{run_once, RunOutcome};
pub use crate::sink::{DeliveryReport, Sink};
pub use crate::source::{RemoteFileDescriptor, TripFileSource};

use thiserror::Error;

/// Error type returned by this crate when not using `anyhow`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },
    #[error("invalid schedule expression: {0}")]
    Schedule(String),
    #[error("sftp: {0}")]
    Sftp(#[from] ssh2::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("destination rejected write: {status} {reason}")]
    Rejected { status: u16, reason: String },
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
