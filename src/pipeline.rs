//! One run of the locate → ingest → transform → deliver sequence.

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::config::{AppConfig, SinkConfig};
use crate::sink::{AppendSink, DeliveryReport, Sink, UpsertSink};
use crate::source::{SftpSource, TripFileSource};
use crate::transform::Projection;
use crate::{ingest, locate, SyncResult};

/// Outcome of one pipeline run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The expected export is not on the drop yet. Clean skip, zero writes.
    NotFound { file: String },
    /// Export parsed and delivered.
    Delivered {
        file: String,
        rows: usize,
        report: DeliveryReport,
    },
}

/// Run the pipeline once against an already-open source.
///
/// Stages run strictly in sequence and any failure aborts the run. A
/// missing export is reported as [`RunOutcome::NotFound`], not an error.
pub async fn run_once<S>(
    source: &S,
    sink: &dyn Sink,
    projection: &Projection,
    target: NaiveDate,
) -> SyncResult<RunOutcome>
where
    S: TripFileSource + ?Sized,
{
    let name = locate::export_name(target);
    let listing = source.list().await?;
    let Some(found) = locate::find_export(&listing, &name) else {
        info!(file = %name, "export not present on the drop, skipping");
        return Ok(RunOutcome::NotFound { file: name });
    };
    info!(file = %found.name, size = found.size_bytes, "export located");

    let bytes = source.fetch(&found.name).await?;
    let rows = ingest::parse_export(&bytes).await?;
    let records = projection.apply(&rows);
    info!(rows = rows.len(), kept = records.len(), "export parsed");

    let report = sink.deliver(&records).await?;
    info!(
        written = report.written,
        skipped = report.skipped,
        batches = report.batches,
        "delivery complete"
    );
    Ok(RunOutcome::Delivered {
        file: name,
        rows: rows.len(),
        report,
    })
}

/// Connect, run once for yesterday's export, and release the session.
pub async fn run(cfg: &AppConfig) -> SyncResult<RunOutcome> {
    let source = SftpSource::connect(&cfg.sftp).await?;
    let sink = build_sink(&cfg.sink);
    let projection = projection_for(cfg);
    let target = locate::target_date(Local::now().date_naive());
    let outcome = run_once(&source, sink.as_ref(), &projection, target).await;
    // The transfer session must not outlive the run; dropping the source
    // here closes it on success and failure alike.
    drop(source);
    outcome
}

/// The configured destination behind the one [`Sink`] interface.
pub fn build_sink(cfg: &SinkConfig) -> Box<dyn Sink> {
    match cfg {
        SinkConfig::Append { url } => Box::new(AppendSink::new(url.clone())),
        SinkConfig::Upsert {
            endpoint,
            project_id,
            collection,
            token,
        } => Box::new(UpsertSink::new(
            endpoint.clone(),
            project_id.clone(),
            collection.clone(),
            token.clone(),
        )),
    }
}

/// Each destination carries its own output schema; only the document path
/// filters excluded groups.
pub fn projection_for(cfg: &AppConfig) -> Projection {
    match cfg.sink {
        SinkConfig::Append { .. } => Projection::sheet(),
        SinkConfig::Upsert { .. } => Projection::document(cfg.excluded_groups.clone()),
    }
}
