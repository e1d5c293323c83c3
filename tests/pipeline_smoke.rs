use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use trip_sync::pipeline::{run_once, RunOutcome};
use trip_sync::sink::{DeliveryReport, Sink};
use trip_sync::source::{RemoteFileDescriptor, TripFileSource};
use trip_sync::transform::{Projection, ProjectedRecord};
use trip_sync::{SyncError, SyncResult};

struct MemorySource {
    files: Vec<(String, Vec<u8>)>,
}

#[async_trait]
impl TripFileSource for MemorySource {
    async fn list(&self) -> SyncResult<Vec<RemoteFileDescriptor>> {
        Ok(self
            .files
            .iter()
            .map(|(name, bytes)| RemoteFileDescriptor {
                name: name.clone(),
                size_bytes: bytes.len() as u64,
                modified_at: None,
            })
            .collect())
    }

    async fn fetch(&self, name: &str) -> SyncResult<Vec<u8>> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| {
                SyncError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, name))
            })
    }
}

#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<Vec<ProjectedRecord>>>,
}

#[async_trait]
impl Sink for RecordingSink {
    async fn deliver(&self, records: &[ProjectedRecord]) -> SyncResult<DeliveryReport> {
        self.calls.lock().unwrap().push(records.to_vec());
        if records.is_empty() {
            return Ok(DeliveryReport::default());
        }
        Ok(DeliveryReport {
            written: records.len(),
            skipped: 0,
            batches: 1,
        })
    }
}

const EXPORT: &[u8] = b"Relat\xc3\xb3rio gerado em 2024-01-01
ID da viagem/Uber Eats;Nome;Sobrenome;Grupo
T1;Ana;Silva;OPERACIONAL
";

fn excluded() -> Vec<String> {
    vec!["ADMINISTRATIVO".to_string(), "COMERCIAL".to_string()]
}

#[tokio::test]
async fn missing_export_is_a_clean_skip() -> anyhow::Result<()> {
    let source = MemorySource {
        files: vec![("daily_trips-2023_12_30.csv".to_string(), EXPORT.to_vec())],
    };
    let sink = RecordingSink::default();
    let projection = Projection::document(excluded());
    let target = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

    let outcome = run_once(&source, &sink, &projection, target).await?;
    assert!(matches!(outcome, RunOutcome::NotFound { file } if file == "daily_trips-2023_12_31.csv"));
    // Zero downstream writes on a skip.
    assert!(sink.calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn delivers_projected_records_end_to_end() -> anyhow::Result<()> {
    let source = MemorySource {
        files: vec![("daily_trips-2024_01_01.csv".to_string(), EXPORT.to_vec())],
    };
    let sink = RecordingSink::default();
    let projection = Projection::document(excluded());
    let target = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let outcome = run_once(&source, &sink, &projection, target).await?;
    match outcome {
        RunOutcome::Delivered { file, rows, report } => {
            assert_eq!(file, "daily_trips-2024_01_01.csv");
            assert_eq!(rows, 1);
            assert_eq!(report.written, 1);
        }
        other => panic!("expected delivery, got {other:?}"),
    }

    let calls = sink.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 1);
    assert_eq!(calls[0][0].trip_id(), "T1");
    assert_eq!(calls[0][0].get("full_name"), Some("Ana Silva"));
    Ok(())
}

#[tokio::test]
async fn fully_excluded_export_delivers_nothing() -> anyhow::Result<()> {
    let export = b"ID da viagem/Uber Eats;Nome;Sobrenome;Grupo
T1;Bia;Souza;ADMINISTRATIVO
"
    .to_vec();
    let source = MemorySource {
        files: vec![("daily_trips-2024_01_01.csv".to_string(), export)],
    };
    let sink = RecordingSink::default();
    let projection = Projection::document(excluded());
    let target = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let outcome = run_once(&source, &sink, &projection, target).await?;
    match outcome {
        RunOutcome::Delivered { rows, report, .. } => {
            assert_eq!(rows, 1);
            assert_eq!(report, DeliveryReport::default());
        }
        other => panic!("expected delivery, got {other:?}"),
    }
    // The sink saw an empty set and attempted zero writes.
    let calls = sink.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_table_fails_the_run() {
    let export = b"ID da viagem/Uber Eats;Nome;Grupo
T1;Ana
"
    .to_vec();
    let source = MemorySource {
        files: vec![("daily_trips-2024_01_01.csv".to_string(), export)],
    };
    let sink = RecordingSink::default();
    let projection = Projection::document(Vec::new());
    let target = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let result = run_once(&source, &sink, &projection, target).await;
    assert!(result.is_err());
    assert!(sink.calls.lock().unwrap().is_empty());
}
