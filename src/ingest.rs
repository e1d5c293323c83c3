//! Tolerant parsing of the partner's export: UTF-8 decode, banner
//! detection, then a strict semicolon-delimited parse.

use std::collections::HashMap;

use csv_async::{AsyncReaderBuilder, StringRecord, Trim};

use crate::SyncResult;

/// Case-insensitive marker that identifies the real column-header line.
pub const HEADER_MARKER: &str = "id da viagem/uber eats";

/// One parsed data row, keyed by the header names from the export.
pub type RawRecord = HashMap<String, String>;

/// Decode the export bytes and parse everything from the header line down.
///
/// The partner prepends a free-form banner of variable length; the header is
/// recognized by containing [`HEADER_MARKER`], case-insensitive. When no
/// such line exists the export is treated as empty rather than malformed:
/// an empty or placeholder file is a valid upstream state, while malformed
/// content after the header is not and fails the run.
pub async fn parse_export(bytes: &[u8]) -> SyncResult<Vec<RawRecord>> {
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    let table = match table_after_banner(&text) {
        Some(table) => table,
        None => return Ok(Vec::new()),
    };
    parse_table(table.as_bytes()).await
}

/// Slice off everything before the recognized header line.
fn table_after_banner(text: &str) -> Option<&str> {
    let mut offset = 0;
    for line in text.split('\n') {
        if line.to_lowercase().contains(HEADER_MARKER) {
            return Some(&text[offset..]);
        }
        offset += line.len() + 1;
    }
    None
}

async fn parse_table(bytes: &[u8]) -> SyncResult<Vec<RawRecord>> {
    let mut rdr = AsyncReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(Trim::All)
        // Inconsistent row widths mean the upstream format changed; fail
        // loudly instead of guessing.
        .flexible(false)
        .buffer_capacity(1 << 20)
        .create_reader(bytes);

    let headers = rdr.headers().await?.clone();
    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).await? {
        let mut row = RawRecord::with_capacity(headers.len());
        for (name, value) in headers.iter().zip(record.iter()) {
            row.insert(name.to_string(), value.to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}
