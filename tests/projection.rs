use std::collections::HashMap;
use trip_sync::transform::{columns, Projection, PENDING_MARKER};

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn trip(id: &str, first: &str, last: &str, group: &str) -> HashMap<String, String> {
    row(&[
        (columns::TRIP_ID, id),
        (columns::FIRST_NAME, first),
        (columns::LAST_NAME, last),
        (columns::GROUP, group),
    ])
}

#[test]
fn full_name_is_trimmed_concatenation() {
    let projection = Projection::document(Vec::new());
    let records = projection.apply(&[trip("T1", "  Ana ", " Silva  ", "OPERACIONAL")]);
    assert_eq!(records[0].get("full_name"), Some("Ana Silva"));

    let records = projection.apply(&[trip("T2", "Ana", "", "OPERACIONAL")]);
    assert_eq!(records[0].get("full_name"), Some("Ana"));
}

#[test]
fn document_projection_is_total() {
    let projection = Projection::document(Vec::new());
    let records = projection.apply(&[row(&[])]);
    assert_eq!(records.len(), 1);
    let names = projection.field_names();
    assert_eq!(records[0].len(), names.len());
    for name in names {
        assert_eq!(records[0].get(name), Some(""), "field {name} not defaulted");
    }
}

#[test]
fn excluded_groups_are_dropped() {
    let projection = Projection::document(vec![
        "ADMINISTRATIVO".to_string(),
        "COMERCIAL".to_string(),
    ]);
    let rows = vec![
        trip("T1", "Ana", "Silva", "OPERACIONAL"),
        trip("T2", "Bia", "Souza", "ADMINISTRATIVO"),
        // The group field is trimmed before matching.
        trip("T3", "Caio", "Lima", "  COMERCIAL "),
    ];
    let records = projection.apply(&rows);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trip_id(), "T1");
    assert_eq!(records[0].get("full_name"), Some("Ana Silva"));
    for record in &records {
        assert_ne!(record.get("group"), Some("ADMINISTRATIVO"));
        assert_ne!(record.get("group"), Some("COMERCIAL"));
    }
}

#[test]
fn exclusion_match_is_case_sensitive() {
    let projection = Projection::document(vec!["ADMINISTRATIVO".to_string()]);
    let records = projection.apply(&[trip("T1", "Ana", "Silva", "administrativo")]);
    assert_eq!(records.len(), 1);
}

#[test]
fn sheet_projection_keeps_all_groups_and_marks_pending() {
    let projection = Projection::sheet();
    let records = projection.apply(&[trip("T1", "Ana", "Silva", "ADMINISTRATIVO")]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("verification_status"), Some(PENDING_MARKER));
    // Declared column order: trip id first, verification marker last.
    let values: Vec<&str> = records[0].values().collect();
    assert_eq!(values.first().copied(), Some("T1"));
    assert_eq!(values.last().copied(), Some(PENDING_MARKER));
}

#[test]
fn sheet_projection_keeps_keyless_rows() {
    let projection = Projection::sheet();
    let records = projection.apply(&[trip("", "Ana", "Silva", "OPERACIONAL")]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trip_id(), "");
}

#[test]
fn duplicate_trip_ids_pass_through_unchanged() {
    let projection = Projection::document(Vec::new());
    let rows = vec![
        trip("T1", "Ana", "Silva", "OPERACIONAL"),
        trip("T1", "Ana", "Silva", "OPERACIONAL"),
    ];
    assert_eq!(projection.apply(&rows).len(), 2);
}

#[test]
fn output_never_larger_than_input() {
    let projection = Projection::document(vec!["X".to_string()]);
    let rows: Vec<_> = (0..50)
        .map(|i| {
            let group = if i % 3 == 0 { "X" } else { "Y" };
            trip(&format!("T{i}"), "A", "B", group)
        })
        .collect();
    let records = projection.apply(&rows);
    assert!(records.len() <= rows.len());
    // Surviving order matches input order.
    let ids: Vec<&str> = records.iter().map(|r| r.trip_id()).collect();
    let mut sorted = ids.clone();
    sorted.sort_by_key(|id| id[1..].parse::<u32>().unwrap());
    assert_eq!(ids, sorted);
}

#[test]
fn unknown_source_columns_are_dropped() {
    let projection = Projection::document(Vec::new());
    let mut source = trip("T1", "Ana", "Silva", "OPERACIONAL");
    source.insert("Coluna nova".to_string(), "x".to_string());
    let records = projection.apply(&[source]);
    assert_eq!(records[0].get("Coluna nova"), None);
}
