//! Projection of parsed rows onto the declared output schemas.
//!
//! Two schemas exist, one per destination. Both are total: every declared
//! field is present on every output record, defaulting to the empty string
//! when the source lacks the column. All values are carried as strings;
//! coercion is left to the destination.

use crate::ingest::RawRecord;

/// Source column names, as they appear in the export header.
pub mod columns {
    pub const TRIP_ID: &str = "ID da viagem/Uber Eats";
    pub const FIRST_NAME: &str = "Nome";
    pub const LAST_NAME: &str = "Sobrenome";
    pub const GROUP: &str = "Grupo";
    pub const SERVICE: &str = "Serviço";
    pub const CITY: &str = "Cidade";
    pub const COUNTRY: &str = "País";
    pub const DISTANCE_MI: &str = "Distância (mi)";
    pub const DURATION_MIN: &str = "Duração (min)";
    pub const PICKUP_ADDRESS: &str = "Endereço de partida";
    pub const DROPOFF_ADDRESS: &str = "Endereço de destino";
    pub const TRANSACTION_UTC: &str = "Carimbo de data/hora da transação (UTC)";
    pub const ARRIVAL_UTC: &str = "Data/hora de chegada (UTC)";
    pub const ARRIVAL_LOCAL: &str = "Data/hora de chegada (local)";
    pub const REQUEST_LOCAL: &str = "Data/hora da solicitação (local)";
    pub const TOTAL_VALUE: &str = "Valor total";
    pub const OTHER_CHARGES: &str = "Outras taxas";
}

/// Marker written to every sheet row's verification column.
pub const PENDING_MARKER: &str = "PENDENTE";

/// How one output field gets its value.
#[derive(Debug, Clone)]
enum FieldSource {
    /// Copy the named source column; empty string when absent.
    Column(&'static str),
    /// Trimmed `"{first} {last}"`, itself trimmed.
    FullName,
    /// Fixed value applied to every record.
    Constant(&'static str),
}

#[derive(Debug, Clone)]
struct FieldSpec {
    name: &'static str,
    source: FieldSource,
}

/// A fixed output schema plus an optional group-exclusion filter.
#[derive(Debug, Clone)]
pub struct Projection {
    fields: Vec<FieldSpec>,
    excluded_groups: Vec<String>,
}

/// One output record. Field order follows the projection's declared schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedRecord {
    fields: Vec<(&'static str, String)>,
}

impl ProjectedRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    /// The natural key used for idempotent upserts. Empty when the source
    /// row carried none.
    pub fn trip_id(&self) -> &str {
        self.get("trip_id").unwrap_or("")
    }

    /// Values in declared schema order, for the tabular push.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// `(name, value)` pairs in declared schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Projection {
    /// Output schema for the reporting-sheet push. No group filter; rows
    /// without a trip id are still accepted on this path.
    pub fn sheet() -> Self {
        use FieldSource::{Column, Constant};
        Self {
            fields: vec![
                field("trip_id", Column(columns::TRIP_ID)),
                field("transaction_utc", Column(columns::TRANSACTION_UTC)),
                field("arrival_utc", Column(columns::ARRIVAL_UTC)),
                field("arrival_local", Column(columns::ARRIVAL_LOCAL)),
                field("first_name", Column(columns::FIRST_NAME)),
                field("last_name", Column(columns::LAST_NAME)),
                field("group", Column(columns::GROUP)),
                field("service", Column(columns::SERVICE)),
                field("city", Column(columns::CITY)),
                field("country", Column(columns::COUNTRY)),
                field("distance_mi", Column(columns::DISTANCE_MI)),
                field("duration_min", Column(columns::DURATION_MIN)),
                field("pickup_address", Column(columns::PICKUP_ADDRESS)),
                field("dropoff_address", Column(columns::DROPOFF_ADDRESS)),
                field("other_charges", Column(columns::OTHER_CHARGES)),
                field("verification_status", Constant(PENDING_MARKER)),
            ],
            excluded_groups: Vec::new(),
        }
    }

    /// Output schema for the document-store upsert, dropping rows whose
    /// group is in `excluded_groups`.
    pub fn document(excluded_groups: Vec<String>) -> Self {
        use FieldSource::{Column, FullName};
        Self {
            fields: vec![
                field("trip_id", Column(columns::TRIP_ID)),
                field("request_local", Column(columns::REQUEST_LOCAL)),
                field("arrival_local", Column(columns::ARRIVAL_LOCAL)),
                field("full_name", FullName),
                field("group", Column(columns::GROUP)),
                field("service", Column(columns::SERVICE)),
                field("city", Column(columns::CITY)),
                field("country", Column(columns::COUNTRY)),
                field("distance_mi", Column(columns::DISTANCE_MI)),
                field("duration_min", Column(columns::DURATION_MIN)),
                field("pickup_address", Column(columns::PICKUP_ADDRESS)),
                field("dropoff_address", Column(columns::DROPOFF_ADDRESS)),
                field("total_value", Column(columns::TOTAL_VALUE)),
            ],
            excluded_groups,
        }
    }

    /// Declared output field names, in schema order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// Filter then project. Input order is preserved; output is never
    /// larger than input. Duplicate trip ids pass through unchanged;
    /// dedup belongs to the idempotent sink.
    pub fn apply(&self, rows: &[RawRecord]) -> Vec<ProjectedRecord> {
        rows.iter()
            .filter(|row| self.keeps(row))
            .map(|row| self.project(row))
            .collect()
    }

    fn keeps(&self, row: &RawRecord) -> bool {
        if self.excluded_groups.is_empty() {
            return true;
        }
        let group = row.get(columns::GROUP).map(|g| g.trim()).unwrap_or("");
        !self.excluded_groups.iter().any(|excluded| excluded == group)
    }

    fn project(&self, row: &RawRecord) -> ProjectedRecord {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let value = match field.source {
                    FieldSource::Column(column) => row.get(column).cloned().unwrap_or_default(),
                    FieldSource::FullName => full_name(row),
                    FieldSource::Constant(value) => value.to_string(),
                };
                (field.name, value)
            })
            .collect();
        ProjectedRecord { fields }
    }
}

fn field(name: &'static str, source: FieldSource) -> FieldSpec {
    FieldSpec { name, source }
}

fn full_name(row: &RawRecord) -> String {
    let first = row.get(columns::FIRST_NAME).map(|s| s.trim()).unwrap_or("");
    let last = row.get(columns::LAST_NAME).map(|s| s.trim()).unwrap_or("");
    format!("{first} {last}").trim().to_string()
}
