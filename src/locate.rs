//! Expected-name computation and lookup in the remote directory listing.

use chrono::{Datelike, Days, NaiveDate};

use crate::source::RemoteFileDescriptor;

/// Name of the export covering calendar day `date`,
/// e.g. `daily_trips-2024_01_31.csv`.
pub fn export_name(date: NaiveDate) -> String {
    format!(
        "daily_trips-{}_{:02}_{:02}.csv",
        date.year(),
        date.month(),
        date.day()
    )
}

/// The calendar day a run picks up: the day before `today`.
///
/// `today` is the process-local calendar date. No conversion into the
/// schedule timezone happens here, so a process clock in a different zone
/// than the schedule shifts the target day with it.
pub fn target_date(today: NaiveDate) -> NaiveDate {
    today - Days::new(1)
}

/// Find the listing entry whose name matches exactly. Case-sensitive, no
/// pattern matching.
pub fn find_export<'a>(
    listing: &'a [RemoteFileDescriptor],
    name: &str,
) -> Option<&'a RemoteFileDescriptor> {
    listing.iter().find(|entry| entry.name == name)
}
