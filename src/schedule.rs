//! Recurring run schedule: a cron expression evaluated in a fixed timezone.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::{SyncError, SyncResult};

#[derive(Debug, Clone)]
pub struct RunSchedule {
    schedule: Schedule,
    tz: Tz,
}

impl RunSchedule {
    pub fn new(expr: &str, tz: Tz) -> SyncResult<Self> {
        let schedule =
            Schedule::from_str(expr).map_err(|e| SyncError::Schedule(e.to_string()))?;
        Ok(Self { schedule, tz })
    }

    /// Next fire time strictly after `now`, or `None` when the expression
    /// has no future occurrences.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&now.with_timezone(&self.tz))
            .next()
            .map(|tick| tick.with_timezone(&Utc))
    }

    /// Sleep until the next tick and return it.
    pub async fn wait_next(&self) -> Option<DateTime<Utc>> {
        let next = self.next_after(Utc::now())?;
        let delay = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Some(next)
    }
}
