use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use super::ConsumptionError;

/// How a day-granularity end date is turned into an instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EndDatePolicy {
    /// The end date is covered in full: the window ends at the following
    /// midnight.
    #[default]
    Inclusive,
    /// The window ends at the first instant of the end date.
    Exclusive,
}

impl FromStr for EndDatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "inclusive" => Ok(Self::Inclusive),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(anyhow::anyhow!("unknown end date policy: {other:?}")),
        }
    }
}

/// Reporting window `[start, end]` in UTC. Construction guarantees
/// `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsumptionWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ConsumptionWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConsumptionError> {
        if start > end {
            return Err(ConsumptionError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Expand `YYYY-MM-DD` dates to instants. `start` always maps to its own
    /// midnight; `end` follows `policy`.
    pub fn from_dates(
        start: NaiveDate,
        end: NaiveDate,
        policy: EndDatePolicy,
    ) -> Result<Self, ConsumptionError> {
        let end_day = match policy {
            EndDatePolicy::Inclusive => end
                .checked_add_days(Days::new(1))
                .ok_or(ConsumptionError::DateOutOfRange(end))?,
            EndDatePolicy::Exclusive => end,
        };
        Self::new(midnight(start), midnight(end_day))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Intersect `[from, to)` with the window and return the overlap in
    /// hours, or `None` when nothing is left.
    pub(crate) fn clip_hours(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<f64> {
        let effective_start = from.max(self.start);
        let effective_end = to.min(self.end);
        if effective_start < effective_end {
            let millis = (effective_end - effective_start).num_milliseconds();
            Some(millis as f64 / 3_600_000.0)
        } else {
            None
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
