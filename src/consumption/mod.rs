pub mod calculator;
pub mod service;
pub mod window;

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::models::DeviceId;

pub use calculator::{
    compute_consumption, consumption_report, ConsumptionReport, DeviceConsumption, DeviceLookup,
};
pub use service::{ConsumptionService, ServiceError};
pub use window::{ConsumptionWindow, EndDatePolicy};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsumptionError {
    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The end date cannot be extended to the following midnight.
    #[error("date {0} is out of range")]
    DateOutOfRange(NaiveDate),

    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    #[error("device {0} has no power consumption rating")]
    MissingPowerRating(DeviceId),
}
