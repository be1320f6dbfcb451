use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    db::models::{DeviceCategory, DeviceId, Event, EventAction, NewEvent, UnknownAction},
    store::{DeviceRegistry, EventStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    InvalidAction(#[from] UnknownAction),

    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    #[error("device {0} is not an actuator; only actuators can have events")]
    NotAnActuator(DeviceId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates and stores actuator on/off events.
#[derive(Clone)]
pub struct EventRecorder {
    registry: Arc<dyn DeviceRegistry>,
    events: Arc<dyn EventStore>,
}

impl EventRecorder {
    pub fn new(registry: Arc<dyn DeviceRegistry>, events: Arc<dyn EventStore>) -> Self {
        Self { registry, events }
    }

    /// Record `action` (`"ON"` or `"OFF"`) for `device_id` at the current
    /// time.
    pub async fn record(&self, device_id: DeviceId, action: &str) -> Result<Event, RecordError> {
        let action = action.parse::<EventAction>()?;
        self.record_at(device_id, action, Utc::now()).await
    }

    /// Stamp the event with `created_date` and the device's current room,
    /// then append it.
    pub async fn record_at(
        &self,
        device_id: DeviceId,
        action: EventAction,
        created_date: DateTime<Utc>,
    ) -> Result<Event, RecordError> {
        let device = self
            .registry
            .find_device(device_id)
            .await?
            .ok_or(RecordError::DeviceNotFound(device_id))?;

        if device.category != DeviceCategory::Actuator {
            warn!(device_id = %device_id, "Rejected event for non-actuator device");
            return Err(RecordError::NotAnActuator(device_id));
        }

        let event = self
            .events
            .append(NewEvent {
                device_id,
                room_id: device.room_id,
                action,
                created_date,
            })
            .await?;

        info!(
            device_id = %device_id,
            event_id = event.id,
            action = %event.action,
            "Event recorded"
        );
        Ok(event)
    }
}
