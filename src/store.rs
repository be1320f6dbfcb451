use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{Device, DeviceId, Event, NewEvent, RoomId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped onto the domain model.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Read access to device attributes.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Returns `None` for unknown and soft-deleted devices.
    async fn find_device(&self, id: DeviceId) -> Result<Option<Device>, StoreError>;
}

/// Append-only log of actuator events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// Non-deleted events recorded for `room_id`, ordered by
    /// `(created_date, id)`. Both bounds are inclusive; `None` leaves that
    /// side open.
    async fn find_room_events(
        &self,
        room_id: RoomId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StoreError>;

    /// Same as [`EventStore::find_room_events`], scoped to one device
    /// regardless of the room it was in.
    async fn find_device_events(
        &self,
        device_id: DeviceId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StoreError>;
}
