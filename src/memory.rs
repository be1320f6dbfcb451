use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db::models::{Device, DeviceId, Event, NewEvent, RoomId},
    store::{DeviceRegistry, EventStore, StoreError},
};

/// In-memory device registry.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
#[derive(Clone, Default)]
pub struct InMemoryDeviceRegistry {
    inner: Arc<RwLock<HashMap<DeviceId, Device>>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the device with `device.id`.
    pub async fn insert(&self, device: Device) {
        self.inner.write().await.insert(device.id, device);
    }

    /// Forget a device; later lookups behave as if it was soft-deleted.
    pub async fn remove(&self, id: DeviceId) -> Option<Device> {
        self.inner.write().await.remove(&id)
    }
}

#[async_trait]
impl DeviceRegistry for InMemoryDeviceRegistry {
    async fn find_device(&self, id: DeviceId) -> Result<Option<Device>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
struct EventLog {
    next_id: i64,
    events: Vec<Event>,
}

/// In-memory append-only event log. Ids are assigned in insertion order
/// starting at 1.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    inner: Arc<RwLock<EventLog>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored event in insertion order.
    pub async fn all(&self) -> Vec<Event> {
        self.inner.read().await.events.clone()
    }

    async fn select(
        &self,
        matches: impl Fn(&Event) -> bool,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<Event> {
        let log = self.inner.read().await;
        let mut events: Vec<Event> = log
            .events
            .iter()
            .filter(|e| matches(e))
            .filter(|e| from.map_or(true, |f| e.created_date >= f))
            .filter(|e| to.map_or(true, |t| e.created_date <= t))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.created_date, e.id));
        events
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut log = self.inner.write().await;
        log.next_id += 1;
        let stored = Event {
            id: log.next_id,
            device_id: event.device_id,
            room_id: event.room_id,
            action: event.action,
            created_date: event.created_date,
        };
        log.events.push(stored.clone());
        Ok(stored)
    }

    async fn find_room_events(
        &self,
        room_id: RoomId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .select(|e| e.room_id == Some(room_id), from, to)
            .await)
    }

    async fn find_device_events(
        &self,
        device_id: DeviceId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StoreError> {
        Ok(self.select(|e| e.device_id == device_id, from, to).await)
    }
}
