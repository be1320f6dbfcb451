use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use tracing::info;

use super::{consumption_report, ConsumptionError, ConsumptionReport, ConsumptionWindow};
use crate::{
    db::models::{Device, DeviceId, RoomId},
    store::{DeviceRegistry, EventStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Consumption(#[from] ConsumptionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Computes room consumption from the event store and device registry.
///
/// Holds only shared handles to its collaborators, so clones are cheap and
/// independent calls never contend.
#[derive(Clone)]
pub struct ConsumptionService {
    registry: Arc<dyn DeviceRegistry>,
    events: Arc<dyn EventStore>,
}

impl ConsumptionService {
    pub fn new(registry: Arc<dyn DeviceRegistry>, events: Arc<dyn EventStore>) -> Self {
        Self { registry, events }
    }

    /// Total energy consumed in `room_id` during `window`, counting devices
    /// that are still on up to the current time.
    pub async fn room_consumption(
        &self,
        room_id: RoomId,
        window: &ConsumptionWindow,
    ) -> Result<f64, ServiceError> {
        Ok(self.room_report_at(room_id, window, Utc::now()).await?.total)
    }

    pub async fn room_report(
        &self,
        room_id: RoomId,
        window: &ConsumptionWindow,
    ) -> Result<ConsumptionReport, ServiceError> {
        self.room_report_at(room_id, window, Utc::now()).await
    }

    /// Same as [`Self::room_report`] with an explicit "now".
    ///
    /// Events recorded after `window.end()` cannot affect the result, so
    /// only the room's history up to the window end is fetched.
    pub async fn room_report_at(
        &self,
        room_id: RoomId,
        window: &ConsumptionWindow,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionReport, ServiceError> {
        info!(
            room_id = %room_id,
            start = %window.start(),
            end = %window.end(),
            "Calculating room power consumption"
        );

        let events = self
            .events
            .find_room_events(room_id, None, Some(window.end()))
            .await?;

        let device_ids: BTreeSet<DeviceId> = events.iter().map(|e| e.device_id).collect();
        let devices = self.resolve_devices(device_ids).await?;

        let report = consumption_report(&events, window, now, &devices)?;

        info!(
            room_id = %room_id,
            events = events.len(),
            devices = report.devices.len(),
            total = report.total,
            "Room power consumption calculated"
        );
        Ok(report)
    }

    /// Look every device up once. Fails on the first unknown id.
    async fn resolve_devices(
        &self,
        ids: BTreeSet<DeviceId>,
    ) -> Result<HashMap<DeviceId, Device>, ServiceError> {
        let mut devices = HashMap::with_capacity(ids.len());
        for id in ids {
            let device = self
                .registry
                .find_device(id)
                .await?
                .ok_or(ConsumptionError::DeviceNotFound(id))?;
            devices.insert(id, device);
        }
        Ok(devices)
    }
}
