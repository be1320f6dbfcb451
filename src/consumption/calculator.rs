use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::{ConsumptionError, ConsumptionWindow};
use crate::db::models::{Device, DeviceId, Event, EventAction};

/// Synchronous device-attribute lookup used by the calculator.
///
/// The service resolves devices from the async registry up front and hands
/// the result over as a map, so the calculator itself never awaits.
pub trait DeviceLookup {
    fn lookup(&self, id: DeviceId) -> Option<&Device>;
}

impl DeviceLookup for HashMap<DeviceId, Device> {
    fn lookup(&self, id: DeviceId) -> Option<&Device> {
        self.get(&id)
    }
}

impl DeviceLookup for BTreeMap<DeviceId, Device> {
    fn lookup(&self, id: DeviceId) -> Option<&Device> {
        self.get(&id)
    }
}

/// Energy attributed to a single device inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceConsumption {
    pub hours: f64,
    pub power_consumption: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionReport {
    pub window: ConsumptionWindow,
    pub total: f64,
    pub devices: BTreeMap<DeviceId, DeviceConsumption>,
}

/// Total energy (rating × hours switched on) consumed inside `window`.
///
/// See [`consumption_report`] for the per-device breakdown.
pub fn compute_consumption<L: DeviceLookup>(
    events: &[Event],
    window: &ConsumptionWindow,
    now: DateTime<Utc>,
    devices: &L,
) -> Result<f64, ConsumptionError> {
    consumption_report(events, window, now, devices).map(|r| r.total)
}

/// Pair TurnOn/TurnOff events per device, clip every on-interval to
/// `window` and multiply the hours by the device rating.
///
/// `events` may arrive in any order. They are processed by `created_date`,
/// with equal timestamps kept in insertion order (`id`). Devices still on
/// after the last event are counted up to `now`.
///
/// Every device referenced by an event must resolve through `devices` and
/// carry a power rating, otherwise the whole call fails.
pub fn consumption_report<L: DeviceLookup>(
    events: &[Event],
    window: &ConsumptionWindow,
    now: DateTime<Utc>,
    devices: &L,
) -> Result<ConsumptionReport, ConsumptionError> {
    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|e| (e.created_date, e.id));

    let mut ratings: BTreeMap<DeviceId, f64> = BTreeMap::new();
    let mut on_since: BTreeMap<DeviceId, DateTime<Utc>> = BTreeMap::new();
    let mut hours: BTreeMap<DeviceId, f64> = BTreeMap::new();

    for event in ordered {
        let device_id = event.device_id;
        if !ratings.contains_key(&device_id) {
            ratings.insert(device_id, power_rating(devices, device_id)?);
            hours.insert(device_id, 0.0);
        }

        match event.action {
            EventAction::TurnOn => {
                on_since.insert(device_id, event.created_date);
            }
            EventAction::TurnOff => match on_since.remove(&device_id) {
                Some(on) => {
                    if let Some(h) = window.clip_hours(on, event.created_date) {
                        *hours.entry(device_id).or_default() += h;
                    }
                }
                None => {
                    warn!(device_id = %device_id, event_id = event.id, "TurnOff without open interval ignored");
                }
            },
        }
    }

    for (device_id, on) in on_since {
        if let Some(h) = window.clip_hours(on, now) {
            debug!(device_id = %device_id, hours = h, "Device still on");
            *hours.entry(device_id).or_default() += h;
        }
    }

    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();
    for (device_id, h) in hours {
        let rating = ratings[&device_id];
        let energy = h * rating;
        debug!(device_id = %device_id, hours = h, energy, "Device consumption");
        total += energy;
        breakdown.insert(
            device_id,
            DeviceConsumption {
                hours: h,
                power_consumption: rating,
                energy,
            },
        );
    }

    Ok(ConsumptionReport {
        window: *window,
        total,
        devices: breakdown,
    })
}

fn power_rating<L: DeviceLookup>(devices: &L, id: DeviceId) -> Result<f64, ConsumptionError> {
    let device = devices
        .lookup(id)
        .ok_or(ConsumptionError::DeviceNotFound(id))?;
    device
        .power_consumption
        .ok_or(ConsumptionError::MissingPowerRating(id))
}
