use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::store::StoreError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Primary key of a row in `devices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

/// Primary key of a row in `rooms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub i64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// What an actuator did. Stored as the text `"ON"` / `"OFF"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventAction {
    #[serde(rename = "ON")]
    TurnOn,
    #[serde(rename = "OFF")]
    TurnOff,
}

impl EventAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EventAction::TurnOn => "ON",
            EventAction::TurnOff => "OFF",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event action: {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for EventAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" => Ok(Self::TurnOn),
            "OFF" => Ok(Self::TurnOff),
            other => Err(UnknownAction(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub device_id: DeviceId,
    /// Room the device was installed in when the event was recorded.
    pub room_id: Option<RoomId>,
    pub action: EventAction,
    pub created_date: DateTime<Utc>,
}

/// An event that has not been stored yet; the store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub device_id: DeviceId,
    pub room_id: Option<RoomId>,
    pub action: EventAction,
    pub created_date: DateTime<Utc>,
}

/// Raw `events` row. Converted with `TryFrom` so unknown actions never leave
/// the store.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub device_id: i64,
    pub room_id: Option<i64>,
    pub action: String,
    pub created_date: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let action = row.action.parse::<EventAction>().map_err(|e| {
            StoreError::InvalidRecord(format!("event {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            device_id: DeviceId(row.device_id),
            room_id: row.room_id.map(RoomId),
            action,
            created_date: row.created_date,
        })
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// Stored as the text `"SENSOR"` / `"ACTUATOR"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceCategory {
    Sensor,
    Actuator,
}

impl FromStr for DeviceCategory {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SENSOR" => Ok(Self::Sensor),
            "ACTUATOR" => Ok(Self::Actuator),
            other => Err(StoreError::InvalidRecord(format!(
                "unknown device category: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub organization_id: i64,
    pub room_id: Option<RoomId>,
    pub category: DeviceCategory,
    /// Energy per hour while switched on. Always set for actuators.
    pub power_consumption: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DeviceRow {
    pub id: i64,
    pub organization_id: i64,
    pub room_id: Option<i64>,
    pub category: String,
    pub power_consumption: Option<f64>,
}

impl TryFrom<DeviceRow> for Device {
    type Error = StoreError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DeviceId(row.id),
            organization_id: row.organization_id,
            room_id: row.room_id.map(RoomId),
            category: row.category.parse()?,
            power_consumption: row.power_consumption,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_row(action: &str) -> EventRow {
        EventRow {
            id: 7,
            device_id: 3,
            room_id: Some(1),
            action: action.to_owned(),
            created_date: Utc::now(),
        }
    }

    #[test]
    fn action_parses_wire_strings() {
        assert_eq!("ON".parse::<EventAction>().unwrap(), EventAction::TurnOn);
        assert_eq!("OFF".parse::<EventAction>().unwrap(), EventAction::TurnOff);
    }

    #[test]
    fn action_rejects_anything_else() {
        let err = "on".parse::<EventAction>().unwrap_err();
        assert_eq!(err, UnknownAction("on".into()));
        assert!("TOGGLE".parse::<EventAction>().is_err());
    }

    #[test]
    fn action_serializes_as_wire_string() {
        assert_eq!(serde_json::to_string(&EventAction::TurnOn).unwrap(), "\"ON\"");
        assert_eq!(EventAction::TurnOff.to_string(), "OFF");
    }

    #[test]
    fn event_row_converts_to_event() {
        let event = Event::try_from(event_row("OFF")).unwrap();
        assert_eq!(event.device_id, DeviceId(3));
        assert_eq!(event.room_id, Some(RoomId(1)));
        assert_eq!(event.action, EventAction::TurnOff);
    }

    #[test]
    fn event_row_with_bad_action_is_invalid_record() {
        let err = Event::try_from(event_row("BLINK")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(msg) if msg.contains("event 7")));
    }

    #[test]
    fn device_row_converts_category() {
        let row = DeviceRow {
            id: 3,
            organization_id: 1,
            room_id: None,
            category: "ACTUATOR".into(),
            power_consumption: Some(1.5),
        };
        let device = Device::try_from(row).unwrap();
        assert_eq!(device.category, DeviceCategory::Actuator);
        assert_eq!(device.room_id, None);
        assert_eq!(device.power_consumption, Some(1.5));
    }

    #[test]
    fn device_row_with_unknown_category_errors() {
        let row = DeviceRow {
            id: 3,
            organization_id: 1,
            room_id: None,
            category: "GATEWAY".into(),
            power_consumption: None,
        };
        assert!(Device::try_from(row).is_err());
    }
}
