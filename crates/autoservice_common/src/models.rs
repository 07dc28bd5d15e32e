// --- File: crates/autoservice_common/src/models.rs ---

// Data structures shared by the booking widgets and the admin console.
// Everything that crosses the wire to the spreadsheet backend lives here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A bookable start time, rendered as "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Builds a slot from hour and minute; `None` for impossible clock times.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M").map(Self)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A customer appointment request as it is sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    /// Normalized phone number, exactly 11 digits starting with 7.
    pub phone: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeSlot>,
    pub service: String,
    pub car_model: String,
    #[serde(default)]
    pub comments: String,
    pub timestamp: DateTime<Utc>,
    /// Client-generated id, identical for every retry of the same submission.
    pub request_id: Uuid,
}

/// Where the current booking status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusSource {
    Backend,
    /// The backend could not be asked; the gate failed closed.
    Fallback,
}

/// Whether new bookings are accepted at the moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatus {
    pub is_active: bool,
    pub message: String,
    pub source: StatusSource,
}

/// Availability of a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayAvailability {
    /// Number of free slots reported by the backend.
    Open(u32),
    DayOff,
    /// Nothing authoritative is known about this day.
    Unknown,
}

/// What the slot endpoint said about a single date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAnswer {
    /// The slots a customer may pick.
    Available(Vec<TimeSlot>),
    /// The slots that are already taken; everything else on the grid is free.
    Occupied(Vec<TimeSlot>),
    DayOff,
}

/// One row of the admin "recent bookings" list. The backend may omit any column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub car_model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comments: Option<String>,
}

/// Spreadsheet cells come back as strings, numbers or null; keep them as text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
