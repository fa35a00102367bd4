use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Time of day ─────────────────────────────────────────────────────────────

/// Wall-clock time with minute granularity, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, String> {
        if hour > 23 {
            return Err(format!("hour out of range: {}", hour));
        }
        if minute > 59 {
            return Err(format!("minute out of range: {}", minute));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got {:?}", s))?;
        let hour = h
            .parse::<u8>()
            .map_err(|_| format!("invalid hour in {:?}", s))?;
        let minute = m
            .parse::<u8>()
            .map_err(|_| format!("invalid minute in {:?}", s))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

// ── Availability ────────────────────────────────────────────────────────────

/// A participant's answer for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl Availability {
    fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some("available") => Availability::Available,
            Some("unavailable") => Availability::Unavailable,
            _ => Availability::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Availability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Availability::from_value(&v))
    }
}

/// Slot key (`2024-01-01-09:30`) to answer.
pub type AvailabilityMap = BTreeMap<String, Availability>;

/// Accepts flat `{slot_key: answer}` maps as well as the nested
/// `{date: {time: answer}}` shape, which is flattened to `date-time` keys.
/// Answers of any other shape read as `Unknown`; a non-object reads as empty.
fn lenient_availability<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<AvailabilityMap, D::Error> {
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(AvailabilityMap::new());
    };

    let mut map = AvailabilityMap::new();
    for (key, value) in entries {
        match value {
            Value::Object(times) => {
                for (time, answer) in times {
                    map.insert(format!("{}-{}", key, time), Availability::from_value(&answer));
                }
            }
            other => {
                map.insert(key, Availability::from_value(&other));
            }
        }
    }
    Ok(map)
}

// ── Participant ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_availability")]
    pub availability: AvailabilityMap,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            availability: AvailabilityMap::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn answer(mut self, slot_key: impl Into<String>, availability: Availability) -> Self {
        self.availability.insert(slot_key.into(), availability);
        self
    }
}

// ── Meeting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub name: String,
    pub organizer: String,
    pub dates: Vec<NaiveDate>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub participants: Vec<Participant>,
    /// Join link as reported by the server, if it sent one.
    pub join_url: Option<String>,
}

impl Meeting {
    /// Start of the earliest candidate slot, read as UTC.
    pub fn first_slot_start(&self) -> Option<DateTime<Utc>> {
        let date = self.dates.iter().min()?;
        let time = NaiveTime::from_hms_opt(
            self.start_time.hour().into(),
            self.start_time.minute().into(),
            0,
        )?;
        Some(date.and_time(time).and_utc())
    }

    /// Path participants use to open this meeting.
    pub fn share_path(&self) -> String {
        match &self.join_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("/meetings/{}", self.id),
        }
    }
}

/// What the organizer fills in before the server assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeeting {
    pub name: String,
    pub organizer: String,
    pub dates: Vec<NaiveDate>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

/// Server reply to a participant registration.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantAck {
    /// The whole meeting, updated with the new participant.
    Meeting(Meeting),
    /// Just the stored participant record.
    Participant(Participant),
    /// A bare acknowledgement such as `{"status": "success"}`.
    Accepted,
}
