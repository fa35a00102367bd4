use chrono::NaiveDate;
use serde::Serialize;

use super::types::{AvailabilityMap, Meeting, TimeOfDay};

/// Minutes offered inside every hour of the window.
pub const SLOT_MINUTES: [u8; 2] = [0, 30];

/// One selectable half-hour on one candidate date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub key: String,
}

pub fn slot_key(date: NaiveDate, time: TimeOfDay) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), time)
}

/// Expand a meeting's dates and daily window into slots.
///
/// Iteration is per whole hour: the window runs from the start hour
/// (inclusive) to the end hour (exclusive) and the minutes of both bounds
/// are ignored, so an end of `17:15` yields the same slots as `17:00`.
/// Order is input date order, then hour, then `:00` before `:30`.
pub fn derive_slots(meeting: Option<&Meeting>) -> Vec<Slot> {
    let Some(meeting) = meeting else {
        return Vec::new();
    };

    let start_hour = meeting.start_time.hour();
    let end_hour = meeting.end_time.hour();
    let mut slots = Vec::new();

    for &date in &meeting.dates {
        for hour in start_hour..end_hour {
            for minute in SLOT_MINUTES {
                // Bounded by end_hour <= 23 and minute in SLOT_MINUTES.
                let Ok(time) = TimeOfDay::new(hour, minute) else {
                    continue;
                };
                slots.push(Slot {
                    date,
                    time,
                    key: slot_key(date, time),
                });
            }
        }
    }

    slots
}

/// Keys in `availability` that are not slots of `meeting`, in key order.
pub fn unknown_slot_keys(meeting: &Meeting, availability: &AvailabilityMap) -> Vec<String> {
    let slots = derive_slots(Some(meeting));
    availability
        .keys()
        .filter(|key| !slots.iter().any(|slot| &slot.key == *key))
        .cloned()
        .collect()
}
