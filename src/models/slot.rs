use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Business-hours policy: fixed daily window, fixed slot granularity.
#[derive(Debug, Clone)]
pub struct AppointmentWindow {
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_hours: u32,
}

/// A candidate appointment start time for one day. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: NaiveDateTime,
    pub label: String,
    pub available: bool,
}

/// A busy span reported by the external calendar. Half-open: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BusyInterval {
    pub fn covers(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// One slot per granularity step in `[open_hour, close_hour)`, ascending.
/// Slots starting strictly before `now` are marked unavailable, which only
/// matters when `date` is today. An inverted window yields no slots.
pub fn generate_slots(
    date: NaiveDate,
    window: &AppointmentWindow,
    now: NaiveDateTime,
) -> Vec<TimeSlot> {
    if window.slot_hours == 0 || window.close_hour <= window.open_hour {
        return vec![];
    }

    let mut slots = vec![];
    let mut hour = window.open_hour;
    while hour < window.close_hour {
        let start_time = match date.and_hms_opt(hour, 0, 0) {
            Some(dt) => dt,
            None => break,
        };
        slots.push(TimeSlot {
            start_time,
            label: format_label(&start_time),
            available: start_time >= now,
        });
        hour += window.slot_hours;
    }

    slots
}

fn format_label(dt: &NaiveDateTime) -> String {
    // "9:00 AM" rather than "09:00 AM"
    dt.format("%-I:%M %p").to_string()
}
