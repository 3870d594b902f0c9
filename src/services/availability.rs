use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{generate_slots, AppointmentWindow, TimeSlot};
use crate::services::calendar::CalendarGateway;

/// The bookable slots for one day: generated business-hours slots minus
/// anything the external calendar reports as busy.
///
/// The read path is optimistic: a failed busy-interval query degrades to the
/// generator's output unchanged. Only the booking commit path is allowed to
/// reject on calendar trouble.
pub async fn get_available_slots(
    calendar: &dyn CalendarGateway,
    date: NaiveDate,
    window: &AppointmentWindow,
    now: NaiveDateTime,
) -> Vec<TimeSlot> {
    let mut slots = generate_slots(date, window, now);

    let day_start = date.and_hms_opt(0, 0, 0).unwrap_or(now);
    let day_end = day_start + Duration::days(1);

    let busy = match calendar.get_busy_intervals(day_start, day_end).await {
        Ok(busy) => busy,
        Err(e) => {
            tracing::warn!(error = %e, date = %date, "busy-interval query failed, serving unfiltered availability");
            return slots;
        }
    };

    for slot in &mut slots {
        if busy.iter().any(|b| b.covers(slot.start_time)) {
            slot.available = false;
        }
    }

    slots.sort_by_key(|s| s.start_time);
    slots.dedup_by_key(|s| s.start_time);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    use crate::models::{Booking, BusyInterval};
    use crate::services::calendar::CalendarError;

    struct ScriptedCalendar {
        busy: Vec<BusyInterval>,
        fail: bool,
    }

    #[async_trait]
    impl CalendarGateway for ScriptedCalendar {
        async fn get_busy_intervals(
            &self,
            _range_start: NaiveDateTime,
            _range_end: NaiveDateTime,
        ) -> Result<Vec<BusyInterval>, CalendarError> {
            if self.fail {
                return Err(CalendarError::Unavailable("connection refused".to_string()));
            }
            Ok(self.busy.clone())
        }

        async fn create_event(
            &self,
            _booking: &Booking,
            _service_name: &str,
        ) -> Result<Option<String>, CalendarError> {
            Ok(None)
        }
    }

    fn window() -> AppointmentWindow {
        AppointmentWindow {
            open_hour: 9,
            close_hour: 17,
            slot_hours: 1,
        }
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_busy_interval_excludes_slot() {
        // Calendar reports 10:00-11:00 busy: the 10:00 slot is out, the
        // other seven stay in.
        let calendar = ScriptedCalendar {
            busy: vec![BusyInterval {
                start: dt("2030-06-01 10:00"),
                end: dt("2030-06-01 11:00"),
            }],
            fail: false,
        };

        let slots =
            get_available_slots(&calendar, date("2030-06-01"), &window(), dt("2030-01-01 08:00"))
                .await;

        assert_eq!(slots.len(), 8);
        let ten = slots.iter().find(|s| s.start_time == dt("2030-06-01 10:00")).unwrap();
        assert!(!ten.available);
        assert_eq!(slots.iter().filter(|s| s.available).count(), 7);
    }

    #[tokio::test]
    async fn test_slot_outside_busy_intervals_included() {
        let calendar = ScriptedCalendar {
            busy: vec![BusyInterval {
                start: dt("2030-06-01 10:30"),
                end: dt("2030-06-01 11:30"),
            }],
            fail: false,
        };

        let slots =
            get_available_slots(&calendar, date("2030-06-01"), &window(), dt("2030-01-01 08:00"))
                .await;

        // 11:00 falls inside [10:30, 11:30); 10:00 does not.
        let ten = slots.iter().find(|s| s.start_time == dt("2030-06-01 10:00")).unwrap();
        let eleven = slots.iter().find(|s| s.start_time == dt("2030-06-01 11:00")).unwrap();
        assert!(ten.available);
        assert!(!eleven.available);
    }

    #[tokio::test]
    async fn test_gateway_failure_degrades_to_generator_output() {
        let calendar = ScriptedCalendar {
            busy: vec![],
            fail: true,
        };

        let slots =
            get_available_slots(&calendar, date("2030-06-01"), &window(), dt("2030-01-01 08:00"))
                .await;

        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_idempotent_for_same_inputs() {
        let busy = vec![BusyInterval {
            start: dt("2030-06-01 14:00"),
            end: dt("2030-06-01 15:00"),
        }];
        let calendar = ScriptedCalendar {
            busy,
            fail: false,
        };

        let now = dt("2030-01-01 08:00");
        let a = get_available_slots(&calendar, date("2030-06-01"), &window(), now).await;
        let b = get_available_slots(&calendar, date("2030-06-01"), &window(), now).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_ordering_preserved_after_merge() {
        let calendar = ScriptedCalendar {
            busy: vec![],
            fail: false,
        };

        let slots =
            get_available_slots(&calendar, date("2030-06-01"), &window(), dt("2030-01-01 08:00"))
                .await;

        for pair in slots.windows(2) {
            assert!(pair[0].start_time < pair[1].start_time);
        }
    }
}
