pub mod google;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{Booking, BusyInterval};

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The requested slot overlaps an existing calendar event.
    #[error("time slot is already booked")]
    Conflict,

    /// The calendar service could not be reached. Callers on the read path
    /// absorb this; the write path ignores it once the conflict check passed.
    #[error("calendar service unavailable: {0}")]
    Unavailable(String),

    /// The conflict re-check itself failed, so overlap status is unknown.
    /// The booking flow must fail closed on this.
    #[error("could not verify slot availability: {0}")]
    Indeterminate(String),
}

/// Boundary to the external calendar. The calendar is the source of truth
/// for slot conflicts; everything else it offers is an enhancement.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Busy spans within `[range_start, range_end)`. An unconfigured
    /// service yields an empty list, never an error: availability degrades
    /// to "all business hours are bookable", not to "nothing is bookable".
    async fn get_busy_intervals(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<BusyInterval>, CalendarError>;

    /// Re-checks the booking's slot for overlap, then creates the event with
    /// the client invited as attendee. Returns the event id, or `None` when
    /// the service is unconfigured or the insert failed after a clean
    /// conflict check.
    async fn create_event(
        &self,
        booking: &Booking,
        service_name: &str,
    ) -> Result<Option<String>, CalendarError>;
}
