use std::time::Duration as StdDuration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{CalendarError, CalendarGateway};
use crate::config::AppConfig;
use crate::models::{Booking, BusyInterval};
use crate::services::google_auth::GoogleCredentials;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarGateway {
    /// `None` when OAuth credentials are absent from the environment.
    /// That is a recognized configuration state, not an error.
    credentials: Option<GoogleCredentials>,
    calendar_id: String,
    utc_offset_minutes: i64,
    client: reqwest::Client,
}

impl GoogleCalendarGateway {
    pub fn from_config(config: &AppConfig) -> Self {
        let credentials = if config.calendar_configured() {
            Some(GoogleCredentials {
                client_id: config.google_client_id.clone(),
                client_secret: config.google_client_secret.clone(),
                refresh_token: config.google_refresh_token.clone(),
            })
        } else {
            None
        };

        Self {
            credentials,
            calendar_id: config.google_calendar_id.clone(),
            utc_offset_minutes: config.utc_offset_minutes,
            client: reqwest::Client::builder()
                .timeout(StdDuration::from_secs(config.http_timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }

    fn to_rfc3339(&self, local: NaiveDateTime) -> String {
        let utc = Utc.from_utc_datetime(&(local - Duration::minutes(self.utc_offset_minutes)));
        utc.to_rfc3339()
    }

    fn to_local(&self, rfc3339: &str) -> Option<NaiveDateTime> {
        DateTime::parse_from_rfc3339(rfc3339)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).naive_utc() + Duration::minutes(self.utc_offset_minutes))
    }

    async fn query_busy(
        &self,
        credentials: &GoogleCredentials,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> anyhow::Result<Vec<BusyInterval>> {
        let access_token = credentials.fetch_access_token(&self.client).await?;

        let body = json!({
            "timeMin": self.to_rfc3339(range_start),
            "timeMax": self.to_rfc3339(range_end),
            "items": [{ "id": self.calendar_id }],
        });

        let resp = self
            .client
            .post(format!("{CALENDAR_API_BASE}/freeBusy"))
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await
            .context("failed to call freeBusy endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("freeBusy query error ({status}): {body}");
        }

        let data: FreeBusyResponse = resp
            .json()
            .await
            .context("failed to parse freeBusy response")?;

        let busy = data
            .calendars
            .get(&self.calendar_id)
            .map(|c| c.busy.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|span| {
                Some(BusyInterval {
                    start: self.to_local(&span.start)?,
                    end: self.to_local(&span.end)?,
                })
            })
            .collect();

        Ok(busy)
    }

    async fn insert_event(
        &self,
        credentials: &GoogleCredentials,
        booking: &Booking,
        service_name: &str,
    ) -> anyhow::Result<String> {
        let access_token = credentials.fetch_access_token(&self.client).await?;

        let start = booking.appointment_date;
        let end = start + Duration::hours(1);

        let description = match &booking.notes {
            Some(notes) => format!(
                "{service_name} for {}\nPhone: {}\nNotes: {notes}",
                booking.client_name, booking.client_phone
            ),
            None => format!(
                "{service_name} for {}\nPhone: {}",
                booking.client_name, booking.client_phone
            ),
        };

        let body = json!({
            "summary": format!("{service_name}: {}", booking.client_name),
            "description": description,
            "start": { "dateTime": self.to_rfc3339(start) },
            "end": { "dateTime": self.to_rfc3339(end) },
            "attendees": [{ "email": booking.client_email }],
        });

        // sendUpdates=all lets the calendar service deliver its own invite.
        let resp = self
            .client
            .post(format!(
                "{CALENDAR_API_BASE}/calendars/{}/events?sendUpdates=all",
                self.calendar_id
            ))
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await
            .context("failed to call events insert endpoint")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("event insert error ({status}): {body}");
        }

        let event: InsertedEvent = resp
            .json()
            .await
            .context("failed to parse inserted event")?;

        Ok(event.id)
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendarGateway {
    async fn get_busy_intervals(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<BusyInterval>, CalendarError> {
        let credentials = match &self.credentials {
            Some(c) => c,
            None => return Ok(vec![]),
        };

        self.query_busy(credentials, range_start, range_end)
            .await
            .map_err(|e| CalendarError::Unavailable(e.to_string()))
    }

    async fn create_event(
        &self,
        booking: &Booking,
        service_name: &str,
    ) -> Result<Option<String>, CalendarError> {
        let credentials = match &self.credentials {
            Some(c) => c,
            None => return Ok(None),
        };

        let start = booking.appointment_date;
        let end = start + Duration::hours(1);

        // Conflict gate. A failed re-check means overlap status is unknown,
        // so it fails closed rather than risking a double-booking.
        let busy = self
            .query_busy(credentials, start, end)
            .await
            .map_err(|e| CalendarError::Indeterminate(e.to_string()))?;

        if busy.iter().any(|b| b.start < end && b.end > start) {
            return Err(CalendarError::Conflict);
        }

        // Past this point the slot is clear; a failed insert only costs the
        // calendar entry, not the booking.
        match self.insert_event(credentials, booking, service_name).await {
            Ok(event_id) => Ok(Some(event_id)),
            Err(e) => {
                tracing::warn!(error = %e, booking_id = %booking.id, "calendar event creation failed, booking proceeds without sync");
                Ok(None)
            }
        }
    }
}

#[derive(Deserialize)]
struct FreeBusyResponse {
    calendars: std::collections::HashMap<String, CalendarBusy>,
}

#[derive(Deserialize)]
struct CalendarBusy {
    #[serde(default)]
    busy: Vec<BusySpan>,
}

#[derive(Deserialize)]
struct InsertedEvent {
    id: String,
}

#[derive(Deserialize)]
struct BusySpan {
    start: String,
    end: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;

    fn unconfigured() -> GoogleCalendarGateway {
        GoogleCalendarGateway {
            credentials: None,
            calendar_id: "primary".to_string(),
            utc_offset_minutes: 0,
            client: reqwest::Client::new(),
        }
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_busy_query_is_empty_not_error() {
        let gateway = unconfigured();
        let busy = gateway
            .get_busy_intervals(dt("2030-06-03 00:00"), dt("2030-06-04 00:00"))
            .await
            .unwrap();
        assert!(busy.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_create_event_returns_none() {
        let gateway = unconfigured();
        let now = chrono::Utc::now().naive_utc();
        let booking = Booking {
            id: "b1".to_string(),
            service_id: "svc-consult".to_string(),
            client_name: "Alice".to_string(),
            client_email: "alice@example.com".to_string(),
            client_phone: "+15551110000".to_string(),
            appointment_date: dt("2030-06-03 10:00"),
            notes: None,
            status: BookingStatus::Pending,
            confirmed: false,
            calendar_event_id: None,
            created_at: now,
            updated_at: now,
        };

        let result = gateway.create_event(&booking, "Consultation").await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_rfc3339_round_trip_with_offset() {
        let gateway = GoogleCalendarGateway {
            credentials: None,
            calendar_id: "primary".to_string(),
            utc_offset_minutes: -300,
            client: reqwest::Client::new(),
        };

        let local = dt("2030-06-03 10:00");
        let encoded = gateway.to_rfc3339(local);
        assert!(encoded.starts_with("2030-06-03T15:00:00"));
        assert_eq!(gateway.to_local(&encoded), Some(local));
    }
}
