use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, FieldError};
use crate::models::{Booking, BookingStatus};
use crate::services::calendar::CalendarError;
use crate::services::notifications;
use crate::state::AppState;

pub const CONFLICT_MESSAGE: &str = "This time slot is already booked, please choose another";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub appointment_date: String,
    pub notes: Option<String>,
}

/// Validates, gates against the external calendar, persists, then fires the
/// confirmation email as a detached task. The returned booking is committed
/// whatever happens to the email.
pub async fn submit_booking(
    state: &Arc<AppState>,
    request: BookingRequest,
) -> Result<Booking, AppError> {
    let now = state.config.business_now();
    let appointment_date = validate(&request, now)?;

    let service = {
        let db = state.db.lock().unwrap();
        queries::get_service(&db, &request.service_id)
            .map_err(|e| AppError::Internal(e.to_string()))?
    };
    let service = match service {
        Some(s) if s.active => s,
        _ => return Err(AppError::NotFound("service not found".to_string())),
    };

    let mut booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        service_id: service.id.clone(),
        client_name: request.client_name.trim().to_string(),
        client_email: request.client_email.trim().to_string(),
        client_phone: request.client_phone.trim().to_string(),
        appointment_date,
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        status: BookingStatus::Pending,
        confirmed: false,
        calendar_event_id: None,
        created_at: now,
        updated_at: now,
    };

    // Authoritative conflict gate. Conflicts and indeterminate checks abort
    // before any local write; plain unavailability does not.
    match state.calendar.create_event(&booking, &service.name).await {
        Ok(event_id) => booking.calendar_event_id = event_id,
        Err(CalendarError::Conflict) => {
            return Err(AppError::Conflict(CONFLICT_MESSAGE.to_string()));
        }
        Err(CalendarError::Indeterminate(e)) => {
            tracing::error!(error = %e, "conflict check indeterminate, rejecting booking");
            return Err(AppError::Internal(
                "could not verify slot availability".to_string(),
            ));
        }
        Err(CalendarError::Unavailable(e)) => {
            tracing::warn!(error = %e, booking_id = %booking.id, "calendar unavailable, booking proceeds without sync");
        }
    }

    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking).map_err(|e| match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::Conflict(CONFLICT_MESSAGE.to_string())
            }
            other => AppError::Database(other),
        })?;
    }

    // Post-commit, fire-and-forget. The handler response does not wait on it.
    let task_state = Arc::clone(state);
    let task_booking = booking.clone();
    let service_name = service.name.clone();
    tokio::spawn(async move {
        notifications::send_booking_confirmation(
            task_state.mailer.as_ref(),
            &task_booking,
            &service_name,
            &task_state.config.business_name,
        )
        .await;
    });

    Ok(booking)
}

/// Admin transition: only `pending → confirmed` and `pending → cancelled`
/// are legal; terminal states stay put.
pub fn change_status(
    state: &Arc<AppState>,
    id: &str,
    next: BookingStatus,
) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, id)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if !booking.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "cannot change a {} booking to {}",
            booking.status.as_str(),
            next.as_str()
        )));
    }

    queries::update_booking_status(&db, id, next).map_err(|e| AppError::Internal(e.to_string()))?;

    queries::get_booking_by_id(&db, id)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))
}

fn validate(request: &BookingRequest, now: NaiveDateTime) -> Result<NaiveDateTime, AppError> {
    let mut errors = vec![];

    if request.client_name.trim().is_empty() {
        errors.push(FieldError::new("clientName", "name is required"));
    }

    if !email_is_plausible(request.client_email.trim()) {
        errors.push(FieldError::new("clientEmail", "a valid email is required"));
    }

    let digits = request
        .client_phone
        .chars()
        .filter(|c| c.is_ascii_digit())
        .count();
    if digits < 7 {
        errors.push(FieldError::new(
            "clientPhone",
            "a phone number with at least 7 digits is required",
        ));
    }

    let appointment_date = parse_appointment_date(&request.appointment_date);
    match appointment_date {
        None => errors.push(FieldError::new(
            "appointmentDate",
            "a valid date and time is required",
        )),
        Some(dt) if dt <= now => errors.push(FieldError::new(
            "appointmentDate",
            "the appointment must be in the future",
        )),
        Some(_) => {}
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // errors is empty, so the date parsed.
    appointment_date.ok_or_else(|| AppError::Internal("date validation slipped".to_string()))
}

fn email_is_plausible(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

fn parse_appointment_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn valid_request() -> BookingRequest {
        BookingRequest {
            service_id: "svc-consult".to_string(),
            client_name: "Alice Example".to_string(),
            client_email: "alice@example.com".to_string(),
            client_phone: "+1 (555) 111-0000".to_string(),
            appointment_date: "2030-06-03T10:00:00".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let parsed = validate(&valid_request(), dt("2030-06-01 08:00")).unwrap();
        assert_eq!(parsed, dt("2030-06-03 10:00"));
    }

    #[test]
    fn test_all_violations_reported_together() {
        let request = BookingRequest {
            service_id: "svc-consult".to_string(),
            client_name: "  ".to_string(),
            client_email: "not-an-email".to_string(),
            client_phone: "123".to_string(),
            appointment_date: "whenever".to_string(),
            notes: None,
        };

        let err = validate(&request, dt("2030-06-01 08:00")).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names.len(), 4);
                assert!(names.contains(&"clientName"));
                assert!(names.contains(&"clientEmail"));
                assert!(names.contains(&"clientPhone"));
                assert!(names.contains(&"appointmentDate"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_past_date_rejected() {
        let mut request = valid_request();
        request.appointment_date = "2020-06-03T10:00:00".to_string();

        let err = validate(&request, dt("2030-06-01 08:00")).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "appointmentDate");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rfc3339_date_accepted() {
        let mut request = valid_request();
        request.appointment_date = "2030-06-03T10:00:00Z".to_string();
        assert!(validate(&request, dt("2030-06-01 08:00")).is_ok());
    }

    #[test]
    fn test_email_plausibility() {
        assert!(email_is_plausible("alice@example.com"));
        assert!(email_is_plausible("a.b+c@sub.example.co"));
        assert!(!email_is_plausible("alice"));
        assert!(!email_is_plausible("alice@nodot"));
        assert!(!email_is_plausible("@example.com"));
        assert!(!email_is_plausible("alice@example."));
        assert!(!email_is_plausible("alice smith@example.com"));
    }

    #[test]
    fn test_phone_counts_digits_only() {
        let mut request = valid_request();
        request.client_phone = "(555) 111-0000".to_string();
        assert!(validate(&request, dt("2030-06-01 08:00")).is_ok());

        request.client_phone = "555-11".to_string();
        assert!(validate(&request, dt("2030-06-01 08:00")).is_err());
    }
}
