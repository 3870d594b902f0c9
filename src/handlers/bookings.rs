use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::{AppError, FieldError};
use crate::models::Booking;
use crate::services::booking::{submit_booking, BookingRequest};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub service_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub appointment_date: String,
    pub notes: Option<String>,
    pub status: String,
    pub confirmed: bool,
    pub calendar_synced: bool,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            service_id: b.service_id,
            client_name: b.client_name,
            client_email: b.client_email,
            client_phone: b.client_phone,
            appointment_date: b.appointment_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            notes: b.notes,
            status: b.status.as_str().to_string(),
            confirmed: b.confirmed,
            calendar_synced: b.calendar_event_id.is_some(),
        }
    }
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = submit_booking(&state, body).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

#[derive(Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
}

// GET /bookings?email=
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            AppError::Validation(vec![FieldError::new("email", "an email is required")])
        })?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_by_email(&db, email)
            .map_err(|e| AppError::Internal(e.to_string()))?
    };

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
