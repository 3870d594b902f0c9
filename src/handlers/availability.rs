use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};
use crate::services::availability::get_available_slots;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct SlotResponse {
    pub time: String,
    pub label: String,
    pub disabled: bool,
}

// GET /availability?date=YYYY-MM-DD
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let date = query
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| {
            AppError::Validation(vec![FieldError::new(
                "date",
                "a date in YYYY-MM-DD form is required",
            )])
        })?;

    let window = state.config.appointment_window();
    let now = state.config.business_now();

    let slots = get_available_slots(state.calendar.as_ref(), date, &window, now).await;

    let response = slots
        .into_iter()
        .map(|s| SlotResponse {
            time: s.start_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            label: s.label,
            disabled: !s.available,
        })
        .collect();

    Ok(Json(response))
}
