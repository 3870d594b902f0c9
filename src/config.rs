use std::env;

use chrono::{Duration, NaiveDateTime, Utc};

use crate::models::AppointmentWindow;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub business_name: String,
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_hours: u32,
    /// Fixed offset from UTC for business-local time. Single zone only.
    pub utc_offset_minutes: i64,
    pub http_timeout_secs: u64,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub google_calendar_id: String,
    pub mail_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "slotbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "Slotbook".to_string()),
            open_hour: env::var("BUSINESS_OPEN_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9),
            close_hour: env::var("BUSINESS_CLOSE_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(17),
            slot_hours: env::var("SLOT_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            utc_offset_minutes: env::var("BUSINESS_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            google_refresh_token: env::var("GOOGLE_REFRESH_TOKEN").unwrap_or_default(),
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID")
                .unwrap_or_else(|_| "primary".to_string()),
            mail_from: env::var("MAIL_FROM").unwrap_or_default(),
        }
    }

    pub fn appointment_window(&self) -> AppointmentWindow {
        AppointmentWindow {
            open_hour: self.open_hour,
            close_hour: self.close_hour,
            slot_hours: self.slot_hours,
        }
    }

    /// Current time in business-local terms.
    pub fn business_now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::minutes(self.utc_offset_minutes)
    }

    pub fn calendar_configured(&self) -> bool {
        !self.google_client_id.is_empty()
            && !self.google_client_secret.is_empty()
            && !self.google_refresh_token.is_empty()
    }
}
