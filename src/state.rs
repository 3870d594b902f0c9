use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::calendar::CalendarGateway;
use crate::services::mailer::MailTransport;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub calendar: Box<dyn CalendarGateway>,
    pub mailer: Box<dyn MailTransport>,
}
