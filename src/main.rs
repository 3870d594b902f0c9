use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotbook::config::AppConfig;
use slotbook::db;
use slotbook::handlers;
use slotbook::services::calendar::google::GoogleCalendarGateway;
use slotbook::services::mailer::gmail::GmailMailer;
use slotbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.calendar_configured() {
        tracing::info!(calendar_id = %config.google_calendar_id, "Google Calendar sync enabled");
    } else {
        tracing::info!("Google Calendar credentials not set, bookings will not sync");
    }
    if config.mail_from.is_empty() {
        tracing::info!("MAIL_FROM not set, confirmation emails disabled");
    }

    let calendar = GoogleCalendarGateway::from_config(&config);
    let mailer = GmailMailer::from_config(&config);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        calendar: Box::new(calendar),
        mailer: Box::new(mailer),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/availability", get(handlers::availability::get_availability))
        .route(
            "/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::get_bookings),
        )
        .route("/services", get(handlers::services::list_services))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::update_booking_status),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
