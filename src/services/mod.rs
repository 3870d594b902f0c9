pub mod availability;
pub mod booking;
pub mod calendar;
pub mod google_auth;
pub mod mailer;
pub mod notifications;
