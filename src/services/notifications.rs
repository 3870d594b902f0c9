use crate::models::Booking;
use crate::services::mailer::{MailTransport, OutboundEmail};

/// A quote request forwarded by the (external) quote pipeline.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_name: Option<String>,
    pub message: String,
}

/// Sends the booking confirmation email. Failures are logged and swallowed:
/// the booking is already committed, so email outcome never changes it.
/// Duplicate delivery on retry is acceptable.
pub async fn send_booking_confirmation(
    mailer: &dyn MailTransport,
    booking: &Booking,
    service_name: &str,
    business_name: &str,
) {
    let when = booking
        .appointment_date
        .format("%A, %B %-d, %Y at %-I:%M %p")
        .to_string();

    let text_body = format!(
        "Hi {name},\n\n\
         Your {service_name} appointment with {business_name} is booked for {when}.\n\n\
         We'll reach out if anything changes. Reply to this email with any questions.\n\n\
         Booking reference: {id}\n",
        name = booking.client_name,
        id = booking.id,
    );
    let html_body = format!(
        "<p>Hi {name},</p>\
         <p>Your <strong>{service_name}</strong> appointment with {business_name} \
         is booked for <strong>{when}</strong>.</p>\
         <p>We'll reach out if anything changes. Reply to this email with any questions.</p>\
         <p><small>Booking reference: {id}</small></p>",
        name = booking.client_name,
        id = booking.id,
    );

    let message = OutboundEmail {
        to: booking.client_email.clone(),
        subject: format!("Appointment confirmed for {when}"),
        text_body,
        html_body,
    };

    deliver(mailer, &message, "booking confirmation").await;
}

/// Notifies the business inbox about a new quote request.
pub async fn send_quote_notification(mailer: &dyn MailTransport, to: &str, quote: &QuoteRequest) {
    let service = quote.service_name.as_deref().unwrap_or("(not specified)");

    let text_body = format!(
        "New quote request\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Service: {service}\n\n\
         {message}\n",
        name = quote.client_name,
        email = quote.client_email,
        phone = quote.client_phone,
        message = quote.message,
    );
    let html_body = format!(
        "<h3>New quote request</h3>\
         <p><strong>Name:</strong> {name}<br>\
         <strong>Email:</strong> {email}<br>\
         <strong>Phone:</strong> {phone}<br>\
         <strong>Service:</strong> {service}</p>\
         <p>{message}</p>",
        name = quote.client_name,
        email = quote.client_email,
        phone = quote.client_phone,
        message = quote.message,
    );

    let message = OutboundEmail {
        to: to.to_string(),
        subject: format!("Quote request from {}", quote.client_name),
        text_body,
        html_body,
    };

    deliver(mailer, &message, "quote notification").await;
}

async fn deliver(mailer: &dyn MailTransport, message: &OutboundEmail, kind: &str) {
    if let Err(e) = mailer.verify().await {
        tracing::warn!(error = %e, kind, to = %message.to, "mail transport unavailable, skipping send");
        return;
    }

    match mailer.send(message).await {
        Ok(()) => tracing::info!(kind, to = %message.to, "email sent"),
        Err(e) => tracing::warn!(error = %e, kind, to = %message.to, "email send failed"),
    }
}
