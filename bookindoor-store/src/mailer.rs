use async_trait::async_trait;
use bookindoor_core::notify::BookingNotifier;
use bookindoor_core::{CoreError, CoreResult};
use bookindoor_shared::models::BookingConfirmedEvent;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::app_config::EmailConfig;

/// Sends booking confirmations to the guest and the venue admin over SMTP.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> CoreResult<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| CoreError::ConfigurationError("email.smtp_host is required".to_string()))?;
        let from = config
            .from
            .as_deref()
            .ok_or_else(|| CoreError::ConfigurationError("email.from is required".to_string()))?
            .parse::<Mailbox>()
            .map_err(|e| CoreError::ConfigurationError(format!("Invalid email.from: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| CoreError::ConfigurationError(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn send(&self, to: &str, subject: String, body: String) -> CoreResult<()> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| CoreError::validation(format!("Invalid recipient {}: {}", to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| CoreError::internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| CoreError::internal(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

fn payment_line(event: &BookingConfirmedEvent) -> String {
    let kind = if event.advance { "Advance payment" } else { "Payment" };
    format!("{}: {} {}", kind, event.currency, event.amount_paid)
}

pub(crate) fn guest_message(event: &BookingConfirmedEvent) -> (String, String) {
    let subject = format!("Your booking at {} is confirmed", event.venue_name);
    let body = format!(
        "Hi {},\n\n\
         Your {} booking at {} is confirmed.\n\n\
         Date: {}\n\
         Time: {}\n\
         {}\n\
         Booking reference: {}\n\n\
         See you on the court!\n",
        event.guest_name,
        event.sport_name,
        event.venue_name,
        event.date,
        event.slot_summary(),
        payment_line(event),
        event.booking_id
    );
    (subject, body)
}

pub(crate) fn admin_message(event: &BookingConfirmedEvent) -> (String, String) {
    let subject = format!("New paid booking for {}", event.venue_name);
    let body = format!(
        "{} booked {} at {}.\n\n\
         Date: {}\n\
         Time: {}\n\
         {}\n\
         Booking reference: {}\n",
        event.guest_name,
        event.sport_name,
        event.venue_name,
        event.date,
        event.slot_summary(),
        payment_line(event),
        event.booking_id
    );
    (subject, body)
}

#[async_trait]
impl BookingNotifier for SmtpNotifier {
    async fn booking_confirmed(&self, event: &BookingConfirmedEvent) -> CoreResult<()> {
        let mut first_error = None;

        let recipients = [
            (event.guest_email.as_deref(), guest_message(event)),
            (event.admin_email.as_deref(), admin_message(event)),
        ];
        for (to, (subject, body)) in recipients {
            let Some(to) = to else { continue };
            match self.send(to, subject, body).await {
                Ok(()) => info!("Confirmation for booking {} sent", event.booking_id),
                Err(e) => {
                    warn!("Confirmation for booking {} not delivered: {}", event.booking_id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
