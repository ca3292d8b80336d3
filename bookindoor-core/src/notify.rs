use async_trait::async_trait;
use bookindoor_shared::models::BookingConfirmedEvent;

use crate::CoreResult;

/// Outbound confirmation channel (email in production). Failures are reported
/// to the caller, who logs them; they never roll back payment state.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_confirmed(&self, event: &BookingConfirmedEvent) -> CoreResult<()>;
}

/// Used when email delivery is disabled.
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn booking_confirmed(&self, event: &BookingConfirmedEvent) -> CoreResult<()> {
        tracing::info!(
            "Booking {} confirmed for {} on {} at {} ({} {})",
            event.booking_id,
            event.venue_name,
            event.date,
            event.slot_summary(),
            event.currency,
            event.amount_paid
        );
        Ok(())
    }
}
