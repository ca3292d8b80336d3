use bookindoor_catalog::PricingPolicy;
use bookindoor_core::payment::{format_amount, MerchantCredentials, PaymentMode, PaymentRequest, PaymentStatus};
use bookindoor_core::signature::compute_request_hash;
use bookindoor_core::{CoreError, CoreResult};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Booking;
use crate::repository::BookingRepository;

/// Non-secret gateway settings that travel with every checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSettings {
    pub currency: String,
    #[serde(default)]
    pub sandbox: bool,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub notify_url: Option<String>,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            currency: "LKR".to_string(),
            sandbox: true,
            return_url: None,
            cancel_url: None,
            notify_url: None,
        }
    }
}

/// Builds the signed payload the client hands to the gateway.
pub struct PaymentPreparer {
    bookings: Arc<dyn BookingRepository>,
    credentials: MerchantCredentials,
    checkout: CheckoutSettings,
    pricing: PricingPolicy,
}

impl PaymentPreparer {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        credentials: MerchantCredentials,
        checkout: CheckoutSettings,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            bookings,
            credentials,
            checkout,
            pricing,
        }
    }

    pub async fn prepare(&self, booking_id: Uuid) -> CoreResult<PaymentRequest> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Booking {}", booking_id)))?;
        self.request_for(&booking)
    }

    /// Signs a checkout for a booking already in hand, without reading it back.
    pub fn request_for(&self, booking: &Booking) -> CoreResult<PaymentRequest> {
        let booking_id = booking.id;
        if booking.is_cancelled() {
            return Err(CoreError::validation(format!("Booking {} was cancelled", booking_id)));
        }
        if booking.payment_status == PaymentStatus::FullPaid {
            return Err(CoreError::validation(format!("Booking {} is already paid", booking_id)));
        }
        if booking.payment_status == PaymentStatus::AdvancedPaid && booking.payment_mode == PaymentMode::Advance {
            return Err(CoreError::validation(format!(
                "Advance for booking {} is already paid",
                booking_id
            )));
        }

        let due = self.pricing.amount_due(booking.amount_cents, booking.payment_mode)?;
        let order_id = booking.id.to_string();
        let hash = compute_request_hash(
            &self.credentials.merchant_id,
            &order_id,
            due,
            &self.checkout.currency,
            self.credentials.merchant_secret.expose(),
        )?;

        let slots = booking
            .time_slots
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(PaymentRequest {
            sandbox: self.checkout.sandbox,
            merchant_id: self.credentials.merchant_id.clone(),
            return_url: self.checkout.return_url.clone(),
            cancel_url: self.checkout.cancel_url.clone(),
            notify_url: self.checkout.notify_url.clone(),
            items: format!("{} {} [{}]", booking.sport_name, booking.date, slots),
            amount: format_amount(due),
            currency: self.checkout.currency.clone(),
            hash,
            first_name: booking.guest.name.clone(),
            phone: booking.guest.phone.expose().clone(),
            email: booking.guest.email.clone(),
            advance: booking.payment_mode == PaymentMode::Advance,
            order_id,
        })
    }
}
