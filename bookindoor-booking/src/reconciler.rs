use bookindoor_catalog::VenueRepository;
use bookindoor_core::clock::Clock;
use bookindoor_core::notify::BookingNotifier;
use bookindoor_core::payment::{GatewayNotification, GatewayStatus, MerchantCredentials, PaymentStatus};
use bookindoor_core::repository::AdminRepository;
use bookindoor_core::signature::verify_notification_signature;
use bookindoor_core::{CoreError, CoreResult};
use bookindoor_shared::models::BookingConfirmedEvent;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Booking;
use crate::repository::BookingRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnchangedReason {
    /// The gateway reported something other than success.
    NotSuccessful(GatewayStatus),
    /// Redelivery, or the booking is already further along.
    AlreadySettled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Advanced { booking_id: Uuid, status: PaymentStatus },
    Unchanged { booking_id: Uuid, reason: UnchangedReason },
}

impl ReconcileOutcome {
    pub fn booking_id(&self) -> Uuid {
        match self {
            ReconcileOutcome::Advanced { booking_id, .. } => *booking_id,
            ReconcileOutcome::Unchanged { booking_id, .. } => *booking_id,
        }
    }
}

/// Applies verified gateway notifications to booking payment state.
pub struct PaymentReconciler {
    bookings: Arc<dyn BookingRepository>,
    venues: Arc<dyn VenueRepository>,
    admins: Arc<dyn AdminRepository>,
    notifier: Arc<dyn BookingNotifier>,
    credentials: MerchantCredentials,
    clock: Arc<dyn Clock>,
}

impl PaymentReconciler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        venues: Arc<dyn VenueRepository>,
        admins: Arc<dyn AdminRepository>,
        notifier: Arc<dyn BookingNotifier>,
        credentials: MerchantCredentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            venues,
            admins,
            notifier,
            credentials,
            clock,
        }
    }

    pub async fn handle_notification(&self, notification: &GatewayNotification) -> CoreResult<ReconcileOutcome> {
        self.verify(notification)?;

        let booking_id = Uuid::parse_str(notification.order_id.trim())
            .map_err(|_| CoreError::not_found(format!("Booking {}", notification.order_id)))?;
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Booking {}", booking_id)))?;

        let gateway_status = GatewayStatus::from_code(&notification.status_code);
        if !gateway_status.is_success() {
            tracing::info!(
                "Payment for booking {} not successful ({:?}); status stays {}",
                booking_id,
                gateway_status,
                booking.payment_status
            );
            return Ok(ReconcileOutcome::Unchanged {
                booking_id,
                reason: UnchangedReason::NotSuccessful(gateway_status),
            });
        }

        if booking.is_cancelled() {
            tracing::warn!("Successful payment received for cancelled booking {}", booking_id);
            return Ok(ReconcileOutcome::Unchanged {
                booking_id,
                reason: UnchangedReason::Cancelled,
            });
        }

        let target = booking.payment_mode.settled_status();
        let updated = match self
            .bookings
            .record_payment(booking_id, target, self.clock.now())
            .await?
        {
            Some(updated) => updated,
            None => {
                tracing::debug!("Payment notification for booking {} already applied", booking_id);
                return Ok(ReconcileOutcome::Unchanged {
                    booking_id,
                    reason: UnchangedReason::AlreadySettled,
                });
            }
        };

        tracing::info!(
            "Booking {} confirmed, payment status {} (gateway payment {})",
            booking_id,
            updated.payment_status,
            notification.payment_id.as_deref().unwrap_or("-")
        );

        self.dispatch_confirmation(updated, notification);

        Ok(ReconcileOutcome::Advanced {
            booking_id,
            status: target,
        })
    }

    fn verify(&self, notification: &GatewayNotification) -> CoreResult<()> {
        if notification.merchant_id.trim() != self.credentials.merchant_id {
            tracing::warn!(
                "Rejected notification for order {}: unknown merchant {}",
                notification.order_id,
                notification.merchant_id
            );
            return Err(CoreError::SignatureInvalid(notification.order_id.clone()));
        }

        let valid = verify_notification_signature(
            &self.credentials.merchant_id,
            &notification.order_id,
            &notification.payhere_amount,
            &notification.payhere_currency,
            &notification.status_code,
            &notification.md5sig,
            self.credentials.merchant_secret.expose(),
        )?;

        if !valid {
            tracing::warn!("Rejected notification for order {}: signature mismatch", notification.order_id);
            return Err(CoreError::SignatureInvalid(notification.order_id.clone()));
        }
        Ok(())
    }

    /// Fire-and-forget: the payment update is already committed.
    fn dispatch_confirmation(&self, booking: Booking, notification: &GatewayNotification) {
        let venues = self.venues.clone();
        let admins = self.admins.clone();
        let notifier = self.notifier.clone();
        let amount_paid = notification.payhere_amount.clone();
        let currency = notification.payhere_currency.clone();
        let timestamp = self.clock.now().timestamp();

        tokio::spawn(async move {
            let venue = match venues.get_venue(booking.venue_id).await {
                Ok(venue) => venue,
                Err(err) => {
                    tracing::warn!("Could not load venue for booking {}: {}", booking.id, err);
                    None
                }
            };
            let admin_email = match &venue {
                Some(v) => match admins.get_admin(v.owner_id).await {
                    Ok(admin) => admin.map(|a| a.email),
                    Err(err) => {
                        tracing::warn!("Could not load admin for venue {}: {}", v.id, err);
                        None
                    }
                },
                None => None,
            };

            let event = BookingConfirmedEvent {
                booking_id: booking.id,
                venue_id: booking.venue_id,
                venue_name: venue.map(|v| v.name).unwrap_or_default(),
                sport_name: booking.sport_name,
                date: booking.date,
                time_slots: booking.time_slots,
                guest_name: booking.guest.name,
                guest_email: booking.guest.email,
                admin_email,
                amount_paid,
                currency,
                advance: booking.payment_status == PaymentStatus::AdvancedPaid,
                timestamp,
            };

            if let Err(err) = notifier.booking_confirmed(&event).await {
                tracing::warn!("Confirmation for booking {} not delivered: {}", event.booking_id, err);
            }
        });
    }
}
