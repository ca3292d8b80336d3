use async_trait::async_trait;
use bookindoor_core::payment::PaymentStatus;
use bookindoor_core::{CoreError, CoreResult, SlotConflict};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

/// Repository trait for booking persistence.
///
/// `insert_many` is the serialization point for slot ownership: it must refuse
/// the whole batch when any (venue, sport, date, slot) is already held by a
/// non-cancelled booking.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_many(&self, bookings: &[Booking]) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Non-cancelled bookings of one venue, sport and date.
    async fn list_for_slot_day(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<Booking>>;

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>>;

    async fn list_by_venue(&self, venue_id: Uuid) -> CoreResult<Vec<Booking>>;

    /// Conditionally sets `payment_status = target` and `status = confirmed`.
    /// Only applies when the booking is not cancelled and `target` is ahead of
    /// the current status. Returns the updated booking when something changed.
    async fn record_payment(
        &self,
        id: Uuid,
        target: PaymentStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Booking>>;

    /// Marks the booking cancelled and frees its slots. `false` when it already was.
    async fn cancel_booking(&self, id: Uuid, now: DateTime<Utc>) -> CoreResult<bool>;

    /// Paid, non-cancelled bookings, optionally restricted to some venues.
    async fn list_paid(&self, venue_ids: Option<&[Uuid]>) -> CoreResult<Vec<Booking>>;
}

/// In-memory booking store. Check and insert happen under one write lock.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_date_then_created(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    bookings
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert_many(&self, bookings: &[Booking]) -> CoreResult<()> {
        let mut store = self.bookings.write().await;

        let mut conflicts: Vec<SlotConflict> = Vec::new();
        for (i, candidate) in bookings.iter().enumerate() {
            for existing in store.values() {
                conflicts.extend(candidate.overlapping(existing));
            }
            for earlier in &bookings[..i] {
                conflicts.extend(candidate.overlapping(earlier));
            }
        }

        if !conflicts.is_empty() {
            conflicts.sort();
            conflicts.dedup();
            return Err(CoreError::Conflict(conflicts));
        }

        for booking in bookings {
            store.insert(booking.id, booking.clone());
        }
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_for_slot_day(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<Booking>> {
        Ok(by_date_then_created(
            self.bookings
                .read()
                .await
                .values()
                .filter(|b| b.holds(venue_id, sport_name, date))
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(by_date_then_created(
            self.bookings
                .read()
                .await
                .values()
                .filter(|b| b.user_id == Some(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_venue(&self, venue_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(by_date_then_created(
            self.bookings
                .read()
                .await
                .values()
                .filter(|b| b.venue_id == venue_id)
                .cloned()
                .collect(),
        ))
    }

    async fn record_payment(
        &self,
        id: Uuid,
        target: PaymentStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Booking>> {
        let mut store = self.bookings.write().await;
        let booking = store
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found(format!("Booking {}", id)))?;

        if booking.is_cancelled() || !booking.payment_status.can_advance_to(target) {
            return Ok(None);
        }

        booking.payment_status = target;
        booking.status = BookingStatus::Confirmed;
        booking.updated_at = now;
        Ok(Some(booking.clone()))
    }

    async fn cancel_booking(&self, id: Uuid, now: DateTime<Utc>) -> CoreResult<bool> {
        let mut store = self.bookings.write().await;
        let booking = store
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found(format!("Booking {}", id)))?;

        if booking.is_cancelled() {
            return Ok(false);
        }
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = now;
        Ok(true)
    }

    async fn list_paid(&self, venue_ids: Option<&[Uuid]>) -> CoreResult<Vec<Booking>> {
        Ok(by_date_then_created(
            self.bookings
                .read()
                .await
                .values()
                .filter(|b| b.is_revenue())
                .filter(|b| venue_ids.map_or(true, |ids| ids.contains(&b.venue_id)))
                .cloned()
                .collect(),
        ))
    }
}
