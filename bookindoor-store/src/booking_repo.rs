use async_trait::async_trait;
use bookindoor_booking::{Booking, BookingRepository, BookingStatus, GuestInfo};
use bookindoor_catalog::sport_key;
use bookindoor_core::payment::PaymentStatus;
use bookindoor_core::{CoreError, CoreResult, SlotConflict};
use bookindoor_shared::TimeSlot;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{corrupt_row, db_error, is_unique_violation};

/// Postgres booking store. Slot ownership lives in `booking_slots`, whose partial
/// unique index over active rows makes concurrent inserts for the same slot
/// fail at commit time instead of racing past a read check. Rows are keyed on
/// `sport_key`, so renaming a sport's case does not free its slots.
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "id, venue_id, sport_name, booking_date, time_slots, guest_name, \
     guest_phone, guest_nic, guest_email, user_id, payment_mode, payment_status, status, \
     amount_cents, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    venue_id: Uuid,
    sport_name: String,
    booking_date: NaiveDate,
    time_slots: Vec<String>,
    guest_name: String,
    guest_phone: String,
    guest_nic: String,
    guest_email: Option<String>,
    user_id: Option<Uuid>,
    payment_mode: String,
    payment_status: String,
    status: String,
    amount_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let time_slots = row
            .time_slots
            .iter()
            .map(|raw| TimeSlot::parse(raw))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt_row("booking", e))?;

        Ok(Booking {
            id: row.id,
            venue_id: row.venue_id,
            sport_name: row.sport_name,
            date: row.booking_date,
            time_slots,
            guest: GuestInfo {
                name: row.guest_name,
                phone: row.guest_phone.into(),
                nic_number: row.guest_nic.into(),
                email: row.guest_email,
            },
            user_id: row.user_id,
            payment_mode: row.payment_mode.parse().map_err(|e| corrupt_row("booking", e))?,
            payment_status: row.payment_status.parse().map_err(|e| corrupt_row("booking", e))?,
            status: row.status.parse().map_err(|e| corrupt_row("booking", e))?,
            amount_cents: row.amount_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode_all(rows: Vec<BookingRow>) -> CoreResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

fn slot_strings(booking: &Booking) -> Vec<String> {
    booking.time_slots.iter().map(|s| s.to_string()).collect()
}

#[derive(sqlx::FromRow)]
struct HeldSlotRow {
    booking_date: NaiveDate,
    start_time: String,
}

impl PgBookingRepository {
    async fn write_batch(tx: &mut Transaction<'_, Postgres>, bookings: &[Booking]) -> Result<(), sqlx::Error> {
        for booking in bookings {
            sqlx::query(
                r#"
                INSERT INTO bookings (id, venue_id, sport_name, sport_key, booking_date, time_slots,
                                      guest_name, guest_phone, guest_nic, guest_email, user_id,
                                      payment_mode, payment_status, status, amount_cents,
                                      created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                "#,
            )
            .bind(booking.id)
            .bind(booking.venue_id)
            .bind(&booking.sport_name)
            .bind(sport_key(&booking.sport_name))
            .bind(booking.date)
            .bind(slot_strings(booking))
            .bind(&booking.guest.name)
            .bind(booking.guest.phone.expose())
            .bind(booking.guest.nic_number.expose())
            .bind(&booking.guest.email)
            .bind(booking.user_id)
            .bind(booking.payment_mode.as_str())
            .bind(booking.payment_status.as_str())
            .bind(booking.status.as_str())
            .bind(booking.amount_cents)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&mut **tx)
            .await?;

            for slot in &booking.time_slots {
                sqlx::query(
                    r#"
                    INSERT INTO booking_slots (booking_id, venue_id, sport_name, sport_key, booking_date, start_time)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(booking.id)
                .bind(booking.venue_id)
                .bind(&booking.sport_name)
                .bind(sport_key(&booking.sport_name))
                .bind(booking.date)
                .bind(slot.to_string())
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }

    /// Requested slots that are held right now, plus overlaps inside the batch.
    async fn conflicts_for(&self, bookings: &[Booking]) -> CoreResult<Vec<SlotConflict>> {
        let mut conflicts = Vec::new();

        for (i, candidate) in bookings.iter().enumerate() {
            let held = sqlx::query_as::<_, HeldSlotRow>(
                r#"
                SELECT booking_date, start_time FROM booking_slots
                WHERE active AND venue_id = $1 AND sport_key = $2 AND booking_date = $3
                  AND start_time = ANY($4)
                "#,
            )
            .bind(candidate.venue_id)
            .bind(sport_key(&candidate.sport_name))
            .bind(candidate.date)
            .bind(slot_strings(candidate))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

            conflicts.extend(held.into_iter().map(|row| SlotConflict {
                date: row.booking_date,
                start_time: row.start_time,
            }));
            for earlier in &bookings[..i] {
                conflicts.extend(candidate.overlapping(earlier));
            }
        }

        conflicts.sort();
        conflicts.dedup();
        Ok(conflicts)
    }

    async fn exists(&self, id: Uuid) -> CoreResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_many(&self, bookings: &[Booking]) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        match Self::write_batch(&mut tx, bookings).await {
            Ok(()) => {
                tx.commit().await.map_err(|e| {
                    if is_unique_violation(&e) {
                        CoreError::Conflict(Vec::new())
                    } else {
                        db_error(e)
                    }
                })?;
                debug!("Inserted {} bookings", bookings.len());
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await.map_err(db_error)?;
                let conflicts = self.conflicts_for(bookings).await?;
                if conflicts.is_empty() {
                    // holder was cancelled between our insert and the lookup
                    warn!("Slot conflict resolved before it could be reported");
                }
                Err(CoreError::Conflict(conflicts))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Booking::try_from)
        .transpose()
    }

    async fn list_for_slot_day(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {} FROM bookings
            WHERE venue_id = $1 AND sport_key = $2 AND booking_date = $3 AND status <> 'cancelled'
            ORDER BY created_at, id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(venue_id)
        .bind(sport_key(sport_name))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        decode_all(rows)
    }

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY booking_date, created_at, id",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        decode_all(rows)
    }

    async fn list_by_venue(&self, venue_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE venue_id = $1 ORDER BY booking_date, created_at, id",
            BOOKING_COLUMNS
        ))
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        decode_all(rows)
    }

    async fn record_payment(
        &self,
        id: Uuid,
        target: PaymentStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Booking>> {
        let from: Vec<String> = PaymentStatus::predecessors(target)
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect();

        // single conditional update; a replayed notification matches no row
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET payment_status = $2, status = $3, updated_at = $4
            WHERE id = $1 AND status <> 'cancelled' AND payment_status = ANY($5)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(target.as_str())
        .bind(BookingStatus::Confirmed.as_str())
        .bind(now)
        .bind(from)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(Booking::try_from(row)?)),
            None if self.exists(id).await? => Ok(None),
            None => Err(CoreError::not_found(format!("Booking {}", id))),
        }
    }

    async fn cancel_booking(&self, id: Uuid, now: DateTime<Utc>) -> CoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = $2 WHERE id = $1 AND status <> 'cancelled'",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(db_error)?;
            return if self.exists(id).await? {
                Ok(false)
            } else {
                Err(CoreError::not_found(format!("Booking {}", id)))
            };
        }

        sqlx::query("UPDATE booking_slots SET active = FALSE WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(true)
    }

    async fn list_paid(&self, venue_ids: Option<&[Uuid]>) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {} FROM bookings
            WHERE status <> 'cancelled'
              AND payment_status IN ('advanced_paid', 'full_paid')
              AND ($1::uuid[] IS NULL OR venue_id = ANY($1))
            ORDER BY booking_date, created_at, id
            "#,
            BOOKING_COLUMNS
        ))
        .bind(venue_ids.map(|ids| ids.to_vec()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        decode_all(rows)
    }
}
