use bookindoor_catalog::{PricingPolicy, Venue};
use bookindoor_core::clock::Clock;
use bookindoor_core::identity::Identity;
use bookindoor_core::payment::PaymentStatus;
use bookindoor_core::{CoreError, CoreResult};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::models::{Booking, BookingRequest, BookingStatus, DateSlots, GuestInfo};
use crate::repository::BookingRepository;

/// Turns a validated request into one booking per date.
pub struct BookingWriter {
    availability: Arc<AvailabilityChecker>,
    bookings: Arc<dyn BookingRepository>,
    pricing: PricingPolicy,
    clock: Arc<dyn Clock>,
}

impl BookingWriter {
    pub fn new(
        availability: Arc<AvailabilityChecker>,
        bookings: Arc<dyn BookingRepository>,
        pricing: PricingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability,
            bookings,
            pricing,
            clock,
        }
    }

    pub async fn create_bookings(
        &self,
        request: BookingRequest,
        actor: Option<&Identity>,
        initial_payment_status: PaymentStatus,
    ) -> CoreResult<Vec<Uuid>> {
        let bookings = self.place_bookings(request, actor, initial_payment_status).await?;
        Ok(bookings.iter().map(|b| b.id).collect())
    }

    /// Same as `create_bookings` but hands back the stored bookings, one per date.
    pub async fn place_bookings(
        &self,
        request: BookingRequest,
        actor: Option<&Identity>,
        initial_payment_status: PaymentStatus,
    ) -> CoreResult<Vec<Booking>> {
        validate_guest(&request.guest)?;
        self.validate_days(&request.bookings)?;

        let (venue, sport_name) = self
            .availability
            .resolve(request.venue_id, &request.sport_name)
            .await?;
        self.validate_opening_hours(&venue, &request.bookings)?;

        self.availability
            .ensure_available(venue.id, &sport_name, &request.bookings)
            .await?;

        let sport = venue
            .sport(&sport_name)
            .ok_or_else(|| CoreError::not_found(format!("Sport {}", sport_name)))?;
        let now = self.clock.now();

        let bookings = request
            .bookings
            .into_iter()
            .map(|day| {
                let mut time_slots = day.time_slots;
                time_slots.sort();
                Ok(Booking {
                    id: Uuid::new_v4(),
                    venue_id: venue.id,
                    sport_name: sport_name.clone(),
                    date: day.date,
                    amount_cents: self.pricing.booking_amount(sport, time_slots.len())?,
                    time_slots,
                    guest: request.guest.clone(),
                    user_id: actor.map(|a| a.id),
                    payment_mode: request.payment_mode,
                    payment_status: initial_payment_status,
                    status: BookingStatus::Pending,
                    created_at: now,
                    updated_at: now,
                })
            })
            .collect::<CoreResult<Vec<Booking>>>()?;

        if let Err(err) = self.bookings.insert_many(&bookings).await {
            if matches!(err, CoreError::Conflict(_)) {
                tracing::info!("Lost slot race at venue {} ({})", venue.id, sport_name);
            }
            return Err(err);
        }

        tracing::info!(
            "Created {} booking(s) at venue {} for {} ({} mode)",
            bookings.len(),
            venue.id,
            sport_name,
            request.payment_mode.as_str()
        );
        Ok(bookings)
    }

    /// Venue owner or super-admin only. Cancelling twice is a no-op.
    pub async fn cancel_booking(&self, id: Uuid, actor: &Identity) -> CoreResult<Booking> {
        let booking = self
            .bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Booking {}", id)))?;

        self.ensure_venue_access(actor, booking.venue_id).await?;

        if self.bookings.cancel_booking(id, self.clock.now()).await? {
            tracing::info!("Booking {} cancelled by {}", id, actor.id);
        }

        self.bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Booking {}", id)))
    }

    pub async fn bookings_for_user(&self, actor: &Identity) -> CoreResult<Vec<Booking>> {
        self.bookings.list_by_user(actor.id).await
    }

    pub async fn bookings_for_venue(&self, actor: &Identity, venue_id: Uuid) -> CoreResult<Vec<Booking>> {
        self.ensure_venue_access(actor, venue_id).await?;
        self.bookings.list_by_venue(venue_id).await
    }

    async fn ensure_venue_access(&self, actor: &Identity, venue_id: Uuid) -> CoreResult<()> {
        actor.ensure_venue_manager()?;
        if actor.is_super_admin() {
            return Ok(());
        }
        // the venue may be gone; its bookings then belong to super-admins only
        match self.availability.venue_owner(venue_id).await? {
            Some(owner_id) => actor.ensure_can_modify_venue(owner_id),
            None => Err(CoreError::forbidden("Venue no longer exists")),
        }
    }

    fn validate_days(&self, days: &[DateSlots]) -> CoreResult<()> {
        if days.is_empty() {
            return Err(CoreError::validation("At least one date is required"));
        }

        let today = self.clock.today();
        let mut dates = HashSet::new();
        for day in days {
            if !dates.insert(day.date) {
                return Err(CoreError::validation(format!("Date {} requested twice", day.date)));
            }
            if day.date < today {
                return Err(CoreError::validation(format!("Date {} is in the past", day.date)));
            }
            if day.time_slots.is_empty() {
                return Err(CoreError::validation(format!("No slots requested for {}", day.date)));
            }

            let mut slots = HashSet::new();
            for slot in &day.time_slots {
                if !slots.insert(*slot) {
                    return Err(CoreError::validation(format!(
                        "Slot {} requested twice on {}",
                        slot, day.date
                    )));
                }
                if slot.minutes_from_midnight() % self.pricing.slot_minutes != 0 {
                    return Err(CoreError::validation(format!(
                        "Slot {} is not aligned to {}-minute slots",
                        slot, self.pricing.slot_minutes
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_opening_hours(&self, venue: &Venue, days: &[DateSlots]) -> CoreResult<()> {
        for day in days {
            for slot in &day.time_slots {
                if !venue.available_time.contains(*slot, self.pricing.slot_minutes) {
                    return Err(CoreError::validation(format!(
                        "Slot {} is outside {}'s opening hours",
                        slot, venue.name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_guest(guest: &GuestInfo) -> CoreResult<()> {
    if guest.name.trim().is_empty() {
        return Err(CoreError::validation("Guest name is required"));
    }
    if guest.phone.expose().trim().is_empty() {
        return Err(CoreError::validation("Guest phone is required"));
    }
    if guest.nic_number.expose().trim().is_empty() {
        return Err(CoreError::validation("Guest NIC number is required"));
    }
    if let Some(email) = &guest.email {
        if !email.contains('@') {
            return Err(CoreError::validation(format!("Invalid guest email: {}", email)));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::tests::{date, guest, slot};
    use crate::repository::InMemoryBookingRepository;
    use bookindoor_catalog::{
        InMemoryVenueRepository, Location, NewVenue, OpeningHours, Sport, VenueRepository, VenueUpdate,
    };
    use bookindoor_core::clock::FixedClock;
    use bookindoor_core::identity::Role;
    use bookindoor_core::payment::PaymentMode;
    use chrono::{NaiveTime, TimeZone, Utc};

    pub struct Fixture {
        pub writer: Arc<BookingWriter>,
        pub bookings: Arc<InMemoryBookingRepository>,
        pub venues: Arc<InMemoryVenueRepository>,
        pub venue: Venue,
    }

    pub async fn fixture() -> Fixture {
        let venues = Arc::new(InMemoryVenueRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap()));

        let venue = Venue::create(
            NewVenue {
                name: "Arena A".to_string(),
                location: Location {
                    address: "Colombo".to_string(),
                    lat: None,
                    lng: None,
                },
                contact_number: "0110000000".to_string(),
                venue_type: "indoor".to_string(),
                sports: vec![Sport {
                    name: "Badminton".to_string(),
                    price_per_hour_cents: 150000,
                }],
                amenities: vec![],
                available_time: OpeningHours {
                    from: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                    to: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                },
                images: vec![],
                description: None,
                owner_id: None,
            },
            Uuid::new_v4(),
            clock.now(),
        )
        .unwrap();
        venues.create_venue(&venue).await.unwrap();

        let availability = Arc::new(AvailabilityChecker::new(venues.clone(), bookings.clone()));
        let writer = Arc::new(BookingWriter::new(
            availability,
            bookings.clone(),
            PricingPolicy::default(),
            clock,
        ));
        Fixture {
            writer,
            bookings,
            venues,
            venue,
        }
    }

    pub fn request(venue_id: Uuid, days: &[(&str, &[&str])]) -> BookingRequest {
        BookingRequest {
            venue_id,
            sport_name: "Badminton".to_string(),
            guest: guest(),
            bookings: days
                .iter()
                .map(|(d, slots)| DateSlots {
                    date: date(d),
                    time_slots: slots.iter().map(|s| slot(s)).collect(),
                })
                .collect(),
            payment_mode: PaymentMode::Full,
        }
    }

    #[tokio::test]
    async fn test_one_booking_per_date() {
        let f = fixture().await;
        let user = Identity::new(Uuid::new_v4(), Role::User);
        let ids = f
            .writer
            .create_bookings(
                request(f.venue.id, &[("2025-10-02", &["10:00", "09:00"]), ("2025-10-03", &["18:00"])]),
                Some(&user),
                PaymentStatus::Pending,
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);

        let first = f.bookings.get_booking(ids[0]).await.unwrap().unwrap();
        assert_eq!(first.time_slots, vec![slot("09:00"), slot("10:00")]);
        assert_eq!(first.amount_cents, 300000);
        assert_eq!(first.user_id, Some(user.id));
        assert_eq!(first.payment_status, PaymentStatus::Pending);
        assert_eq!(first.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_second_request_conflicts() {
        let f = fixture().await;
        f.writer
            .create_bookings(request(f.venue.id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
            .await
            .unwrap();

        let result = f
            .writer
            .create_bookings(request(f.venue.id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
            .await;
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sport_rename_keeps_slots_held() {
        let f = fixture().await;
        f.writer
            .create_bookings(request(f.venue.id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
            .await
            .unwrap();

        let mut renamed = f.venue.clone();
        renamed
            .apply(
                VenueUpdate {
                    sports: Some(vec![Sport {
                        name: "badminton".to_string(),
                        price_per_hour_cents: 150000,
                    }]),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        f.venues.update_venue(&renamed).await.unwrap();

        let mut req = request(f.venue.id, &[("2025-10-02", &["09:00"])]);
        req.sport_name = "badminton".to_string();
        assert!(matches!(
            f.writer.create_bookings(req, None, PaymentStatus::Pending).await,
            Err(CoreError::Conflict(_))
        ));
        assert_eq!(
            f.bookings
                .list_for_slot_day(f.venue.id, "badminton", date("2025-10-02"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_out_of_range_price_is_rejected() {
        let f = fixture().await;
        // stored before prices were capped
        let mut legacy = f.venue.clone();
        legacy.sports[0].price_per_hour_cents = i64::MAX / 2;
        f.venues.update_venue(&legacy).await.unwrap();

        assert!(matches!(
            f.writer
                .create_bookings(request(f.venue.id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
                .await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(f
            .bookings
            .list_for_slot_day(f.venue.id, "Badminton", date("2025-10-02"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_guest_fields_required() {
        let f = fixture().await;
        let mut req = request(f.venue.id, &[("2025-10-02", &["09:00"])]);
        req.guest.nic_number = "  ".into();
        assert!(matches!(
            f.writer.create_bookings(req, None, PaymentStatus::Pending).await,
            Err(CoreError::ValidationError(_))
        ));

        let mut req = request(f.venue.id, &[("2025-10-02", &["09:00"])]);
        req.guest.email = Some("nope".to_string());
        assert!(f.writer.create_bookings(req, None, PaymentStatus::Pending).await.is_err());
    }

    #[tokio::test]
    async fn test_slot_rules() {
        let f = fixture().await;
        let cases: &[&[(&str, &[&str])]] = &[
            &[],
            &[("2025-10-02", &[])],
            &[("2025-09-30", &["09:00"])],
            &[("2025-10-02", &["09:00", "09:00"])],
            &[("2025-10-02", &["09:00"]), ("2025-10-02", &["10:00"])],
            &[("2025-10-02", &["09:30"])],
            &[("2025-10-02", &["22:00"])],
            &[("2025-10-02", &["05:00"])],
        ];
        for days in cases.iter().copied() {
            let result = f
                .writer
                .create_bookings(request(f.venue.id, days), None, PaymentStatus::Pending)
                .await;
            assert!(
                matches!(result, Err(CoreError::ValidationError(_))),
                "expected validation error for {:?}",
                days
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_venue_and_sport() {
        let f = fixture().await;
        assert!(matches!(
            f.writer
                .create_bookings(request(Uuid::new_v4(), &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
                .await,
            Err(CoreError::NotFound(_))
        ));

        let mut req = request(f.venue.id, &[("2025-10-02", &["09:00"])]);
        req.sport_name = "Cricket".to_string();
        assert!(matches!(
            f.writer.create_bookings(req, None, PaymentStatus::Pending).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_requires_owner() {
        let f = fixture().await;
        let ids = f
            .writer
            .create_bookings(request(f.venue.id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
            .await
            .unwrap();

        let stranger = Identity::new(Uuid::new_v4(), Role::Admin);
        assert!(matches!(
            f.writer.cancel_booking(ids[0], &stranger).await,
            Err(CoreError::Forbidden(_))
        ));

        let owner = Identity::new(f.venue.owner_id, Role::Admin);
        let cancelled = f.writer.cancel_booking(ids[0], &owner).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(f.writer.cancel_booking(ids[0], &owner).await.is_ok());

        // slot is free again
        f.writer
            .create_bookings(request(f.venue.id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
            .await
            .unwrap();
        assert_eq!(f.writer.bookings_for_venue(&owner, f.venue.id).await.unwrap().len(), 2);
        assert_eq!(f.venues.count_venues().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_double_booking_has_one_winner() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for _ in 0..32 {
            let writer = f.writer.clone();
            let venue_id = f.venue.id;
            handles.push(tokio::spawn(async move {
                writer
                    .create_bookings(request(venue_id, &[("2025-10-02", &["09:00"])]), None, PaymentStatus::Pending)
                    .await
            }));
        }

        let mut won = 0;
        let mut conflicted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(CoreError::Conflict(_)) => conflicted += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(conflicted, 31);
        assert_eq!(
            f.bookings
                .list_for_slot_day(f.venue.id, "Badminton", date("2025-10-02"))
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
