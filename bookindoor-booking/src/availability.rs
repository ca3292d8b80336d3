use bookindoor_catalog::{Venue, VenueRepository};
use bookindoor_core::{CoreError, CoreResult, SlotConflict};
use bookindoor_shared::TimeSlot;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::DateSlots;
use crate::repository::BookingRepository;

/// Open and held slots of one venue, sport and date.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub venue_id: Uuid,
    pub sport_name: String,
    pub date: NaiveDate,
    pub available: Vec<TimeSlot>,
    pub reserved: Vec<TimeSlot>,
}

/// Read-side slot check. Only an early exit: `BookingRepository::insert_many`
/// has the final word.
pub struct AvailabilityChecker {
    venues: Arc<dyn VenueRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityChecker {
    pub fn new(venues: Arc<dyn VenueRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { venues, bookings }
    }

    /// Loads the venue and resolves the sport to its canonical name.
    pub async fn resolve(&self, venue_id: Uuid, sport_name: &str) -> CoreResult<(Venue, String)> {
        let venue = self
            .venues
            .get_venue(venue_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Venue {}", venue_id)))?;
        let sport = venue
            .sport(sport_name)
            .map(|s| s.name.clone())
            .ok_or_else(|| {
                CoreError::not_found(format!("Sport {} at venue {}", sport_name.trim(), venue.name))
            })?;
        Ok((venue, sport))
    }

    pub async fn venue_owner(&self, venue_id: Uuid) -> CoreResult<Option<Uuid>> {
        Ok(self.venues.get_venue(venue_id).await?.map(|v| v.owner_id))
    }

    /// Every slot start already held on that date.
    pub async fn reserved_slots(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        date: NaiveDate,
    ) -> CoreResult<BTreeSet<TimeSlot>> {
        let (venue, sport) = self.resolve(venue_id, sport_name).await?;
        self.held(venue.id, &sport, date).await
    }

    pub async fn day_availability(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        date: NaiveDate,
        slot_minutes: u32,
    ) -> CoreResult<DayAvailability> {
        let (venue, sport) = self.resolve(venue_id, sport_name).await?;
        let held = self.held(venue.id, &sport, date).await?;
        let available = venue
            .available_time
            .slots(slot_minutes)
            .into_iter()
            .filter(|s| !held.contains(s))
            .collect();

        Ok(DayAvailability {
            venue_id: venue.id,
            sport_name: sport,
            date,
            available,
            reserved: held.into_iter().collect(),
        })
    }

    /// The subset of `requested` that is already held.
    pub async fn find_conflicts(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        date: NaiveDate,
        requested: &[TimeSlot],
    ) -> CoreResult<BTreeSet<TimeSlot>> {
        let (venue, sport) = self.resolve(venue_id, sport_name).await?;
        let held = self.held(venue.id, &sport, date).await?;
        Ok(requested.iter().filter(|s| held.contains(s)).copied().collect())
    }

    /// Fails with `Conflict` listing every held (date, slot) across all requested dates.
    pub async fn ensure_available(
        &self,
        venue_id: Uuid,
        sport_name: &str,
        days: &[DateSlots],
    ) -> CoreResult<()> {
        let (venue, sport) = self.resolve(venue_id, sport_name).await?;

        let mut conflicts = Vec::new();
        for day in days {
            let held = self.held(venue.id, &sport, day.date).await?;
            conflicts.extend(
                day.time_slots
                    .iter()
                    .filter(|s| held.contains(s))
                    .map(|s| SlotConflict {
                        date: day.date,
                        start_time: s.to_string(),
                    }),
            );
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            conflicts.sort();
            conflicts.dedup();
            tracing::debug!("{} slot(s) already held at venue {}", conflicts.len(), venue.id);
            Err(CoreError::Conflict(conflicts))
        }
    }

    async fn held(&self, venue_id: Uuid, sport: &str, date: NaiveDate) -> CoreResult<BTreeSet<TimeSlot>> {
        Ok(self
            .bookings
            .list_for_slot_day(venue_id, sport, date)
            .await?
            .into_iter()
            .flat_map(|b| b.time_slots)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{booking, date, slot};
    use crate::repository::InMemoryBookingRepository;
    use bookindoor_catalog::{InMemoryVenueRepository, Location, NewVenue, OpeningHours, Sport};
    use chrono::{NaiveTime, Utc};

    async fn setup() -> (AvailabilityChecker, Arc<InMemoryBookingRepository>, Uuid) {
        let venues = Arc::new(InMemoryVenueRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new());
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
            Utc::now(),
        )
        .unwrap();
        venues.create_venue(&venue).await.unwrap();
        (AvailabilityChecker::new(venues, bookings.clone()), bookings, venue.id)
    }

    #[tokio::test]
    async fn test_find_conflicts_intersects() {
        let (checker, bookings, venue_id) = setup().await;
        bookings
            .insert_many(&[booking(venue_id, "Badminton", "2025-10-02", &["09:00", "10:00"])])
            .await
            .unwrap();

        let conflicts = checker
            .find_conflicts(venue_id, "badminton", date("2025-10-02"), &[slot("10:00"), slot("11:00")])
            .await
            .unwrap();
        assert_eq!(conflicts.into_iter().collect::<Vec<_>>(), vec![slot("10:00")]);

        let reserved = checker
            .reserved_slots(venue_id, "Badminton", date("2025-10-02"))
            .await
            .unwrap();
        assert_eq!(reserved.len(), 2);
    }

    #[tokio::test]
    async fn test_day_availability_splits_open_and_held() {
        let (checker, bookings, venue_id) = setup().await;
        bookings
            .insert_many(&[booking(venue_id, "Badminton", "2025-10-02", &["06:00", "21:00"])])
            .await
            .unwrap();

        let day = checker
            .day_availability(venue_id, " badminton ", date("2025-10-02"), 60)
            .await
            .unwrap();
        assert_eq!(day.sport_name, "Badminton");
        assert_eq!(day.reserved, vec![slot("06:00"), slot("21:00")]);
        assert_eq!(day.available.len(), 14);
        assert_eq!(day.available.first(), Some(&slot("07:00")));
    }

    #[tokio::test]
    async fn test_unknown_venue_or_sport() {
        let (checker, _, venue_id) = setup().await;
        assert!(matches!(
            checker.find_conflicts(Uuid::new_v4(), "Badminton", date("2025-10-02"), &[]).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            checker.find_conflicts(venue_id, "Cricket", date("2025-10-02"), &[]).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_available_reports_every_date() {
        let (checker, bookings, venue_id) = setup().await;
        bookings
            .insert_many(&[
                booking(venue_id, "Badminton", "2025-10-02", &["09:00"]),
                booking(venue_id, "Badminton", "2025-10-03", &["18:00"]),
            ])
            .await
            .unwrap();

        let days = vec![
            DateSlots {
                date: date("2025-10-02"),
                time_slots: vec![slot("09:00"), slot("10:00")],
            },
            DateSlots {
                date: date("2025-10-03"),
                time_slots: vec![slot("18:00")],
            },
        ];
        match checker.ensure_available(venue_id, "Badminton", &days).await {
            Err(CoreError::Conflict(conflicts)) => {
                assert_eq!(conflicts.len(), 2);
                assert_eq!(conflicts[0].date, date("2025-10-02"));
                assert_eq!(conflicts[1].start_time, "18:00");
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        let free = vec![DateSlots {
            date: date("2025-10-02"),
            time_slots: vec![slot("11:00")],
        }];
        checker.ensure_available(venue_id, "Badminton", &free).await.unwrap();
    }
}
