use bookindoor_core::{CoreError, CoreResult};
use bookindoor_shared::TimeSlot;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Upper bound on an hourly price, in minor units.
pub const MAX_PRICE_PER_HOUR_CENTS: i64 = 10_000_000_000;

/// Identity of a sport at a venue. Slot ownership is keyed on this, not on the display name.
pub fn sport_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A sport offered at a venue and its hourly price in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sport {
    pub name: String,
    pub price_per_hour_cents: i64,
}

/// Daily opening window. A closing time of `23:59` means open until midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpeningHours {
    #[serde(with = "hh_mm")]
    pub from: NaiveTime,
    #[serde(with = "hh_mm")]
    pub to: NaiveTime,
}

impl OpeningHours {
    pub fn open_minutes(&self) -> u32 {
        self.from.hour() * 60 + self.from.minute()
    }

    pub fn close_minutes(&self) -> u32 {
        if self.to.hour() == 23 && self.to.minute() == 59 {
            return 24 * 60;
        }
        self.to.hour() * 60 + self.to.minute()
    }

    pub fn contains(&self, slot: TimeSlot, width_minutes: u32) -> bool {
        slot.minutes_from_midnight() >= self.open_minutes()
            && slot.end_minutes(width_minutes) <= self.close_minutes()
    }

    /// Slot starts aligned to `width_minutes` that fit inside the window.
    pub fn slots(&self, width_minutes: u32) -> Vec<TimeSlot> {
        if width_minutes == 0 {
            return Vec::new();
        }
        let close = self.close_minutes();
        let first = self.open_minutes().div_ceil(width_minutes) * width_minutes;
        (first..)
            .step_by(width_minutes as usize)
            .take_while(|start| start + width_minutes <= close)
            .filter_map(|start| TimeSlot::from_hm(start / 60, start % 60))
            .collect()
    }
}

mod hh_mm {
    use bookindoor_shared::TimeSlot;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeSlot::parse(&raw)
            .map(|t| t.start())
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub location: Location,
    pub contact_number: String,
    pub venue_type: String,
    pub sports: Vec<Sport>,
    pub amenities: Vec<String>,
    pub available_time: OpeningHours,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What anonymous callers and plain users get to see.
#[derive(Debug, Clone, Serialize)]
pub struct PublicVenue {
    pub id: Uuid,
    pub name: String,
    pub location: Location,
    pub sports: Vec<Sport>,
    pub images: Vec<String>,
    pub available_time: OpeningHours,
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVenue {
    pub name: String,
    pub location: Location,
    pub contact_number: String,
    pub venue_type: String,
    pub sports: Vec<Sport>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub available_time: OpeningHours,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: Option<String>,
    /// Only honoured for super-admins; admins always own what they create.
    pub owner_id: Option<Uuid>,
}

/// Partial update. `images` are appended to the existing list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueUpdate {
    pub name: Option<String>,
    pub location: Option<Location>,
    pub contact_number: Option<String>,
    pub venue_type: Option<String>,
    pub sports: Option<Vec<Sport>>,
    pub amenities: Option<Vec<String>>,
    pub available_time: Option<OpeningHours>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl Venue {
    pub fn create(new: NewVenue, owner_id: Uuid, now: DateTime<Utc>) -> CoreResult<Self> {
        let venue = Self {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            location: new.location,
            contact_number: new.contact_number.trim().to_string(),
            venue_type: new.venue_type.trim().to_string(),
            sports: normalize_sports(new.sports),
            amenities: new.amenities,
            available_time: new.available_time,
            images: new.images,
            description: new.description,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        venue.validate()?;
        Ok(venue)
    }

    /// Applies the patch to a copy and only commits it when the result still validates.
    pub fn apply(&mut self, update: VenueUpdate, now: DateTime<Utc>) -> CoreResult<()> {
        let mut next = self.clone();

        if let Some(name) = update.name {
            next.name = name.trim().to_string();
        }
        if let Some(location) = update.location {
            next.location = location;
        }
        if let Some(contact_number) = update.contact_number {
            next.contact_number = contact_number.trim().to_string();
        }
        if let Some(venue_type) = update.venue_type {
            next.venue_type = venue_type.trim().to_string();
        }
        if let Some(sports) = update.sports {
            next.sports = normalize_sports(sports);
        }
        if let Some(amenities) = update.amenities {
            next.amenities = amenities;
        }
        if let Some(available_time) = update.available_time {
            next.available_time = available_time;
        }
        if let Some(images) = update.images {
            next.images.extend(images);
        }
        if update.description.is_some() {
            next.description = update.description;
        }
        if let Some(owner_id) = update.owner_id {
            next.owner_id = owner_id;
        }

        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::validation("Venue name is required"));
        }
        if self.location.address.trim().is_empty() {
            return Err(CoreError::validation("Venue address is required"));
        }
        if self.contact_number.is_empty() {
            return Err(CoreError::validation("Venue contact number is required"));
        }
        if self.sports.is_empty() {
            return Err(CoreError::validation("A venue must offer at least one sport"));
        }

        let mut seen = HashSet::new();
        for sport in &self.sports {
            if sport.name.is_empty() {
                return Err(CoreError::validation("Sport name is required"));
            }
            if sport.price_per_hour_cents <= 0 {
                return Err(CoreError::validation(format!(
                    "Price for {} must be positive",
                    sport.name
                )));
            }
            if sport.price_per_hour_cents > MAX_PRICE_PER_HOUR_CENTS {
                return Err(CoreError::validation(format!(
                    "Price for {} exceeds {} per hour",
                    sport.name, MAX_PRICE_PER_HOUR_CENTS
                )));
            }
            if !seen.insert(sport_key(&sport.name)) {
                return Err(CoreError::validation(format!("Sport listed twice: {}", sport.name)));
            }
        }

        if self.available_time.open_minutes() >= self.available_time.close_minutes() {
            return Err(CoreError::validation("Opening time must be before closing time"));
        }

        Ok(())
    }

    /// Case-insensitive lookup; the returned sport carries the canonical name.
    pub fn sport(&self, name: &str) -> Option<&Sport> {
        let wanted = sport_key(name);
        self.sports.iter().find(|s| sport_key(&s.name) == wanted)
    }

    pub fn public_view(&self) -> PublicVenue {
        PublicVenue {
            id: self.id,
            name: self.name.clone(),
            location: self.location.clone(),
            sports: self.sports.clone(),
            images: self.images.clone(),
            available_time: self.available_time,
            amenities: self.amenities.clone(),
        }
    }
}

fn normalize_sports(sports: Vec<Sport>) -> Vec<Sport> {
    sports
        .into_iter()
        .map(|s| Sport {
            name: s.name.trim().to_string(),
            price_per_hour_cents: s.price_per_hour_cents,
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn sample_new_venue() -> NewVenue {
        NewVenue {
            name: "Arena A".to_string(),
            location: Location {
                address: "12 Galle Road, Colombo".to_string(),
                lat: Some(6.9271),
                lng: Some(79.8612),
            },
            contact_number: "0112223344".to_string(),
            venue_type: "indoor".to_string(),
            sports: vec![
                Sport { name: "Badminton".to_string(), price_per_hour_cents: 150000 },
                Sport { name: "Futsal".to_string(), price_per_hour_cents: 400000 },
            ],
            amenities: vec!["parking".to_string()],
            available_time: OpeningHours {
                from: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                to: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            },
            images: vec![],
            description: None,
            owner_id: None,
        }
    }

    #[test]
    fn test_create_valid_venue() {
        let owner = Uuid::new_v4();
        let venue = Venue::create(sample_new_venue(), owner, Utc::now()).unwrap();
        assert_eq!(venue.owner_id, owner);
        assert_eq!(venue.sport("badminton ").unwrap().name, "Badminton");
        assert!(venue.sport("Cricket").is_none());
    }

    #[test]
    fn test_sport_invariants() {
        let mut empty = sample_new_venue();
        empty.sports.clear();
        assert!(matches!(
            Venue::create(empty, Uuid::new_v4(), Utc::now()),
            Err(CoreError::ValidationError(_))
        ));

        let mut free = sample_new_venue();
        free.sports[0].price_per_hour_cents = 0;
        assert!(Venue::create(free, Uuid::new_v4(), Utc::now()).is_err());

        let mut dup = sample_new_venue();
        dup.sports[1].name = "BADMINTON".to_string();
        assert!(Venue::create(dup, Uuid::new_v4(), Utc::now()).is_err());

        let mut costly = sample_new_venue();
        costly.sports[0].price_per_hour_cents = MAX_PRICE_PER_HOUR_CENTS;
        assert!(Venue::create(costly.clone(), Uuid::new_v4(), Utc::now()).is_ok());
        costly.sports[0].price_per_hour_cents = i64::MAX / 2;
        assert!(matches!(
            Venue::create(costly, Uuid::new_v4(), Utc::now()),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_opening_hours() {
        let hours = sample_new_venue().available_time;
        assert!(hours.contains(TimeSlot::from_hm(6, 0).unwrap(), 60));
        assert!(hours.contains(TimeSlot::from_hm(21, 0).unwrap(), 60));
        assert!(!hours.contains(TimeSlot::from_hm(22, 0).unwrap(), 60));
        assert!(!hours.contains(TimeSlot::from_hm(5, 0).unwrap(), 60));

        let late = OpeningHours {
            from: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            to: NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        };
        assert!(late.contains(TimeSlot::from_hm(23, 0).unwrap(), 60));

        assert_eq!(hours.slots(60).len(), 16);
        let odd = OpeningHours {
            from: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
            to: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        let starts: Vec<String> = odd.slots(60).iter().map(|s| s.to_string()).collect();
        assert_eq!(starts, vec!["07:00", "08:00"]);
        assert_eq!(late.slots(60).last().map(|s| s.to_string()).as_deref(), Some("23:00"));
    }

    #[test]
    fn test_opening_hours_wire_format() {
        let hours: OpeningHours = serde_json::from_str(r#"{"from":"9:00","to":"21:00"}"#).unwrap();
        assert_eq!(hours.open_minutes(), 9 * 60);
        assert_eq!(serde_json::to_string(&hours).unwrap(), r#"{"from":"09:00","to":"21:00"}"#);
    }

    #[test]
    fn test_failed_update_leaves_venue_untouched() {
        let mut venue = Venue::create(sample_new_venue(), Uuid::new_v4(), Utc::now()).unwrap();
        let result = venue.apply(
            VenueUpdate {
                name: Some("Renamed".to_string()),
                sports: Some(vec![]),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(venue.name, "Arena A");
        assert_eq!(venue.sports.len(), 2);
    }

    #[test]
    fn test_update_appends_images() {
        let mut new = sample_new_venue();
        new.images = vec!["https://img/1.jpg".to_string()];
        let mut venue = Venue::create(new, Uuid::new_v4(), Utc::now()).unwrap();
        venue
            .apply(
                VenueUpdate {
                    images: Some(vec!["https://img/2.jpg".to_string()]),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(venue.images.len(), 2);
    }
}
