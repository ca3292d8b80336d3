use bookindoor_catalog::sport_key;
use bookindoor_core::payment::{PaymentMode, PaymentStatus};
use bookindoor_core::{CoreError, SlotConflict};
use bookindoor_shared::{Masked, TimeSlot};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking lifecycle, independent of how much has been paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Active bookings hold their slots.
    pub fn holds_slots(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::validation(format!("Unknown booking status: {}", other))),
        }
    }
}

/// Contact details captured on the booking itself; no account required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub phone: Masked<String>,
    pub nic_number: Masked<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The slots requested on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateSlots {
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub venue_id: Uuid,
    pub sport_name: String,
    pub guest: GuestInfo,
    pub bookings: Vec<DateSlots>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

/// One venue, one sport, one date, one or more slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub sport_name: String,
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
    pub guest: GuestInfo,
    pub user_id: Option<Uuid>,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    /// Total price at booking time, in cents
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Counts toward income and booking totals.
    pub fn is_revenue(&self) -> bool {
        !self.is_cancelled() && self.payment_status.is_paid()
    }

    /// Sport names match on `sport_key`, so a venue renaming "Badminton" to
    /// "badminton" keeps its existing bookings in force.
    pub fn holds(&self, venue_id: Uuid, sport_name: &str, date: NaiveDate) -> bool {
        self.status.holds_slots()
            && self.venue_id == venue_id
            && self.date == date
            && sport_key(&self.sport_name) == sport_key(sport_name)
    }

    /// Slots of `self` that `other` also holds.
    pub fn overlapping(&self, other: &Booking) -> Vec<SlotConflict> {
        if !other.holds(self.venue_id, &self.sport_name, self.date) {
            return Vec::new();
        }
        self.time_slots
            .iter()
            .filter(|slot| other.time_slots.contains(slot))
            .map(|slot| SlotConflict {
                date: self.date,
                start_time: slot.to_string(),
            })
            .collect()
    }
}
