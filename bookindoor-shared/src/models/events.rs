use chrono::NaiveDate;
use uuid::Uuid;

use crate::slot::TimeSlot;

/// Emitted once per booking, on the notification that first advances its payment status.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub venue_id: Uuid,
    pub venue_name: String,
    pub sport_name: String,
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
    pub guest_name: String,
    pub guest_email: Option<String>,
    pub admin_email: Option<String>,
    pub amount_paid: String,
    pub currency: String,
    pub advance: bool,
    pub timestamp: i64,
}

impl BookingConfirmedEvent {
    pub fn slot_summary(&self) -> String {
        self.time_slots
            .iter()
            .map(|slot| slot.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
