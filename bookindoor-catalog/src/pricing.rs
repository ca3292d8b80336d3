use bookindoor_core::payment::{percent_of, PaymentMode};
use bookindoor_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

use crate::venue::Sport;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Business rules that turn an hourly sport price into what a booking costs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Width of one bookable slot
    pub slot_minutes: u32,

    /// Share of the total charged up front in advance mode
    pub advance_percent: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            slot_minutes: 60,
            advance_percent: 50,
        }
    }
}

impl PricingPolicy {
    pub fn new(slot_minutes: u32, advance_percent: u32) -> CoreResult<Self> {
        if slot_minutes == 0 || MINUTES_PER_DAY % slot_minutes != 0 {
            return Err(CoreError::ConfigurationError(format!(
                "Slot width must divide a day evenly, got {} minutes",
                slot_minutes
            )));
        }
        if advance_percent == 0 || advance_percent > 100 {
            return Err(CoreError::ConfigurationError(format!(
                "Advance percentage must be within 1..=100, got {}",
                advance_percent
            )));
        }
        Ok(Self {
            slot_minutes,
            advance_percent,
        })
    }

    /// Price of a single slot, rounded half-up to the cent.
    pub fn slot_price(&self, sport: &Sport) -> CoreResult<i64> {
        sport
            .price_per_hour_cents
            .checked_mul(i64::from(self.slot_minutes))
            .and_then(|scaled| scaled.checked_add(30))
            .map(|scaled| scaled / 60)
            .ok_or_else(|| overflow(&sport.name))
    }

    /// Snapshot stored on the booking.
    pub fn booking_amount(&self, sport: &Sport, slot_count: usize) -> CoreResult<i64> {
        let count = i64::try_from(slot_count).map_err(|_| overflow(&sport.name))?;
        self.slot_price(sport)?
            .checked_mul(count)
            .ok_or_else(|| overflow(&sport.name))
    }

    /// What the gateway is asked to collect now.
    pub fn amount_due(&self, amount_cents: i64, mode: PaymentMode) -> CoreResult<i64> {
        match mode {
            PaymentMode::Full => Ok(amount_cents),
            PaymentMode::Advance => percent_of(amount_cents, self.advance_percent)
                .ok_or_else(|| CoreError::validation(format!("Amount {} is out of range", amount_cents))),
        }
    }
}

fn overflow(sport: &str) -> CoreError {
    CoreError::validation(format!("Price for {} is out of range", sport))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badminton() -> Sport {
        Sport {
            name: "Badminton".to_string(),
            price_per_hour_cents: 150000,
        }
    }

    #[test]
    fn test_hourly_slots() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.slot_price(&badminton()).unwrap(), 150000);
        assert_eq!(policy.booking_amount(&badminton(), 2).unwrap(), 300000);
    }

    #[test]
    fn test_half_hour_slots() {
        let policy = PricingPolicy::new(30, 50).unwrap();
        assert_eq!(policy.slot_price(&badminton()).unwrap(), 75000);

        let odd = Sport {
            name: "Squash".to_string(),
            price_per_hour_cents: 101,
        };
        // 50.5 rounds up
        assert_eq!(policy.slot_price(&odd).unwrap(), 51);
    }

    #[test]
    fn test_amount_due() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.amount_due(300000, PaymentMode::Full).unwrap(), 300000);
        assert_eq!(policy.amount_due(300000, PaymentMode::Advance).unwrap(), 150000);
        assert_eq!(policy.amount_due(150001, PaymentMode::Advance).unwrap(), 75001);
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        let policy = PricingPolicy::default();
        let huge = Sport {
            name: "Badminton".to_string(),
            price_per_hour_cents: i64::MAX / 2,
        };
        assert!(matches!(policy.slot_price(&huge), Err(CoreError::ValidationError(_))));
        assert!(matches!(
            policy.booking_amount(&badminton(), usize::MAX),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            policy.amount_due(i64::MAX, PaymentMode::Advance),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rules() {
        assert!(PricingPolicy::new(0, 50).is_err());
        assert!(PricingPolicy::new(7, 50).is_err());
        assert!(PricingPolicy::new(60, 0).is_err());
        assert!(PricingPolicy::new(60, 150).is_err());
    }
}
