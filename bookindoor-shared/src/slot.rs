use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Start time of a fixed-width bookable slot, normalized to minute precision.
///
/// Two slots conflict only when their normalized start times are equal, so
/// `"9:00"`, `"09:00"` and `"09:00:00"` all parse to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotParseError {
    #[error("Invalid slot start time: {0:?}")]
    Malformed(String),
    #[error("Slot start time must be on a whole minute: {0:?}")]
    SubMinute(String),
}

impl TimeSlot {
    pub fn parse(raw: &str) -> Result<Self, SlotParseError> {
        let trimmed = raw.trim();
        let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| SlotParseError::Malformed(raw.to_string()))?;

        if time.second() != 0 || time.nanosecond() != 0 {
            return Err(SlotParseError::SubMinute(raw.to_string()));
        }

        Ok(Self(time))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn start(&self) -> NaiveTime {
        self.0
    }

    pub fn minutes_from_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    /// Minutes from midnight at which a slot of the given width ends.
    pub fn end_minutes(&self, width_minutes: u32) -> u32 {
        self.minutes_from_midnight() + width_minutes
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        TimeSlot::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_start_time() {
        let a = TimeSlot::parse("9:00").unwrap();
        let b = TimeSlot::parse("09:00").unwrap();
        let c = TimeSlot::parse(" 09:00:00 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.to_string(), "09:00");
    }

    #[test]
    fn test_rejects_garbage_and_seconds() {
        assert!(matches!(TimeSlot::parse("nine"), Err(SlotParseError::Malformed(_))));
        assert!(matches!(TimeSlot::parse("25:00"), Err(SlotParseError::Malformed(_))));
        assert!(matches!(TimeSlot::parse("09:00:30"), Err(SlotParseError::SubMinute(_))));
    }

    #[test]
    fn test_slot_end() {
        let slot = TimeSlot::from_hm(22, 30).unwrap();
        assert_eq!(slot.minutes_from_midnight(), 22 * 60 + 30);
        assert_eq!(slot.end_minutes(60), 23 * 60 + 30);
    }

    #[test]
    fn test_serde_uses_hh_mm() {
        let slot: TimeSlot = serde_json::from_str("\"7:00\"").unwrap();
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"07:00\"");
        assert!(serde_json::from_str::<TimeSlot>("\"noon\"").is_err());
    }
}
