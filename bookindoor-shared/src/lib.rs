pub mod models;
pub mod pii;
pub mod slot;

pub use pii::Masked;
pub use slot::{SlotParseError, TimeSlot};
