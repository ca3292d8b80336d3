pub mod admins;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod stats;
pub mod venues;
