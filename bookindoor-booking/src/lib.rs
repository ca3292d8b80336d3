pub mod availability;
pub mod models;
pub mod payment;
pub mod reconciler;
pub mod repository;
pub mod stats;
pub mod writer;

pub use availability::{AvailabilityChecker, DayAvailability};
pub use models::{Booking, BookingRequest, BookingStatus, DateSlots, GuestInfo};
pub use payment::{CheckoutSettings, PaymentPreparer};
pub use reconciler::{PaymentReconciler, ReconcileOutcome, UnchangedReason};
pub use repository::{BookingRepository, InMemoryBookingRepository};
pub use stats::{summarize, StatsReport, StatsService, WindowSummary, WindowedSummary};
pub use writer::BookingWriter;
