pub mod admin_repo;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod mailer;
pub mod venue_repo;

pub use admin_repo::PgAdminRepository;
pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use mailer::SmtpNotifier;
pub use venue_repo::PgVenueRepository;

use bookindoor_core::CoreError;
use tracing::error;

/// Maps a driver error to the domain. Details stay in the log.
pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    error!("Database error: {:?}", err);
    CoreError::internal("database operation failed")
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Rows written by this service always decode; anything else is corruption.
pub(crate) fn corrupt_row(what: &str, err: impl std::fmt::Display) -> CoreError {
    error!("Corrupt {} row: {}", what, err);
    CoreError::internal(format!("corrupt {} row", what))
}
