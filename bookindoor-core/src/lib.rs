pub mod admin;
pub mod clock;
pub mod identity;
pub mod notify;
pub mod payment;
pub mod repository;
pub mod signature;

use chrono::NaiveDate;
use serde::Serialize;

/// A single (date, slot) pair that is already held by another booking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SlotConflict {
    pub date: NaiveDate,
    pub start_time: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Requested slots are already reserved")]
    Conflict(Vec<SlotConflict>),
    #[error("Duplicate record: {0}")]
    DuplicateRecord(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Authentication required: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid payment signature for order {0}")]
    SignatureInvalid(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::InternalError(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
