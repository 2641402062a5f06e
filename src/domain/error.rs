//! Domain Error Types
//!
//! Pure validation errors that don't depend on infrastructure.

use thiserror::Error;

/// Input validation failures. Every variant maps to a 400 response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Required field absent or null
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Field present but not a JSON number
    #[error("{field} must be a number")]
    NotNumeric { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("{field} has too many decimal places (max {max})")]
    TooManyDecimals { field: &'static str, max: u32 },

    #[error("{field} exceeds the maximum allowed value")]
    TooLarge { field: &'static str },

    /// Transaction type outside the two allowed tags
    #[error("type must be 'income' or 'expense' (got '{0}')")]
    InvalidTransactionType(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i32,
        max: i32,
    },

    /// Free-form validation message kept verbatim in the response
    #[error("{0}")]
    Invalid(String),
}
