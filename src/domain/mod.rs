//! Domain module
//!
//! Core domain types and input validation.

pub mod amount;
pub mod error;
pub mod notification;
pub mod transaction;
pub mod user;

pub use amount::{non_negative_figure, require_number, Amount};
pub use error::DomainError;
pub use notification::{NotificationPreferences, TaxDue, TaxDueUpsert};
pub use transaction::{
    parse_date, NewTransaction, Transaction, TransactionChanges, TransactionFilter,
    TransactionStats, TransactionType,
};
pub use user::AuthenticatedUser;
