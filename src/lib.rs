//! MoneyFlow Library
//!
//! Personal finance backend: transactions, notification settings, tax-due
//! reminders and generated financial tips, behind bearer-token auth.
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod identity;
pub mod repository;
pub mod state;
pub mod tips;

pub use api::{create_router, CorsPolicy};
pub use config::Config;
pub use domain::{Amount, AuthenticatedUser, DomainError, Transaction, TransactionType};
pub use error::{AppError, AppResult};
pub use state::AppState;
