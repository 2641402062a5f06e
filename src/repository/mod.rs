//! Repository module
//!
//! Row-store access for the resource handlers. Every read, update and delete
//! takes the owner's id and filters on it; there is no method that reaches
//! across users.

mod notifications;
mod transactions;

pub use notifications::PgNotificationRepository;
pub use transactions::PgTransactionRepository;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    NewTransaction, NotificationPreferences, TaxDue, TaxDueUpsert, Transaction,
    TransactionChanges, TransactionFilter,
};

/// Errors that can occur in the row store
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, new: NewTransaction) -> Result<Transaction, RepositoryError>;

    /// Newest first
    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, RepositoryError>;

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transaction>, RepositoryError>;

    /// `None` when no row with this id belongs to the user
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: TransactionChanges,
    ) -> Result<Option<Transaction>, RepositoryError>;

    /// Returns whether a row was removed
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, RepositoryError>;

    /// Create-or-replace keyed by `user_id`
    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: Value,
    ) -> Result<NotificationPreferences, RepositoryError>;

    /// Newest first
    async fn list_taxes(&self, user_id: Uuid) -> Result<Vec<TaxDue>, RepositoryError>;

    /// Create-or-replace keyed by `id`. `None` when the id already exists but
    /// belongs to another user; that row is left untouched.
    async fn upsert_tax(
        &self,
        user_id: Uuid,
        tax: TaxDueUpsert,
    ) -> Result<Option<TaxDue>, RepositoryError>;

    /// Returns whether a row was removed
    async fn delete_tax(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError>;
}
