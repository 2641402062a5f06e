//! Postgres notification repository
//!
//! Backs the `notification_preferences` and `taxes_due` tables.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NotificationRepository, RepositoryError};
use crate::domain::{NotificationPreferences, TaxDue, TaxDueUpsert};

const TAX_COLUMNS: &str =
    "id, user_id, tax_id, tax_label, due_day, due_month, email, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, RepositoryError> {
        let preferences = sqlx::query_as::<_, NotificationPreferences>(
            "SELECT user_id, preferences, updated_at FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preferences)
    }

    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: Value,
    ) -> Result<NotificationPreferences, RepositoryError> {
        let stored = sqlx::query_as::<_, NotificationPreferences>(
            r#"
            INSERT INTO notification_preferences (user_id, preferences, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET preferences = EXCLUDED.preferences,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, preferences, updated_at
            "#,
        )
        .bind(user_id)
        .bind(preferences)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_taxes(&self, user_id: Uuid) -> Result<Vec<TaxDue>, RepositoryError> {
        let taxes = sqlx::query_as::<_, TaxDue>(&format!(
            "SELECT {TAX_COLUMNS} FROM taxes_due WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(taxes)
    }

    async fn upsert_tax(
        &self,
        user_id: Uuid,
        tax: TaxDueUpsert,
    ) -> Result<Option<TaxDue>, RepositoryError> {
        // The conflict guard keeps another user's row out of reach: the update
        // is skipped and nothing is returned.
        let stored = sqlx::query_as::<_, TaxDue>(&format!(
            r#"
            INSERT INTO taxes_due (id, user_id, tax_id, tax_label, due_day, due_month, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ON CONFLICT (id) DO UPDATE
            SET tax_id = EXCLUDED.tax_id,
                tax_label = EXCLUDED.tax_label,
                due_day = EXCLUDED.due_day,
                due_month = EXCLUDED.due_month,
                email = EXCLUDED.email,
                updated_at = EXCLUDED.updated_at
            WHERE taxes_due.user_id = EXCLUDED.user_id
            RETURNING {TAX_COLUMNS}
            "#
        ))
        .bind(tax.id.unwrap_or_else(Uuid::new_v4))
        .bind(user_id)
        .bind(&tax.tax_id)
        .bind(&tax.tax_label)
        .bind(tax.due_day)
        .bind(tax.due_month)
        .bind(&tax.email)
        .fetch_optional(&self.pool)
        .await?;

        if stored.is_none() {
            tracing::warn!(user_id = %user_id, tax_id = ?tax.id, "Tax reminder upsert hit a row owned by another user");
        }

        Ok(stored)
    }

    async fn delete_tax(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM taxes_due WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
