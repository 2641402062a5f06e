//! Postgres transaction repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RepositoryError, TransactionRepository};
use crate::domain::{NewTransaction, Transaction, TransactionChanges, TransactionFilter};

const COLUMNS: &str = "id, user_id, type, amount, description, category, date";

/// Transactions stored in the `transactions` table
#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn create(&self, user_id: Uuid, new: NewTransaction) -> Result<Transaction, RepositoryError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (id, user_id, type, amount, description, category, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.kind.as_str())
        .bind(new.amount.value())
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.date)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            transaction_id = %transaction.id,
            user_id = %user_id,
            kind = %transaction.kind,
            "Transaction created"
        );

        Ok(transaction)
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM transactions
            WHERE user_id = $1
              AND ($2::text IS NULL OR type = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::timestamptz IS NULL OR date >= $4)
              AND ($5::timestamptz IS NULL OR date <= $5)
            ORDER BY date DESC
            "#
        ))
        .bind(user_id)
        .bind(filter.kind.map(|kind| kind.as_str()))
        .bind(filter.category.as_deref())
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transaction>, RepositoryError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: TransactionChanges,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET type = COALESCE($3, type),
                amount = COALESCE($4, amount),
                description = COALESCE($5, description),
                category = COALESCE($6, category),
                date = COALESCE($7, date)
            WHERE id = $1 AND user_id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(changes.kind.map(|kind| kind.as_str()))
        .bind(changes.amount.map(|amount| amount.value()))
        .bind(changes.description)
        .bind(changes.category)
        .bind(changes.date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
