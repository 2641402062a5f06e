//! Transaction endpoints
//!
//! Every operation is scoped to the authenticated caller. A transaction that
//! exists but belongs to someone else is reported exactly like one that does
//! not exist.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::extract::ApiJson;
use super::MessageResponse;
use crate::domain::{
    parse_date, Amount, AuthenticatedUser, DomainError, NewTransaction, Transaction,
    TransactionChanges, TransactionFilter, TransactionStats, TransactionType,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const NOT_FOUND: &str = "Transacción no encontrada";

/// Body of create and update requests. Unknown fields, including any
/// `id` or `user_id`, are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPayload {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl TransactionPayload {
    /// Validate a create request. Type defaults to expense and date to now.
    pub fn into_new(self) -> Result<NewTransaction, DomainError> {
        let amount = Amount::from_json(self.amount.as_ref())?;
        let category = non_blank(self.category).ok_or(DomainError::MissingField("category"))?;

        Ok(NewTransaction {
            kind: self
                .kind
                .as_deref()
                .map(str::parse::<TransactionType>)
                .transpose()?
                .unwrap_or(TransactionType::Expense),
            amount,
            description: self.description,
            category,
            date: self
                .date
                .as_deref()
                .map(parse_date)
                .transpose()?
                .unwrap_or_else(Utc::now),
        })
    }

    /// Validate an update request. Only the supplied fields change.
    pub fn into_changes(self) -> Result<TransactionChanges, DomainError> {
        let amount = match self.amount {
            Some(ref value) => Some(Amount::from_json(Some(value))?),
            None => None,
        };

        let category = match self.category {
            Some(category) => {
                Some(non_blank(Some(category)).ok_or(DomainError::MissingField("category"))?)
            }
            None => None,
        };

        Ok(TransactionChanges {
            kind: self.kind.as_deref().map(str::parse::<TransactionType>).transpose()?,
            amount,
            description: self.description,
            category,
            date: self.date.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// List query string: `?type=&category=&dateFrom=&dateTo=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}

impl TransactionQuery {
    /// Empty parameters are treated as absent
    pub fn into_filter(self) -> Result<TransactionFilter, DomainError> {
        Ok(TransactionFilter {
            kind: non_blank(self.kind).as_deref().map(str::parse::<TransactionType>).transpose()?,
            category: non_blank(self.category),
            date_from: non_blank(self.date_from).as_deref().map(parse_date).transpose()?,
            date_to: non_blank(self.date_to).as_deref().map(parse_date).transpose()?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_transaction_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid transaction id".to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.to_string())
}

// =========================================================================
// GET /api/transactions
// =========================================================================

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TransactionQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    let filter = query.into_filter()?;
    let transactions = state.transactions.list(user.id, &filter).await?;
    Ok(Json(transactions))
}

// =========================================================================
// POST /api/transactions
// =========================================================================

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(payload): ApiJson<TransactionPayload>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let new = payload.into_new()?;
    let transaction = state.transactions.create(user.id, new).await?;

    tracing::info!(
        user_id = %user.id,
        transaction_id = %transaction.id,
        kind = %transaction.kind,
        "Transaction created"
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

// =========================================================================
// GET /api/transactions/:id
// =========================================================================

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Transaction>> {
    let id = parse_transaction_id(&id)?;
    state
        .transactions
        .find(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

// =========================================================================
// PUT/PATCH /api/transactions/:id
// =========================================================================

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<TransactionPayload>,
) -> AppResult<Json<Transaction>> {
    let id = parse_transaction_id(&id)?;
    let changes = payload.into_changes()?;
    if changes.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    let transaction = state
        .transactions
        .update(user.id, id, changes)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(user_id = %user.id, transaction_id = %id, "Transaction updated");

    Ok(Json(transaction))
}

// =========================================================================
// DELETE /api/transactions/:id
// =========================================================================

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_transaction_id(&id)?;
    if !state.transactions.delete(user.id, id).await? {
        return Err(not_found());
    }

    tracing::info!(user_id = %user.id, transaction_id = %id, "Transaction deleted");

    Ok(Json(MessageResponse::new("Transacción eliminada")))
}

// =========================================================================
// GET /api/transactions/stats
// =========================================================================

pub async fn transaction_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<TransactionStats>> {
    let transactions = state
        .transactions
        .list(user.id, &TransactionFilter::default())
        .await?;
    Ok(Json(TransactionStats::from_transactions(&transactions)))
}
