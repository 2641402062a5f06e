//! Notification endpoints
//!
//! Per-user preference document and tax-due reminders.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::extract::ApiJson;
use crate::domain::{AuthenticatedUser, DomainError, TaxDue, TaxDueUpsert};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const TAX_NOT_FOUND: &str = "Tax reminder not found";

#[derive(Debug, Default, Deserialize)]
pub struct PreferencesRequest {
    #[serde(default)]
    pub preferences: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub preferences: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SavedPreferencesResponse {
    pub ok: bool,
    pub preferences: Value,
}

/// Reminder payload. `tax_id` is free-form and may arrive as a number.
#[derive(Debug, Default, Deserialize)]
pub struct TaxRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tax_id: Option<Value>,
    #[serde(default)]
    pub tax_label: Option<String>,
    #[serde(default)]
    pub due_day: Option<i64>,
    #[serde(default)]
    pub due_month: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

impl TaxRequest {
    pub fn into_upsert(self) -> Result<TaxDueUpsert, DomainError> {
        let mut upsert = TaxDueUpsert::new(self.tax_label.unwrap_or_default())?;

        if let Some(raw) = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let id = Uuid::parse_str(raw)
                .map_err(|_| DomainError::Invalid(format!("Invalid tax reminder id: {}", raw)))?;
            upsert = upsert.with_id(id);
        }

        match self.tax_id {
            None => {}
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(Value::String(s)) => upsert = upsert.with_tax_id(s),
            Some(Value::Number(n)) => upsert = upsert.with_tax_id(n.to_string()),
            Some(_) => {
                return Err(DomainError::Invalid(
                    "tax_id must be a string or a number".to_string(),
                ))
            }
        }

        if let Some(day) = self.due_day {
            upsert = upsert.with_due_day(day)?;
        }
        if let Some(month) = self.due_month {
            upsert = upsert.with_due_month(month)?;
        }
        if let Some(email) = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
            upsert = upsert.with_email(email);
        }

        Ok(upsert)
    }
}

#[derive(Debug, Serialize)]
pub struct TaxListResponse {
    pub taxes: Vec<TaxDue>,
}

#[derive(Debug, Serialize)]
pub struct SavedTaxResponse {
    pub ok: bool,
    pub tax: TaxDue,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn tax_not_found() -> AppError {
    AppError::NotFound(TAX_NOT_FOUND.to_string())
}

// =========================================================================
// GET /api/notifications/preferences
// =========================================================================

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<PreferencesResponse>> {
    let row = state.notifications.get_preferences(user.id).await?;
    Ok(Json(PreferencesResponse {
        preferences: row.map(|r| r.preferences),
    }))
}

// =========================================================================
// POST /api/notifications/preferences
// =========================================================================

pub async fn save_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<PreferencesRequest>,
) -> AppResult<Json<SavedPreferencesResponse>> {
    let preferences = request
        .preferences
        .ok_or_else(|| AppError::Validation("preferences required".to_string()))?;

    let saved = state
        .notifications
        .upsert_preferences(user.id, preferences)
        .await?;

    tracing::debug!(user_id = %user.id, "Notification preferences saved");

    Ok(Json(SavedPreferencesResponse {
        ok: true,
        preferences: saved.preferences,
    }))
}

// =========================================================================
// GET /api/notifications/taxes
// =========================================================================

pub async fn list_taxes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<TaxListResponse>> {
    let taxes = state.notifications.list_taxes(user.id).await?;
    Ok(Json(TaxListResponse { taxes }))
}

// =========================================================================
// POST /api/notifications/taxes
// =========================================================================

pub async fn save_tax(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<TaxRequest>,
) -> AppResult<Json<SavedTaxResponse>> {
    let upsert = request.into_upsert()?;

    let tax = state
        .notifications
        .upsert_tax(user.id, upsert)
        .await?
        .ok_or_else(tax_not_found)?;

    tracing::info!(user_id = %user.id, tax_id = %tax.id, "Tax reminder saved");

    Ok(Json(SavedTaxResponse { ok: true, tax }))
}

// =========================================================================
// DELETE /api/notifications/taxes/:id
// =========================================================================

pub async fn delete_tax(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("Invalid tax reminder id".to_string()))?;

    if !state.notifications.delete_tax(user.id, id).await? {
        return Err(tax_not_found());
    }

    tracing::info!(user_id = %user.id, tax_id = %id, "Tax reminder deleted");

    Ok(Json(OkResponse { ok: true }))
}
