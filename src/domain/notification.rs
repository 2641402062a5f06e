//! Notification types
//!
//! Per-user notification preferences and tax-due reminders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::DomainError;

/// One row per user, keyed by `user_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub preferences: Value,
    pub updated_at: DateTime<Utc>,
}

/// A tax-due reminder row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaxDue {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tax_id: Option<String>,
    pub tax_label: String,
    pub due_day: Option<i32>,
    pub due_month: Option<i32>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated create-or-replace request for a reminder. Without `id` a new row
/// is created; with `id` the caller's existing row is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxDueUpsert {
    pub id: Option<Uuid>,
    pub tax_id: Option<String>,
    pub tax_label: String,
    pub due_day: Option<i32>,
    pub due_month: Option<i32>,
    pub email: Option<String>,
}

impl TaxDueUpsert {
    pub fn new(tax_label: impl Into<String>) -> Result<Self, DomainError> {
        let tax_label = tax_label.into();
        if tax_label.trim().is_empty() {
            return Err(DomainError::Invalid("tax_label required".to_string()));
        }

        Ok(Self {
            id: None,
            tax_id: None,
            tax_label,
            due_day: None,
            due_month: None,
            email: None,
        })
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_due_day(mut self, day: i64) -> Result<Self, DomainError> {
        self.due_day = Some(in_range(day, "due_day", 1, 31)?);
        Ok(self)
    }

    pub fn with_due_month(mut self, month: i64) -> Result<Self, DomainError> {
        self.due_month = Some(in_range(month, "due_month", 1, 12)?);
        Ok(self)
    }
}

fn in_range(value: i64, field: &'static str, min: i32, max: i32) -> Result<i32, DomainError> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(DomainError::OutOfRange { field, min, max });
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_label_rejected() {
        assert!(matches!(
            TaxDueUpsert::new("   "),
            Err(DomainError::Invalid(msg)) if msg == "tax_label required"
        ));
    }

    #[test]
    fn test_due_date_ranges() {
        let upsert = TaxDueUpsert::new("IVA")
            .unwrap()
            .with_due_day(31)
            .unwrap()
            .with_due_month(12)
            .unwrap();
        assert_eq!(upsert.due_day, Some(31));
        assert_eq!(upsert.due_month, Some(12));

        assert!(matches!(
            TaxDueUpsert::new("IVA").unwrap().with_due_day(0),
            Err(DomainError::OutOfRange { field: "due_day", .. })
        ));
        assert!(matches!(
            TaxDueUpsert::new("IVA").unwrap().with_due_month(13),
            Err(DomainError::OutOfRange { field: "due_month", .. })
        ));
    }
}
