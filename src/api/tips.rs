//! Tips endpoint

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::extract::ApiJson;
use crate::domain::{non_negative_figure, DomainError};
use crate::error::{AppError, AppResult};
use crate::tips::{FinancialSnapshot, TipsResponse, TipsService};

const INCOMPLETE_DATA: &str = "Datos financieros incompletos";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipsRequest {
    #[serde(default)]
    pub total_income: Option<Value>,
    #[serde(default)]
    pub total_expenses: Option<Value>,
    #[serde(default)]
    pub expenses_by_category: Option<Value>,
}

impl TipsRequest {
    pub fn into_snapshot(self) -> AppResult<FinancialSnapshot> {
        if self.total_income.is_none() || self.total_expenses.is_none() {
            return Err(AppError::Validation(INCOMPLETE_DATA.to_string()));
        }

        let total_income = non_negative_figure(self.total_income.as_ref(), "totalIncome")?;
        let total_expenses = non_negative_figure(self.total_expenses.as_ref(), "totalExpenses")?;

        let expenses_by_category = match self.expenses_by_category {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(DomainError::Invalid(
                    "expensesByCategory must be an object".to_string(),
                )
                .into())
            }
        };

        Ok(FinancialSnapshot {
            total_income,
            total_expenses,
            expenses_by_category,
        })
    }
}

// =========================================================================
// POST /api/tips
// =========================================================================

/// Always answers 200 once the input is valid; provider trouble shows up as
/// `success: false` with fallback tips.
pub async fn generate_tips(
    State(tips): State<TipsService>,
    ApiJson(request): ApiJson<TipsRequest>,
) -> AppResult<Json<TipsResponse>> {
    let snapshot = request.into_snapshot()?;
    let outcome = tips.generate(&snapshot).await;

    tracing::debug!(generated = outcome.is_generated(), "Tips produced");

    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request(body: Value) -> TipsRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_missing_figures() {
        let err = request(json!({ "totalIncome": 1000 }))
            .into_snapshot()
            .unwrap_err();
        assert_eq!(err.to_string(), INCOMPLETE_DATA);
    }

    #[test]
    fn test_zero_is_allowed_negative_is_not() {
        let snapshot = request(json!({ "totalIncome": 0, "totalExpenses": 0 }))
            .into_snapshot()
            .unwrap();
        assert_eq!(snapshot.total_income, dec!(0));
        assert!(snapshot.expenses_by_category.is_empty());

        assert!(request(json!({ "totalIncome": -1, "totalExpenses": 0 }))
            .into_snapshot()
            .is_err());
    }

    #[test]
    fn test_string_figures_rejected() {
        assert!(request(json!({ "totalIncome": "1000", "totalExpenses": 10 }))
            .into_snapshot()
            .is_err());
    }

    #[test]
    fn test_categories_must_be_object() {
        assert!(request(json!({
            "totalIncome": 10,
            "totalExpenses": 5,
            "expensesByCategory": ["food"]
        }))
        .into_snapshot()
        .is_err());
    }
}
