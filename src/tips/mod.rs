//! Financial tips
//!
//! Asks a generative text provider for personalised advice and falls back to
//! a handful of threshold rules when the provider fails or answers with
//! something unusable. Either way the caller gets exactly [`TIP_COUNT`] tips.

mod gemini;

pub use gemini::{GeminiClient, GenerationError, TextGenerator};

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

pub const TIP_COUNT: usize = 4;

const TIP_REDUCE_SPENDING: &str = "Revisa y reduce gastos no esenciales este mes";
const TIP_BUDGET_RULE: &str = "Crea un presupuesto 50/30/20: necesidades/deseos/ahorros";
const TIP_AUTOMATE_SAVINGS: &str = "Automatiza un 10% de tus ingresos para ahorro de emergencia";
const TIP_SUBSCRIPTIONS: &str = "Revisa suscripciones mensuales y cancela las que no uses";

/// Used only to fill the list up to TIP_COUNT
const RESERVE_TIPS: &[&str] = &[
    "Registra cada gasto durante un mes para detectar fugas de dinero",
    "Define una meta de ahorro concreta y revisa tu progreso cada semana",
];

/// Aggregate figures the tips are based on
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSnapshot {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub expenses_by_category: Map<String, Value>,
}

impl FinancialSnapshot {
    pub fn net_balance(&self) -> Decimal {
        self.total_income - self.total_expenses
    }

    /// Spending above 80% of income
    fn is_overspending(&self) -> bool {
        self.total_expenses > self.total_income * Decimal::new(8, 1)
    }
}

/// Result of a tips request. Both arms carry exactly TIP_COUNT tips.
#[derive(Debug, Clone, PartialEq)]
pub enum TipsOutcome {
    Generated(Vec<String>),
    Fallback { tips: Vec<String>, reason: String },
}

impl TipsOutcome {
    pub fn tips(&self) -> &[String] {
        match self {
            TipsOutcome::Generated(tips) => tips,
            TipsOutcome::Fallback { tips, .. } => tips,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, TipsOutcome::Generated(_))
    }
}

/// Response body for the tips endpoint
#[derive(Debug, Serialize)]
pub struct TipsResponse {
    pub success: bool,
    pub tips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TipsOutcome> for TipsResponse {
    fn from(outcome: TipsOutcome) -> Self {
        match outcome {
            TipsOutcome::Generated(tips) => Self {
                success: true,
                tips,
                error: None,
            },
            TipsOutcome::Fallback { tips, reason } => Self {
                success: false,
                tips,
                error: Some(reason),
            },
        }
    }
}

/// Produces tips for a snapshot. Without a generator every request uses the
/// fallback rules.
#[derive(Clone)]
pub struct TipsService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl TipsService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, snapshot: &FinancialSnapshot) -> TipsOutcome {
        let Some(generator) = &self.generator else {
            return fallback(snapshot, GenerationError::NotConfigured.to_string());
        };

        match generator.generate(&build_prompt(snapshot)).await {
            Ok(text) => match parse_tips(&text) {
                Some(tips) => TipsOutcome::Generated(tips),
                None => {
                    tracing::warn!(response_len = text.len(), "Generated tips were malformed, using fallback");
                    fallback(snapshot, "malformed tips response".to_string())
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Tips generation failed, using fallback");
                fallback(snapshot, e.to_string())
            }
        }
    }
}

fn fallback(snapshot: &FinancialSnapshot, reason: String) -> TipsOutcome {
    TipsOutcome::Fallback {
        tips: fallback_tips(snapshot),
        reason,
    }
}

/// Fixed-shape advisor prompt
pub fn build_prompt(snapshot: &FinancialSnapshot) -> String {
    let categories = Value::Object(snapshot.expenses_by_category.clone());
    format!(
        "Actúa como asesor financiero experto. Un usuario tiene estos datos:\n\
         \n\
         SITUACIÓN FINANCIERA:\n\
         - Ingresos totales: ${income}\n\
         - Gastos totales: ${expenses}\n\
         - Balance neto: ${balance}\n\
         - Categorías de gastos: {categories}\n\
         \n\
         DAME EXACTAMENTE {count} CONSEJOS:\n\
         - Personalizados para su situación\n\
         - Prácticos y accionables\n\
         - Máximo 25 palabras por consejo\n\
         - En español\n\
         - Formato: \"1. [consejo]\\n2. [consejo]\\n...\"\n",
        income = snapshot.total_income,
        expenses = snapshot.total_expenses,
        balance = snapshot.net_balance(),
        categories = categories,
        count = TIP_COUNT,
    )
}

/// One tip per non-blank line. Fewer than TIP_COUNT lines is malformed.
pub fn parse_tips(text: &str) -> Option<Vec<String>> {
    let tips: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TIP_COUNT)
        .map(str::to_string)
        .collect();

    (tips.len() == TIP_COUNT).then_some(tips)
}

/// Rule-based tips, numbered by position
pub fn fallback_tips(snapshot: &FinancialSnapshot) -> Vec<String> {
    let mut tips = Vec::with_capacity(TIP_COUNT);

    if snapshot.is_overspending() {
        tips.push(TIP_REDUCE_SPENDING);
    }
    if snapshot.net_balance() < Decimal::ZERO {
        tips.push(TIP_BUDGET_RULE);
    }
    tips.push(TIP_AUTOMATE_SAVINGS);
    tips.push(TIP_SUBSCRIPTIONS);

    for reserve in RESERVE_TIPS.iter().copied() {
        if tips.len() >= TIP_COUNT {
            break;
        }
        tips.push(reserve);
    }

    tips.into_iter()
        .take(TIP_COUNT)
        .enumerate()
        .map(|(i, tip)| format!("{}. {}", i + 1, tip))
        .collect()
}
