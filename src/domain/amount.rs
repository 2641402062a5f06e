//! Amount type
//!
//! Numeric input validation for monetary values. Every monetary value that
//! enters the system arrives as JSON, and the only accepted shape is a JSON
//! number: strings, booleans and null are rejected no matter how numeric they
//! look.

use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Maximum allowed value (1 trillion)
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Maximum decimal places (8)
const MAX_SCALE: u32 = 8;

/// Amount represents a validated transaction amount.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Maximum 8 decimal places
/// - Maximum value is 1 trillion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount with validation.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount);
        }

        if value.scale() > MAX_SCALE {
            return Err(DomainError::TooManyDecimals {
                field: "amount",
                max: MAX_SCALE,
            });
        }

        if value > MAX_AMOUNT {
            return Err(DomainError::TooLarge { field: "amount" });
        }

        Ok(Self(value))
    }

    /// Validate the `amount` field of a JSON payload
    pub fn from_json(value: Option<&Value>) -> Result<Self, DomainError> {
        Self::new(require_number(value, "amount")?)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative aggregate figure such as a total income. Unlike Amount, zero
/// is accepted.
pub fn non_negative_figure(value: Option<&Value>, field: &'static str) -> Result<Decimal, DomainError> {
    let figure = require_number(value, field)?;
    if figure < Decimal::ZERO {
        return Err(DomainError::Negative { field });
    }
    if figure > MAX_AMOUNT {
        return Err(DomainError::TooLarge { field });
    }
    Ok(figure)
}

/// Require a JSON number and convert it without going through f64 when the
/// literal is a plain decimal.
pub fn require_number(value: Option<&Value>, field: &'static str) -> Result<Decimal, DomainError> {
    match value {
        None | Some(Value::Null) => Err(DomainError::MissingField(field)),
        Some(Value::Number(number)) => {
            let literal = number.to_string();
            Decimal::from_str(&literal)
                .or_else(|_| Decimal::from_scientific(&literal))
                .map_err(|_| DomainError::NotNumeric { field })
        }
        Some(_) => Err(DomainError::NotNumeric { field }),
    }
}
