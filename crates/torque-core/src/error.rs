//! # Error Types
//!
//! Domain-specific error types for torque-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  torque-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures (names the field)    │
//! │                                                                         │
//! │  torque-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures → CoreError::Persistence        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError → presentation layer      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant except [`CoreError::Persistence`] is operator-recoverable:
//! the operation that raised it left prior state untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Requirement
// =============================================================================

/// A piece of an order that must be present before it can be confirmed.
///
/// Checked in this order; the first one missing is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Client,
    Vehicle,
    ServiceType,
    Employee,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Client => write!(f, "client"),
            Requirement::Vehicle => write!(f, "vehicle"),
            Requirement::ServiceType => write!(f, "at least one service type"),
            Requirement::Employee => write!(f, "assigned employee"),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Everything an order operation can refuse with.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Requested more units than the catalog holds.
    ///
    /// ```text
    /// Add "Wax" (qty: 7)
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Wax", requested: 7, available: 5 }
    ///      │
    ///      ▼
    /// "Only 5 of Wax in stock, 7 wanted"
    /// ```
    #[error("Only {available} of {product} in stock, {requested} wanted")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Another vehicle already carries this plate.
    #[error("Plate {plate} is already registered")]
    DuplicatePlate { plate: String },

    /// Promotion id does not resolve to an available promotion.
    #[error("Unknown promotion: {0}")]
    UnknownPromotion(String),

    /// Product id does not resolve in the catalog.
    #[error("No product with id {0}")]
    ProductNotFound(String),

    /// Any other referenced record is missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Confirm was attempted with a requirement unmet.
    #[error("Order is incomplete: missing {missing}")]
    IncompleteOrder { missing: Requirement },

    /// The order already carries a payment record.
    #[error("Order {order_id} is already paid")]
    AlreadyPaid { order_id: String },

    /// A wizard action was attempted in a step that does not accept it.
    #[error("Cannot {action} while in step {step}")]
    InvalidStep { step: String, action: String },

    #[error("Cart is full ({max} lines)")]
    CartTooLarge { max: usize },

    /// The backing store failed. Not retried automatically.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl CoreError {
    /// Returns true when the operator can fix the input and try again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CoreError::Persistence(_))
    }

    pub fn invalid_step(step: impl fmt::Debug, action: &str) -> Self {
        CoreError::InvalidStep {
            step: format!("{:?}", step),
            action: action.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A client, vehicle, cart or payment field that failed its rule.
///
/// Every variant carries `field` so the form can put the message next to
/// the right input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} cannot be blank")]
    Required { field: String },

    #[error("{field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    /// Vehicle year, discount basis points.
    #[error("{field} must fall within {min}..={max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Document number, phone.
    #[error("{field} is malformed ({reason})")]
    InvalidFormat { field: String, reason: String },

    /// Same client name or phone already on file.
    #[error("a record with {field} = '{value}' is already on file")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        use ValidationError::*;
        match self {
            Required { field }
            | TooLong { field, .. }
            | OutOfRange { field, .. }
            | MustBePositive { field }
            | InvalidFormat { field, .. }
            | Duplicate { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_and_incomplete_messages() {
        let short = CoreError::InsufficientStock {
            product: "Wax".to_string(),
            available: 5,
            requested: 7,
        };
        assert_eq!(short.to_string(), "Only 5 of Wax in stock, 7 wanted");

        let err = CoreError::IncompleteOrder {
            missing: Requirement::ServiceType,
        };
        assert_eq!(
            err.to_string(),
            "Order is incomplete: missing at least one service type"
        );
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::InvalidFormat {
            field: "document_number".to_string(),
            reason: "expected V-1234567".to_string(),
        };
        assert_eq!(err.field(), "document_number");
        assert_eq!(
            err.to_string(),
            "document_number is malformed (expected V-1234567)"
        );
    }

    #[test]
    fn test_only_persistence_is_unrecoverable() {
        let blank: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert_eq!(blank.to_string(), "Invalid input: name cannot be blank");
        assert!(blank.is_recoverable());
        assert!(!CoreError::Persistence("down".into()).is_recoverable());
    }
}
