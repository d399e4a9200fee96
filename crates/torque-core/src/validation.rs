//! # Validation Module
//!
//! Field rules for the forms that feed an order.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (form hints, immediate feedback)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rules, first violation wins           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (UNIQUE plate index, NOT NULL columns)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use torque_core::validation::{validate_document_number, normalize_plate};
//!
//! assert!(validate_document_number("V-1234567").is_ok());
//! assert!(validate_document_number("X-1234567").is_err());
//! assert_eq!(normalize_plate(" abc123 "), "ABC123");
//! ```

use crate::error::ValidationError;
use crate::money::FULL_PERCENT_BPS;
use crate::types::{CheckoutDiscount, NewClient, NewVehicle, PaymentAdjustment};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Oldest model year the shop registers.
pub const MIN_VEHICLE_YEAR: i32 = 1900;

// =============================================================================
// Helpers
// =============================================================================

fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Client
// =============================================================================

/// Validates a national document number: `V-` or `E-` followed by 7 or 8 digits.
///
/// Surrounding whitespace is ignored; the stores persist the trimmed value.
/// The prefix is case-sensitive.
///
/// ## Example
/// ```rust
/// use torque_core::validation::validate_document_number;
///
/// assert!(validate_document_number("E-12345678").is_ok());
/// assert!(validate_document_number("V-123456").is_err());
/// ```
pub fn validate_document_number(document: &str) -> ValidationResult<()> {
    let document = document.trim();
    let invalid = || ValidationError::InvalidFormat {
        field: "document_number".to_string(),
        reason: "expected V- or E- followed by 7 or 8 digits".to_string(),
    };

    let digits = document
        .strip_prefix("V-")
        .or_else(|| document.strip_prefix("E-"))
        .ok_or_else(invalid)?;

    if !(7..=8).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(())
}

/// Validates client form fields.
///
/// ## Rules (checked in order, first violation returned)
/// 1. name present
/// 2. phone present
/// 3. document number present
/// 4. document number matches `^[VE]-\d{7,8}$`
pub fn validate_new_client(client: &NewClient) -> ValidationResult<()> {
    require("name", &client.name)?;
    require("phone", &client.phone)?;
    require("document_number", &client.document_number)?;
    validate_document_number(&client.document_number)?;

    max_len("name", &client.name, 200)?;
    if let Some(email) = client.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must contain @".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Vehicle
// =============================================================================

/// Normalizes a plate for storage and comparison.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

/// Validates vehicle form fields.
///
/// ## Rules (checked in order, first violation returned)
/// make, model, year (`min_year..=max_year`), color, plate, seat type.
pub fn validate_new_vehicle(
    vehicle: &NewVehicle,
    min_year: i32,
    max_year: i32,
) -> ValidationResult<()> {
    require("make", &vehicle.make)?;
    require("model", &vehicle.model)?;

    if vehicle.year < min_year || vehicle.year > max_year {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: min_year as i64,
            max: max_year as i64,
        });
    }

    require("color", &vehicle.color)?;
    require("plate", &vehicle.plate)?;
    max_len("plate", &vehicle.plate, 15)?;
    require("seat_type", &vehicle.seat_type)?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a discount in basis points (0% to 100%).
pub fn validate_discount_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > FULL_PERCENT_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: FULL_PERCENT_BPS as i64,
        });
    }
    Ok(())
}

/// Validates checkout input.
///
/// ## Rules
/// - Percentage discount at most 100%
/// - Fixed discount and surcharge not negative
pub fn validate_payment_adjustment(adjustment: &PaymentAdjustment) -> ValidationResult<()> {
    match adjustment.discount {
        CheckoutDiscount::None => {}
        CheckoutDiscount::Percentage { bps } => validate_discount_bps("discount", bps)?,
        CheckoutDiscount::Fixed { amount_cents } => {
            if amount_cents < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
    }

    if adjustment.surcharge_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "surcharge".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a search query; returns the trimmed text.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    max_len("query", query, 100)?;
    Ok(query.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn client() -> NewClient {
        NewClient {
            name: "Ana".into(),
            phone: "04121112233".into(),
            email: None,
            address: None,
            document_number: "V-1234567".into(),
        }
    }

    fn vehicle() -> NewVehicle {
        NewVehicle {
            client_id: "c1".into(),
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2015,
            color: "Gray".into(),
            plate: "ABC123".into(),
            seat_type: "Leather".into(),
        }
    }

    #[test]
    fn test_document_number() {
        assert!(validate_document_number("V-1234567").is_ok());
        assert!(validate_document_number("E-12345678").is_ok());
        assert!(validate_document_number(" V-1234567 ").is_ok());
        assert!(validate_document_number("V- 1234567").is_err());

        assert!(validate_document_number("X-1234567").is_err());
        assert!(validate_document_number("V-123456").is_err());
        assert!(validate_document_number("V-123456789").is_err());
        assert!(validate_document_number("V1234567").is_err());
        assert!(validate_document_number("v-1234567").is_err());
        assert!(validate_document_number("V-12345a7").is_err());
    }

    #[test]
    fn test_client_rules_checked_in_order() {
        let mut c = client();
        c.name = " ".into();
        c.phone = String::new();
        assert_eq!(validate_new_client(&c).unwrap_err().field(), "name");

        let mut c = client();
        c.phone = String::new();
        c.document_number = String::new();
        assert_eq!(validate_new_client(&c).unwrap_err().field(), "phone");

        let mut c = client();
        c.document_number = String::new();
        assert!(matches!(
            validate_new_client(&c),
            Err(ValidationError::Required { .. })
        ));

        let mut c = client();
        c.document_number = "X-1234567".into();
        assert!(matches!(
            validate_new_client(&c),
            Err(ValidationError::InvalidFormat { .. })
        ));

        assert!(validate_new_client(&client()).is_ok());
    }

    #[test]
    fn test_vehicle_rules() {
        assert!(validate_new_vehicle(&vehicle(), 1900, 2027).is_ok());

        let mut v = vehicle();
        v.year = 1899;
        assert_eq!(validate_new_vehicle(&v, 1900, 2027).unwrap_err().field(), "year");
        v.year = 2028;
        assert!(validate_new_vehicle(&v, 1900, 2027).is_err());
        v.year = 2027;
        assert!(validate_new_vehicle(&v, 1900, 2027).is_ok());

        let mut v = vehicle();
        v.make = String::new();
        v.plate = String::new();
        assert_eq!(validate_new_vehicle(&v, 1900, 2027).unwrap_err().field(), "make");

        let mut v = vehicle();
        v.seat_type = String::new();
        assert_eq!(
            validate_new_vehicle(&v, 1900, 2027).unwrap_err().field(),
            "seat_type"
        );
    }

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate(" abc123 "), "ABC123");
        assert_eq!(normalize_plate("AB-12"), "AB-12");
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_payment_adjustment_bounds() {
        let mut adj = PaymentAdjustment::plain(PaymentMethod::Cash);
        assert!(validate_payment_adjustment(&adj).is_ok());

        adj.discount = CheckoutDiscount::Percentage { bps: 10_001 };
        assert!(validate_payment_adjustment(&adj).is_err());

        adj.discount = CheckoutDiscount::Fixed { amount_cents: -1 };
        assert!(validate_payment_adjustment(&adj).is_err());

        adj.discount = CheckoutDiscount::None;
        adj.surcharge_cents = -500;
        assert_eq!(
            validate_payment_adjustment(&adj).unwrap_err().field(),
            "surcharge"
        );
    }
}
