//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Checkout / domain rule failures                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What clients see (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is detected before any write happens and carries enough
/// detail for the caller to act on it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An order was submitted without any line.
    #[error("Transaction must contain at least one item")]
    EmptyOrder,

    /// One or more referenced products do not exist in the organization.
    #[error("Products not found: {}", .0.join(", "))]
    ProductsNotFound(Vec<String>),

    /// The discount code is unknown in the organization.
    #[error("Discount code not found: {0}")]
    DiscountNotFound(String),

    /// Insufficient stock to complete the order.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /transactions [{ product: "Kopi", quantity: 5 }]
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Kopi", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A line total or order sum does not fit in i64 cents.
    #[error("Order amount is too large")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the boundary before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A field that must not be set for this combination was set.
    #[error("{field} must not be set {reason}")]
    NotAllowed { field: String, reason: String },

    /// Start of a date range lies after its end.
    #[error("start_date must not be after end_date")]
    InvalidDateRange,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Kopi Susu".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Kopi Susu: available 3, requested 5"
        );

        let err = CoreError::ProductsNotFound(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Products not found: a, b");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::NotAllowed {
            field: "product_id".to_string(),
            reason: "for whole_order discounts".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "product_id must not be set for whole_order discounts"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::InvalidDateRange.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
