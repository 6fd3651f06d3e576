//! # Validation Module
//!
//! Boundary checks for everything a client sends to Tally POS.
//!
//! ## Where validation happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler (apps/api)                                               │
//! │  ├── serde: shape and types                                            │
//! │  └── THIS MODULE: field rules, ranges, date windows, paging            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  SQLite (tally-db)                                                     │
//! │  ├── CHECK (stock >= 0), bundle column pairing                         │
//! │  ├── UNIQUE (organization_id, code)                                    │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_code, validate_quantity};
//!
//! validate_code("WEEKEND-10").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::money::{Money, Percentage};
use crate::types::{BundleTier, DateRange, DiscountScope, PageRequest};
use crate::{MAX_ITEM_QUANTITY, MAX_MONEY_CENTS, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_CODE_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product, discount or expense name (1-200 characters).
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_name;
///
/// assert!(validate_name("name", "Kopi Susu").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_text(field, name, MAX_NAME_LEN)
}

/// Validates an optional free-text description.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        }),
        _ => Ok(()),
    }
}

/// Validates a discount code.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_code(code: &str) -> ValidationResult<()> {
    validate_text("code", code, MAX_CODE_LEN)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: 1 ..= MAX_ITEM_QUANTITY.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the number of lines in one order.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }
    Ok(())
}

/// Prices and costs may be zero but never negative, and never above
/// [`MAX_MONEY_CENTS`].
pub fn validate_money_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if !(0..=MAX_MONEY_CENTS).contains(&amount.cents()) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }
    Ok(())
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a bundle tier: quantity ≥ 1, price ≥ 0.
pub fn validate_bundle(bundle: &BundleTier) -> ValidationResult<()> {
    if bundle.quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "bundle_quantity".to_string(),
        });
    }
    validate_money_non_negative("bundle_price", bundle.price)
}

/// Validates an expense amount (strictly positive).
pub fn validate_expense_amount(amount: Money) -> ValidationResult<()> {
    if amount.cents() <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    if amount.cents() > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_MONEY_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Discount Validators
// =============================================================================

/// Converts a percentage number (0-100, two decimals) to basis points.
pub fn validate_percentage(percent: f64) -> ValidationResult<Percentage> {
    Percentage::from_percent(percent).ok_or_else(|| ValidationError::OutOfRange {
        field: "percentage".to_string(),
        min: 0,
        max: 100,
    })
}

/// Checks that scope and product target agree.
///
/// `single_product` needs a product id; `whole_order` must not carry one.
/// Whether the product exists is checked against the database by the caller.
pub fn validate_discount_target(
    scope: DiscountScope,
    product_id: Option<&str>,
) -> ValidationResult<()> {
    match (scope, product_id) {
        (DiscountScope::SingleProduct, None) => Err(ValidationError::Required {
            field: "product_id".to_string(),
        }),
        (DiscountScope::SingleProduct, Some(id)) => validate_uuid("product_id", id),
        (DiscountScope::WholeOrder, Some(_)) => Err(ValidationError::NotAllowed {
            field: "product_id".to_string(),
            reason: "for whole_order discounts".to_string(),
        }),
        (DiscountScope::WholeOrder, None) => Ok(()),
    }
}

// =============================================================================
// Dates and Paging
// =============================================================================

/// One parsed bound and whether it was a bare calendar date.
struct Bound {
    at: DateTime<Utc>,
    calendar_date: bool,
}

/// Parses one bound: `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// A bare date used as an end bound is inclusive, so it becomes midnight of
/// the following day.
fn parse_bound(field: &str, raw: &str, is_end: bool) -> ValidationResult<Bound> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let date = if is_end { date + Duration::days(1) } else { date };
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Bound {
                at: dt.and_utc(),
                calendar_date: true,
            })
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "date out of range".to_string(),
            });
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Bound {
            at: dt.with_timezone(&Utc),
            calendar_date: false,
        })
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        })
}

/// Builds a [`DateRange`] from optional inclusive bounds.
///
/// A calendar-date end turns into an exclusive next-midnight bound; a
/// timestamp end stays inclusive. Equal bounds are accepted.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_date_range;
///
/// let range = validate_date_range(Some("2024-01-01"), Some("2024-01-31")).unwrap();
/// assert_eq!(range.end.unwrap().to_rfc3339(), "2024-02-01T00:00:00+00:00");
/// assert!(!range.end_inclusive);
///
/// assert!(validate_date_range(Some("2024-02-01"), Some("2024-01-01")).is_err());
/// ```
pub fn validate_date_range(start: Option<&str>, end: Option<&str>) -> ValidationResult<DateRange> {
    let start = start
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_bound("start_date", s, false))
        .transpose()?
        .map(|bound| bound.at);
    let end = end
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_bound("end_date", s, true))
        .transpose()?;

    let end_inclusive = end.as_ref().is_some_and(|bound| !bound.calendar_date);
    let end = end.map(|bound| bound.at);

    if let (Some(s), Some(e)) = (start, end) {
        let backwards = if end_inclusive { s > e } else { s >= e };
        if backwards {
            return Err(ValidationError::InvalidDateRange);
        }
    }

    Ok(DateRange {
        start,
        end,
        end_inclusive,
    })
}

/// Resolves paging parameters against the configured default and ceiling.
pub fn validate_page(
    offset: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
    max_limit: i64,
) -> ValidationResult<PageRequest> {
    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(ValidationError::OutOfRange {
            field: "offset".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    let limit = limit.unwrap_or(default_limit);
    if !(1..=max_limit).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: max_limit,
        });
    }

    Ok(PageRequest { offset, limit })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_names() {
        assert!(validate_name("name", "Es Teh").is_ok());
        assert!(matches!(
            validate_name("name", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", &"x".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_codes() {
        assert!(validate_code("PROMO_10").is_ok());
        assert!(validate_code("promo 10").is_err());
        assert!(validate_code("").is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_bundle_rules() {
        let ok = BundleTier {
            quantity: 10,
            price: Money::from_units(90_000),
        };
        assert!(validate_bundle(&ok).is_ok());

        let zero_qty = BundleTier {
            quantity: 0,
            price: Money::from_units(1),
        };
        assert!(validate_bundle(&zero_qty).is_err());

        let negative = BundleTier {
            quantity: 2,
            price: Money::from_cents(-1),
        };
        assert!(validate_bundle(&negative).is_err());
    }

    #[test]
    fn test_money_ceiling() {
        let at_ceiling = Money::from_cents(MAX_MONEY_CENTS);
        let above = Money::from_cents(MAX_MONEY_CENTS + 1);

        assert!(validate_money_non_negative("price_cents", Money::zero()).is_ok());
        assert!(validate_money_non_negative("price_cents", at_ceiling).is_ok());
        assert!(matches!(
            validate_money_non_negative("price_cents", above),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_expense_amount(at_ceiling).is_ok());
        assert!(validate_expense_amount(above).is_err());

        // Worst case order at the ceiling still sums inside i64.
        let line = at_ceiling.checked_mul(MAX_ITEM_QUANTITY).unwrap();
        assert!(line.checked_mul(MAX_ORDER_LINES as i64).is_some());
    }

    #[test]
    fn test_discount_target() {
        let id = "6f1c2a7e-3b8d-4e4f-9a51-0c2d3e4f5a6b";
        assert!(validate_discount_target(DiscountScope::SingleProduct, Some(id)).is_ok());
        assert!(validate_discount_target(DiscountScope::SingleProduct, None).is_err());
        assert!(validate_discount_target(DiscountScope::WholeOrder, Some(id)).is_err());
        assert!(validate_discount_target(DiscountScope::WholeOrder, None).is_ok());
    }

    #[test]
    fn test_percentage() {
        assert_eq!(validate_percentage(12.5).unwrap().bps(), 1250);
        assert!(validate_percentage(100.5).is_err());
        assert!(validate_percentage(-1.0).is_err());
    }

    #[test]
    fn test_date_range_inclusive_end() {
        let range = validate_date_range(Some("2024-03-01"), Some("2024-03-01")).unwrap();
        let start = range.start.unwrap();
        let end = range.end.unwrap();
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_date_range_rfc3339_and_open_bounds() {
        let range = validate_date_range(Some("2024-03-01T10:00:00+07:00"), None).unwrap();
        assert_eq!(range.start.unwrap().to_rfc3339(), "2024-03-01T03:00:00+00:00");
        assert!(range.end.is_none());

        assert_eq!(validate_date_range(None, None).unwrap(), DateRange::default());
    }

    #[test]
    fn test_date_range_timestamp_end_is_inclusive() {
        let at = "2024-03-02T09:00:00Z";
        let range = validate_date_range(Some(at), Some(at)).unwrap();
        assert!(range.end_inclusive);
        assert_eq!(range.start, range.end);

        let stamp = DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc);
        assert!(range.contains(stamp));
        assert!(!range.contains(stamp + Duration::seconds(1)));
        assert!(!range.contains(stamp - Duration::seconds(1)));

        let open_start = validate_date_range(None, Some(at)).unwrap();
        assert!(open_start.contains(stamp));
    }

    #[test]
    fn test_date_range_calendar_end_is_exclusive_midnight() {
        let range = validate_date_range(None, Some("2024-03-01")).unwrap();
        assert!(!range.end_inclusive);
        let midnight = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert!(range.contains(midnight - Duration::seconds(1)));
        assert!(!range.contains(midnight));
    }

    #[test]
    fn test_date_range_errors() {
        assert!(matches!(
            validate_date_range(Some("2024-03-02T09:00:01Z"), Some("2024-03-02T09:00:00Z")),
            Err(ValidationError::InvalidDateRange)
        ));
        assert!(matches!(
            validate_date_range(Some("2024-03-02"), Some("2024-03-01")),
            Err(ValidationError::InvalidDateRange)
        ));
        assert!(matches!(
            validate_date_range(Some("yesterday"), None),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_paging() {
        assert_eq!(
            validate_page(None, None, 20, 100).unwrap(),
            PageRequest { offset: 0, limit: 20 }
        );
        assert!(validate_page(Some(-1), None, 20, 100).is_err());
        assert!(validate_page(None, Some(0), 20, 100).is_err());
        assert!(validate_page(None, Some(101), 20, 100).is_err());
    }
}
