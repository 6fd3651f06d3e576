//! # Pricing
//!
//! The pricing calculator and order settlement.
//!
//! ## Line Pricing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_line_item(unit 10,000, qty 15, bundle 10 for 90,000)            │
//! │                                                                         │
//! │  qty ≥ bundle qty?  ── no ──► qty × unit                               │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  bundles = 15 / 10 = 1, remainder = 15 % 10 = 5                        │
//! │  subtotal = 1 × 90,000 + 5 × 10,000 = 140,000                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  single-product discount for this product? ── yes ──► subtotal − d%    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  line total (never a unit price)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Settlement
//! Lines are priced one by one, their totals summed, a whole-order discount is
//! taken once off that sum, and profit is the result minus cost of goods,
//! rounded to whole currency units.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percentage, RoundingRule};
use crate::stock::{check_availability, StockRequest};
use crate::types::{BundleTier, Discount, DiscountScope, Product};

// =============================================================================
// Line Pricing
// =============================================================================

/// A discount as seen by one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDiscount {
    pub scope: DiscountScope,
    pub percentage: Percentage,
    /// True when the discount designates the product on this line.
    pub applies_to_this_product: bool,
}

impl LineDiscount {
    /// Projects `discount` onto the line selling `product_id`.
    pub fn for_product(discount: &Discount, product_id: &str) -> Self {
        LineDiscount {
            scope: discount.scope,
            percentage: discount.percentage,
            applies_to_this_product: discount.targets_product(product_id),
        }
    }
}

/// Computes the charge for one line.
///
/// A bundle tier only kicks in once `quantity` reaches the tier's quantity;
/// below that it is ignored entirely. Only a single-product discount aimed at
/// this product changes the result; whole-order discounts are settled later.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::price_line_item;
/// use tally_core::types::BundleTier;
///
/// let unit = Money::from_units(10_000);
/// let tier = BundleTier { quantity: 10, price: Money::from_units(90_000) };
///
/// let total = price_line_item(unit, 15, Some(&tier), None).unwrap();
/// assert_eq!(total, Money::from_units(140_000));
/// let total = price_line_item(unit, 7, Some(&tier), None).unwrap();
/// assert_eq!(total, Money::from_units(70_000));
/// ```
///
/// ## Errors
/// `AmountOverflow` when the line total does not fit in i64 cents.
pub fn price_line_item(
    unit_price: Money,
    quantity: i64,
    bundle: Option<&BundleTier>,
    discount: Option<&LineDiscount>,
) -> CoreResult<Money> {
    let applicable = bundle.filter(|tier| tier.quantity > 0 && quantity >= tier.quantity);
    let subtotal = match applicable {
        Some(tier) => {
            let bundles = quantity / tier.quantity;
            let remainder = quantity % tier.quantity;
            tier.price
                .checked_mul(bundles)
                .zip(unit_price.checked_mul(remainder))
                .and_then(|(bundled, loose)| bundled.checked_add(loose))
        }
        None => unit_price.checked_mul(quantity),
    }
    .ok_or(CoreError::AmountOverflow)?;

    Ok(match discount {
        Some(d) if d.scope == DiscountScope::SingleProduct && d.applies_to_this_product => {
            subtotal.apply_percentage_discount(d.percentage)
        }
        _ => subtotal,
    })
}

// =============================================================================
// Order Settlement
// =============================================================================

/// A product and the quantity ordered of it.
#[derive(Debug, Clone, Copy)]
pub struct OrderLine<'a> {
    pub product: &'a Product,
    pub quantity: i64,
}

/// A priced line, ready to be stored as a transaction item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub line_total: Money,
    /// Unit cost × quantity.
    pub cost: Money,
}

/// Outcome of pricing a whole order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub lines: Vec<PricedLine>,
    /// Quantities to take out of stock, one entry per product.
    pub stock: Vec<StockRequest>,
    /// Sum of line totals (single-product discounts already netted in).
    pub subtotal: Money,
    /// Amount taken off by a whole-order discount.
    pub order_discount: Money,
    pub total_amount: Money,
    pub total_cost: Money,
    pub profit: Money,
}

/// Prices an order and works out its total and profit.
///
/// Fails with `EmptyOrder` for no lines, `InsufficientStock` when the
/// loaded stock cannot cover the order and `AmountOverflow` when a sum
/// leaves the i64 range. Pure: nothing is written here.
pub fn settle_order(
    lines: &[OrderLine<'_>],
    discount: Option<&Discount>,
    rounding: RoundingRule,
) -> CoreResult<Settlement> {
    if lines.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    let stock = check_availability(lines)?;

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();
    let mut total_cost = Money::zero();

    for line in lines {
        let product = line.product;
        let line_discount = discount.map(|d| LineDiscount::for_product(d, &product.id));
        let line_total = price_line_item(
            product.price,
            line.quantity,
            product.bundle.as_ref(),
            line_discount.as_ref(),
        )?;
        let cost = product
            .cost
            .checked_mul(line.quantity)
            .ok_or(CoreError::AmountOverflow)?;

        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow)?;
        total_cost = total_cost
            .checked_add(cost)
            .ok_or(CoreError::AmountOverflow)?;
        priced.push(PricedLine {
            product_id: product.id.clone(),
            quantity: line.quantity,
            line_total,
            cost,
        });
    }

    let order_discount = match discount {
        Some(d) if d.scope == DiscountScope::WholeOrder => subtotal.percentage_of(d.percentage),
        _ => Money::zero(),
    };
    let total_amount = subtotal - order_discount;
    let profit = total_amount
        .checked_sub(total_cost)
        .ok_or(CoreError::AmountOverflow)?
        .round_to_units(rounding);

    Ok(Settlement {
        lines: priced,
        stock,
        subtotal,
        order_discount,
        total_amount,
        total_cost,
        profit,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unit() -> Money {
        Money::from_units(10_000)
    }

    fn tier() -> BundleTier {
        BundleTier {
            quantity: 10,
            price: Money::from_units(90_000),
        }
    }

    fn product(
        id: &str,
        price: i64,
        cost: i64,
        stock: i64,
        bundle: Option<BundleTier>,
    ) -> Product {
        Product {
            id: id.to_string(),
            organization_id: "org".to_string(),
            name: id.to_uppercase(),
            description: None,
            price: Money::from_units(price),
            cost: Money::from_units(cost),
            stock,
            bundle,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn discount(scope: DiscountScope, bps: u32, product_id: Option<&str>) -> Discount {
        Discount {
            id: "d".to_string(),
            organization_id: "org".to_string(),
            name: "Promo".to_string(),
            code: "PROMO".to_string(),
            scope,
            percentage: Percentage::from_bps(bps),
            product_id: product_id.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bundle_with_remainder() {
        let total = price_line_item(unit(), 15, Some(&tier()), None).unwrap();
        assert_eq!(total, Money::from_units(140_000));
    }

    #[test]
    fn test_below_bundle_threshold_ignores_tier() {
        let total = price_line_item(unit(), 7, Some(&tier()), None).unwrap();
        assert_eq!(total, Money::from_units(70_000));
    }

    #[test]
    fn test_exactly_one_bundle() {
        let total = price_line_item(unit(), 10, Some(&tier()), None).unwrap();
        assert_eq!(total, Money::from_units(90_000));
    }

    #[test]
    fn test_bundle_law_over_quantities() {
        let t = tier();
        for q in 1..=45 {
            let expected = if q >= t.quantity {
                t.price * (q / t.quantity) + unit() * (q % t.quantity)
            } else {
                unit() * q
            };
            let total = price_line_item(unit(), q, Some(&t), None).unwrap();
            assert_eq!(total, expected, "q={}", q);
        }
    }

    #[test]
    fn test_single_product_discount_on_line() {
        let d = LineDiscount {
            scope: DiscountScope::SingleProduct,
            percentage: Percentage::from_bps(1000),
            applies_to_this_product: true,
        };
        let total = price_line_item(unit(), 15, Some(&tier()), Some(&d)).unwrap();
        assert_eq!(total, Money::from_units(126_000));
    }

    #[test]
    fn test_discount_for_other_product_is_ignored() {
        let d = LineDiscount {
            scope: DiscountScope::SingleProduct,
            percentage: Percentage::from_bps(5000),
            applies_to_this_product: false,
        };
        let total = price_line_item(unit(), 2, None, Some(&d)).unwrap();
        assert_eq!(total, Money::from_units(20_000));
    }

    #[test]
    fn test_whole_order_discount_not_applied_per_line() {
        let d = LineDiscount {
            scope: DiscountScope::WholeOrder,
            percentage: Percentage::from_bps(5000),
            applies_to_this_product: false,
        };
        let total = price_line_item(unit(), 2, None, Some(&d)).unwrap();
        assert_eq!(total, Money::from_units(20_000));
    }

    #[test]
    fn test_line_overflow_is_an_error() {
        let huge = Money::from_cents(i64::MAX / 2);
        let result = price_line_item(huge, 3, None, None);
        assert!(matches!(result, Err(CoreError::AmountOverflow)));

        let tier = BundleTier {
            quantity: 2,
            price: huge,
        };
        let result = price_line_item(unit(), 6, Some(&tier), None);
        assert!(matches!(result, Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_settle_overflowing_order_is_an_error() {
        let mut a = product("a", 0, 0, 10, None);
        a.price = Money::from_cents(i64::MAX / 3);
        let mut b = product("b", 0, 0, 10, None);
        b.price = Money::from_cents(i64::MAX / 3);
        let lines = [
            OrderLine { product: &a, quantity: 2 },
            OrderLine { product: &b, quantity: 2 },
        ];
        let result = settle_order(&lines, None, RoundingRule::HalfUp);
        assert!(matches!(result, Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_settle_empty_order() {
        let result = settle_order(&[], None, RoundingRule::HalfUp);
        assert!(matches!(result, Err(CoreError::EmptyOrder)));
    }

    #[test]
    fn test_settle_without_discount() {
        let a = product("a", 10_000, 6_000, 50, Some(tier()));
        let b = product("b", 5_000, 2_000, 50, None);
        let lines = [
            OrderLine { product: &a, quantity: 15 },
            OrderLine { product: &b, quantity: 2 },
        ];

        let s = settle_order(&lines, None, RoundingRule::HalfUp).unwrap();
        assert_eq!(s.lines[0].line_total, Money::from_units(140_000));
        assert_eq!(s.lines[1].line_total, Money::from_units(10_000));
        assert_eq!(s.subtotal, Money::from_units(150_000));
        assert_eq!(s.total_amount, Money::from_units(150_000));
        assert_eq!(s.total_cost, Money::from_units(15 * 6_000 + 2 * 2_000));
        assert_eq!(s.profit, Money::from_units(150_000 - 94_000));
    }

    #[test]
    fn test_settle_single_product_discount() {
        let a = product("a", 10_000, 6_000, 50, None);
        let b = product("b", 5_000, 2_000, 50, None);
        let d = discount(DiscountScope::SingleProduct, 2000, Some("b"));
        let lines = [
            OrderLine { product: &a, quantity: 1 },
            OrderLine { product: &b, quantity: 2 },
        ];

        let s = settle_order(&lines, Some(&d), RoundingRule::HalfUp).unwrap();
        assert_eq!(s.lines[0].line_total, Money::from_units(10_000));
        assert_eq!(s.lines[1].line_total, Money::from_units(8_000));
        assert_eq!(s.order_discount, Money::zero());
        assert_eq!(s.total_amount, Money::from_units(18_000));
    }

    #[test]
    fn test_settle_whole_order_discount_applied_once() {
        let a = product("a", 10_000, 6_000, 50, None);
        let b = product("b", 5_000, 2_000, 50, None);
        let d = discount(DiscountScope::WholeOrder, 1000, None);
        let lines = [
            OrderLine { product: &a, quantity: 1 },
            OrderLine { product: &b, quantity: 2 },
        ];

        let s = settle_order(&lines, Some(&d), RoundingRule::HalfUp).unwrap();
        // Lines keep their undiscounted totals
        assert_eq!(s.lines[0].line_total, Money::from_units(10_000));
        assert_eq!(s.lines[1].line_total, Money::from_units(10_000));
        assert_eq!(s.order_discount, Money::from_units(2_000));
        assert_eq!(s.total_amount, Money::from_units(18_000));
        assert_eq!(s.profit, Money::from_units(18_000 - 10_000));
    }

    #[test]
    fn test_profit_rounding_rule() {
        // total 1.50, cost 0 -> profit ties at 1.5 units
        let mut a = product("a", 0, 0, 10, None);
        a.price = Money::from_cents(150);
        let lines = [OrderLine { product: &a, quantity: 1 }];

        let up = settle_order(&lines, None, RoundingRule::HalfUp).unwrap();
        assert_eq!(up.total_amount, Money::from_cents(150));
        assert_eq!(up.profit, Money::from_units(2));

        let even = settle_order(&lines, None, RoundingRule::HalfEven).unwrap();
        assert_eq!(even.profit, Money::from_units(2));

        a.price = Money::from_cents(250);
        let lines = [OrderLine { product: &a, quantity: 1 }];
        let even = settle_order(&lines, None, RoundingRule::HalfEven).unwrap();
        assert_eq!(even.profit, Money::from_units(2));
    }

    #[test]
    fn test_settle_rejects_short_stock() {
        let a = product("a", 10, 5, 1, None);
        let lines = [OrderLine { product: &a, quantity: 2 }];
        let result = settle_order(&lines, None, RoundingRule::HalfUp);
        assert!(matches!(result, Err(CoreError::InsufficientStock { .. })));
    }
}
