//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │    Discount     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price / cost   │   │  total_amount   │   │  code (unique)  │       │
//! │  │  stock          │   │  profit         │   │  scope          │       │
//! │  │  bundle?        │   │  discount_code? │   │  percentage     │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ 1..n                                  │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │   BundleTier    │   │ TransactionItem │   │    Expense      │       │
//! │  │  N for a price  │   │  line_total     │   │  amount         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Every row carries an organization_id (items inherit it through their  │
//! │  transaction) and every query filters by the caller's organization.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::{Money, Percentage};

// =============================================================================
// Product
// =============================================================================

/// "N units for a flat price" tier attached to a product.
///
/// Applied greedily: as many whole bundles as fit, the remainder at unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleTier {
    /// Units per bundle (> 0).
    pub quantity: i64,
    /// Flat price of one bundle.
    pub price: Money,
}

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Organization this product belongs to.
    pub organization_id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Unit selling price.
    pub price: Money,

    /// Unit cost (cost of goods sold).
    pub cost: Money,

    /// Units on hand, never negative.
    pub stock: i64,

    /// Optional bundle pricing.
    pub bundle: Option<BundleTier>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Fails with `InsufficientStock` when fewer than `quantity` units are on hand.
    pub fn ensure_stock(&self, quantity: i64) -> Result<(), CoreError> {
        if self.stock >= quantity {
            return Ok(());
        }

        Err(CoreError::InsufficientStock {
            product: self.name.clone(),
            available: self.stock,
            requested: quantity,
        })
    }
}

// =============================================================================
// Discount
// =============================================================================

/// What a discount applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    /// Only line totals of one designated product.
    SingleProduct,
    /// Once, on the summed line totals of the whole order.
    WholeOrder,
}

impl DiscountScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountScope::SingleProduct => "single_product",
            DiscountScope::WholeOrder => "whole_order",
        }
    }
}

/// A percentage discount redeemable by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub id: String,
    pub organization_id: String,
    /// Human name ("Weekend promo").
    pub name: String,
    /// Code typed at the till, unique per organization.
    pub code: String,
    pub scope: DiscountScope,
    pub percentage: Percentage,
    /// Target product; set iff `scope` is `SingleProduct`.
    pub product_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Whether this discount reduces line totals of `product_id`.
    pub fn targets_product(&self, product_id: &str) -> bool {
        self.scope == DiscountScope::SingleProduct
            && self.product_id.as_deref() == Some(product_id)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    BankTransfer,
    /// Wallet or QR payment.
    EWallet,
    Other,
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed sale. Created once with its items, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub organization_id: String,
    /// Sum of line totals after any whole-order discount.
    pub total_amount: Money,
    /// `total_amount` minus cost of goods, rounded to whole units.
    pub profit: Money,
    /// Code used at checkout, kept as text (not a foreign key).
    pub discount_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    /// Charge for the whole line (bundle and discount applied), not a unit price.
    pub line_total: Money,
}

/// A transaction item joined with the product's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionItemView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub line_total: Money,
}

/// Read model returned by transaction endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionView {
    pub id: String,
    pub total_amount: Money,
    pub profit: Money,
    pub discount_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransactionItemView>,
}

impl TransactionView {
    pub fn new(transaction: Transaction, items: Vec<TransactionItemView>) -> Self {
        TransactionView {
            id: transaction.id,
            total_amount: transaction.total_amount,
            profit: transaction.profit,
            discount_code: transaction.discount_code,
            payment_method: transaction.payment_method,
            created_at: transaction.created_at,
            items,
        }
    }
}

// =============================================================================
// Expense
// =============================================================================

/// Money spent by the organization (rent, restock, wages...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub organization_id: String,
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    #[ts(as = "String")]
    pub incurred_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Organization
// =============================================================================

/// Tenant boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Queries
// =============================================================================

/// Time window `[start, end)`, or `[start, end]` when `end_inclusive` is set.
/// Either bound may be open.
///
/// Built by [`crate::validation::validate_date_range`]: a calendar-date end
/// becomes the following midnight (exclusive), a timestamp end is kept as
/// given (inclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub end_inclusive: bool,
}

impl DateRange {
    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let after_start = self.start.map_or(true, |start| at >= start);
        let before_end = match self.end {
            Some(end) if self.end_inclusive => at <= end,
            Some(end) => at < end,
            None => true,
        };
        after_start && before_end
    }
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        Page {
            data,
            total,
            offset: request.offset,
            limit: request.limit,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

// =============================================================================
// Analytics
// =============================================================================

/// Best seller line of the analytics summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Aggregates over transactions and expenses in a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub transaction_count: i64,
    pub items_sold: i64,
    pub revenue: Money,
    pub profit: Money,
    pub expenses: Money,
    pub net_income: Money,
    pub top_products: Vec<TopProduct>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "Kopi Susu".to_string(),
            description: None,
            price: Money::from_units(18_000),
            cost: Money::from_units(9_000),
            stock,
            bundle: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_stock() {
        assert!(product(5).ensure_stock(5).is_ok());

        let err = product(2).ensure_stock(3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));
    }

    #[test]
    fn test_discount_targets_product() {
        let mut discount = Discount {
            id: "d-1".to_string(),
            organization_id: "org-1".to_string(),
            name: "Promo".to_string(),
            code: "KOPI10".to_string(),
            scope: DiscountScope::SingleProduct,
            percentage: Percentage::from_bps(1000),
            product_id: Some("p-1".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(discount.targets_product("p-1"));
        assert!(!discount.targets_product("p-2"));

        discount.scope = DiscountScope::WholeOrder;
        discount.product_id = None;
        assert!(!discount.targets_product("p-1"));
    }

    #[test]
    fn test_scope_wire_format() {
        let json = serde_json::to_string(&DiscountScope::WholeOrder).unwrap();
        assert_eq!(json, "\"whole_order\"");
        assert_eq!(DiscountScope::SingleProduct.as_str(), "single_product");
    }
}
