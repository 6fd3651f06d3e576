//! # tally-core: Pure Business Logic for Tally POS
//!
//! Everything that decides *what* a sale costs lives here, as pure functions
//! with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   auth ──► handlers ──► transaction_service (orchestrator)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────┐ │   │
//! │  │   │  types  │  │  money  │  │ pricing │  │  stock  │  │valid.│ │   │
//! │  │   │ Product │  │  Money  │  │ bundles │  │ pre-    │  │rules │ │   │
//! │  │   │Discount │  │ Percent │  │ settle  │  │ check   │  │dates │ │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘  └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, repositories, stock ledger   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Discount, Transaction, Expense, ...)
//! - [`money`] - Integer-cent `Money`, basis-point `Percentage`, rounding rules
//! - [`pricing`] - Line pricing (bundles, discounts) and order settlement
//! - [`stock`] - Stock availability pre-check
//! - [`error`] - Domain error types
//! - [`validation`] - Boundary validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::{Money, Percentage};
//! use tally_core::pricing::{price_line_item, LineDiscount};
//! use tally_core::types::{BundleTier, DiscountScope};
//!
//! let tier = BundleTier { quantity: 10, price: Money::from_units(90_000) };
//! let ten_off = LineDiscount {
//!     scope: DiscountScope::SingleProduct,
//!     percentage: Percentage::from_bps(1000),
//!     applies_to_this_product: true,
//! };
//!
//! let unit = Money::from_units(10_000);
//! let total = price_line_item(unit, 15, Some(&tier), Some(&ten_off)).unwrap();
//! assert_eq!(total, Money::from_units(126_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percentage, RoundingRule};
pub use pricing::{
    price_line_item, settle_order, LineDiscount, OrderLine, PricedLine, Settlement,
};
pub use stock::StockRequest;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in a single transaction.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// Guards against typos like 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest price, cost or expense amount accepted, in cents.
///
/// At this ceiling a full order (`MAX_ORDER_LINES` lines of
/// `MAX_ITEM_QUANTITY` units) still sums inside i64.
pub const MAX_MONEY_CENTS: i64 = 1_000_000_000_000;
