//! # tally-db: Database Layer for Tally POS
//!
//! SQLite persistence for the Tally POS backend, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  apps/api handler / transaction_service                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Product        │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Discount       │    │ 001_initial_ │  │   │
//! │  │   │ WAL, FKs on   │    │ Transaction ─┐ │    │   schema.sql │  │   │
//! │  │   │ acquire t/o   │    │ StockLedger ◄┘ │    │              │  │   │
//! │  │   │               │    │ Expense, ...   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH) or `:memory:` in tests                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-aggregate query code, all scoped by organization
//!
//! ## Usage
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/tally.db")).await?;
//! let discount = db.discounts().find_by_code(&org_id, "HEMAT10").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::analytics::AnalyticsRepository;
pub use repository::discount::DiscountRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::organization::OrganizationRepository;
pub use repository::product::ProductRepository;
pub use repository::session::{Session, SessionRepository};
pub use repository::stock::StockLedger;
pub use repository::transaction::TransactionRepository;
