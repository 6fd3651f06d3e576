//! # Tally API
//!
//! JSON-over-HTTP server for Tally POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Services                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Transactions  │  │   Products     │  │  Discounts                 ││
//! │  │                │  │                │  │                            ││
//! │  │ • create       │  │ • CRUD         │  │ • CRUD                     ││
//! │  │ • list / get   │  │ • soft delete  │  │ • lookup by code           ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │   Expenses     │  │   Analytics    │  │    Health      │            │
//! │  │ • CRUD         │  │ • summary      │  │ • check        │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  Every route but /health extracts an OrgContext from the bearer       │
//! │  session; all reads and writes are scoped to its organization.        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  tally-core (pricing, validation)   tally-db (SQLite, sqlx)      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ApiConfig`]):
//! - `HTTP_PORT` - listen port (default: 8080)
//! - `BIND_ADDR` - interface (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./data/tally.db)
//! - `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECS` - pool sizing
//! - `PROFIT_ROUNDING` - `half_up` (default) or `half_even`
//! - `DEFAULT_PAGE_SIZE`, `MAX_PAGE_SIZE` - list paging

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use tally_core::validation::validate_page;
use tally_core::PageRequest;
use tally_db::Database;

use crate::services::{
    analytics_service, discount_service, expense_service, health_service, product_service,
    transaction_service,
};

// Re-exports
pub use auth::{AuthError, Authorizer, OrgContext, SessionAuthorizer};
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    /// State backed by session-token authorization.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let authorizer = Arc::new(SessionAuthorizer::new(db.clone()));
        AppState {
            db,
            config: Arc::new(config),
            authorizer,
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Resolves client paging parameters against the configured limits.
    pub fn page(&self, offset: Option<i64>, limit: Option<i64>) -> ApiResult<PageRequest> {
        Ok(validate_page(
            offset,
            limit,
            self.config.default_page_size,
            self.config.max_page_size,
        )?)
    }
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_service::check))
        .route(
            "/transactions",
            get(transaction_service::list).post(transaction_service::create),
        )
        .route("/transactions/{id}", get(transaction_service::get))
        .route(
            "/products",
            get(product_service::list).post(product_service::create),
        )
        .route(
            "/products/{id}",
            get(product_service::get)
                .put(product_service::update)
                .delete(product_service::delete),
        )
        .route(
            "/discounts",
            get(discount_service::list).post(discount_service::create),
        )
        .route("/discounts/code/{code}", get(discount_service::get_by_code))
        .route(
            "/discounts/{id}",
            get(discount_service::get)
                .put(discount_service::update)
                .delete(discount_service::delete),
        )
        .route(
            "/expenses",
            get(expense_service::list).post(expense_service::create),
        )
        .route(
            "/expenses/{id}",
            get(expense_service::get)
                .put(expense_service::update)
                .delete(expense_service::delete),
        )
        .route("/analytics/summary", get(analytics_service::summary))
        .with_state(state)
}
