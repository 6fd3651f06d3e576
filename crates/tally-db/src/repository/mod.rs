//! # Repositories
//!
//! One repository per aggregate. Each holds a clone of the pool and scopes
//! every query to an organization id.
//!
//! ```text
//! Database ──┬── products()       ProductRepository
//!            ├── discounts()      DiscountRepository
//!            ├── transactions()   TransactionRepository ──► StockLedger
//!            ├── expenses()       ExpenseRepository
//!            ├── organizations()  OrganizationRepository
//!            ├── sessions()       SessionRepository
//!            └── analytics()      AnalyticsRepository
//! ```

pub mod analytics;
pub mod discount;
pub mod expense;
pub mod organization;
pub mod product;
pub mod session;
pub mod stock;
pub mod transaction;

use sqlx::{QueryBuilder, Sqlite};
use tally_core::DateRange;

/// Appends ` AND <column> >= ?` and ` AND <column> < ?` (`<=` for an
/// inclusive end) for the bounds that are set.
pub(crate) fn push_date_range(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    range: &DateRange,
) {
    if let Some(start) = range.start {
        qb.push(format!(" AND {} >= ", column));
        qb.push_bind(start);
    }
    if let Some(end) = range.end {
        let op = if range.end_inclusive { "<=" } else { "<" };
        qb.push(format!(" AND {} {} ", column, op));
        qb.push_bind(end);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use tally_core::{BundleTier, Money, Product};
    use uuid::Uuid;

    use crate::{Database, DbConfig};

    /// Fresh in-memory database with one organization.
    pub async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let org = db
            .organizations()
            .create("Warung Test", "warung-test")
            .await
            .unwrap();
        (db, org.id)
    }

    pub fn product(org_id: &str, name: &str, price: i64, cost: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            organization_id: org_id.to_string(),
            name: name.to_string(),
            description: None,
            price: Money::from_units(price),
            cost: Money::from_units(cost),
            stock,
            bundle: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bundled(mut product: Product, quantity: i64, price: i64) -> Product {
        product.bundle = Some(BundleTier {
            quantity,
            price: Money::from_units(price),
        });
        product
    }
}
