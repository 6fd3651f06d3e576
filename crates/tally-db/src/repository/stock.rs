//! # Stock Ledger
//!
//! Guarded in-place stock decrements, run on the connection of an open SQL
//! transaction.
//!
//! ## Delta Update With a Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ read stock, subtract in Rust, write absolute value               │
//! │     two concurrent sales both read 5, both write 5 - 3 = 2          │
//! │                                                                     │
//! │  ✅ UPDATE products SET stock = stock - 3                           │
//! │     WHERE id = ? AND organization_id = ? AND stock >= 3             │
//! │                                                                     │
//! │  SQLite serializes writers, so the guard sees committed stock.      │
//! │  0 rows affected ⇒ someone got there first ⇒ InsufficientStock      │
//! │  and the caller drops (rolls back) the transaction.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use tally_core::StockRequest;

/// Stock decrements inside a commit unit.
pub struct StockLedger;

impl StockLedger {
    /// Takes `requests` out of stock, all or nothing.
    ///
    /// Must be called with the connection of an open transaction; on error the
    /// caller is expected to let that transaction roll back.
    pub async fn deduct(
        conn: &mut SqliteConnection,
        organization_id: &str,
        requests: &[StockRequest],
    ) -> DbResult<()> {
        let now = Utc::now();

        for request in requests {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - ?1, updated_at = ?2 \
                 WHERE id = ?3 AND organization_id = ?4 AND is_active = 1 AND stock >= ?1",
            )
            .bind(request.quantity)
            .bind(now)
            .bind(&request.product_id)
            .bind(organization_id)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(Self::shortfall(conn, organization_id, request).await);
            }

            debug!(
                product_id = %request.product_id,
                quantity = request.quantity,
                "Stock deducted"
            );
        }

        Ok(())
    }

    /// Builds the error for a decrement that matched no row.
    async fn shortfall(
        conn: &mut SqliteConnection,
        organization_id: &str,
        request: &StockRequest,
    ) -> DbError {
        let current: Result<Option<(String, i64)>, sqlx::Error> = sqlx::query_as(
            "SELECT name, stock FROM products \
             WHERE id = ?1 AND organization_id = ?2 AND is_active = 1",
        )
        .bind(&request.product_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await;

        match current {
            Ok(Some((name, stock))) => {
                warn!(
                    product = %name,
                    available = stock,
                    requested = request.quantity,
                    "Stock guard rejected decrement"
                );
                DbError::InsufficientStock {
                    product: name,
                    available: stock,
                    requested: request.quantity,
                }
            }
            Ok(None) => DbError::not_found("Product", &request.product_id),
            Err(e) => e.into(),
        }
    }
}
