//! # Transaction Repository
//!
//! Persistence for completed sales.
//!
//! ## Commit Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT transactions (total, profit, discount_code, payment_method)  │
//! │    StockLedger::deduct   ── guard fails ──► drop tx ⇒ ROLLBACK          │
//! │    INSERT transaction_items × n (line totals)                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All reads the caller needs (products, discount) happen before `BEGIN`, so
//! the write lock is held only for the statements above.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::push_date_range;
use super::stock::StockLedger;
use crate::error::DbResult;
use tally_core::{
    DateRange, Money, Page, PageRequest, PaymentMethod, StockRequest, Transaction,
    TransactionItem, TransactionItemView, TransactionView,
};

const TRANSACTION_COLUMNS: &str =
    "t.id, t.organization_id, t.total_amount_cents, t.profit_cents, t.discount_code, \
     t.payment_method, t.created_at";

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    organization_id: String,
    total_amount_cents: i64,
    profit_cents: i64,
    discount_code: Option<String>,
    payment_method: Option<PaymentMethod>,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            organization_id: row.organization_id,
            total_amount: Money::from_cents(row.total_amount_cents),
            profit: Money::from_cents(row.profit_cents),
            discount_code: row.discount_code,
            payment_method: row.payment_method,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemViewRow {
    id: String,
    transaction_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    line_total_cents: i64,
}

impl From<ItemViewRow> for TransactionItemView {
    fn from(row: ItemViewRow) -> Self {
        TransactionItemView {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            line_total: Money::from_cents(row.line_total_cents),
        }
    }
}

/// Header columns plus one item, as returned by the single-transaction join.
#[derive(Debug, sqlx::FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    header: TransactionRow,
    item_id: Option<String>,
    product_id: Option<String>,
    product_name: Option<String>,
    quantity: Option<i64>,
    line_total_cents: Option<i64>,
}

impl JoinedRow {
    fn into_parts(self) -> (TransactionRow, Option<TransactionItemView>) {
        let item = match (
            self.item_id,
            self.product_id,
            self.quantity,
            self.line_total_cents,
        ) {
            (Some(id), Some(product_id), Some(quantity), Some(line_total)) => {
                Some(TransactionItemView {
                    id,
                    product_id,
                    product_name: self.product_name.unwrap_or_default(),
                    quantity,
                    line_total: Money::from_cents(line_total),
                })
            }
            _ => None,
        };
        (self.header, item)
    }
}

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Writes a sale atomically: header, stock decrements, items.
    ///
    /// ## Returns
    /// * `Err(DbError::InsufficientStock)` - A concurrent sale took the stock
    ///   after the caller's pre-check; nothing was written
    pub async fn commit_sale(
        &self,
        transaction: &Transaction,
        items: &[TransactionItem],
        stock: &[StockRequest],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO transactions (
                id, organization_id, total_amount_cents, profit_cents,
                discount_code, payment_method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&transaction.id)
        .bind(&transaction.organization_id)
        .bind(transaction.total_amount.cents())
        .bind(transaction.profit.cents())
        .bind(&transaction.discount_code)
        .bind(transaction.payment_method)
        .bind(transaction.created_at)
        .execute(&mut *tx)
        .await?;

        StockLedger::deduct(&mut *tx, &transaction.organization_id, stock).await?;

        for item in items {
            sqlx::query(
                "INSERT INTO transaction_items (
                    id, transaction_id, product_id, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&item.id)
            .bind(&transaction.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            transaction_id = %transaction.id,
            items = items.len(),
            total_cents = transaction.total_amount.cents(),
            "Transaction committed"
        );
        Ok(())
    }

    /// Loads a transaction with its items and product names in one query.
    pub async fn get_view(
        &self,
        organization_id: &str,
        id: &str,
    ) -> DbResult<Option<TransactionView>> {
        let rows = sqlx::query_as::<_, JoinedRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS}, \
                    i.id AS item_id, i.product_id, p.name AS product_name, \
                    i.quantity, i.line_total_cents \
             FROM transactions t \
             LEFT JOIN transaction_items i ON i.transaction_id = t.id \
             LEFT JOIN products p ON p.id = i.product_id \
             WHERE t.id = ?1 AND t.organization_id = ?2 \
             ORDER BY i.rowid"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let mut header = None;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let (h, item) = row.into_parts();
            header.get_or_insert(h);
            items.extend(item);
        }

        Ok(header.map(|h| TransactionView::new(h.into(), items)))
    }

    /// Lists transactions newest first, with items for the whole page loaded
    /// in a single query.
    pub async fn list(
        &self,
        organization_id: &str,
        range: &DateRange,
        page: PageRequest,
    ) -> DbResult<Page<TransactionView>> {
        let mut count_qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM transactions t WHERE t.organization_id = ");
        count_qb.push_bind(organization_id);
        push_date_range(&mut count_qb, "t.created_at", range);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.organization_id = "
        ));
        qb.push_bind(organization_id);
        push_date_range(&mut qb, "t.created_at", range);
        qb.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset);

        let headers = qb
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<String> = headers.iter().map(|h| h.id.clone()).collect();
        let mut items = self.items_for_transactions(&ids).await?;

        let data = headers
            .into_iter()
            .map(|header| {
                let lines = items.remove(&header.id).unwrap_or_default();
                TransactionView::new(header.into(), lines)
            })
            .collect();

        debug!(total, returned = ids.len(), "Listed transactions");
        Ok(Page::new(data, total, page))
    }

    /// Items of several transactions, grouped by transaction id.
    pub async fn items_for_transactions(
        &self,
        transaction_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<TransactionItemView>>> {
        let mut grouped: HashMap<String, Vec<TransactionItemView>> = HashMap::new();
        if transaction_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT i.id, i.transaction_id, i.product_id, p.name AS product_name, \
                    i.quantity, i.line_total_cents \
             FROM transaction_items i \
             JOIN products p ON p.id = i.product_id \
             WHERE i.transaction_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in transaction_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY i.rowid");

        let rows = qb
            .build_query_as::<ItemViewRow>()
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            grouped
                .entry(row.transaction_id.clone())
                .or_default()
                .push(row.into());
        }

        Ok(grouped)
    }
}
