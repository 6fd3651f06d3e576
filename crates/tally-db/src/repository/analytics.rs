//! # Analytics Repository
//!
//! Sales summary over a date range, aggregated in SQL.
//!
//! ```text
//! transactions ──► COUNT, SUM(total), SUM(profit)
//! items ⨝ tx   ──► SUM(quantity), top 5 products by quantity
//! expenses     ──► SUM(amount)        (range applies to incurred_at)
//!                         │
//!                         ▼
//!            net_income = profit − expenses
//! ```

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::push_date_range;
use crate::error::DbResult;
use tally_core::{DateRange, Money, SalesSummary, TopProduct};

const TOP_PRODUCTS: i64 = 5;

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    transaction_count: i64,
    revenue_cents: i64,
    profit_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    product_id: String,
    name: String,
    quantity: i64,
    revenue_cents: i64,
}

#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsRepository { pool }
    }

    pub async fn summary(
        &self,
        organization_id: &str,
        range: &DateRange,
    ) -> DbResult<SalesSummary> {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) AS transaction_count, \
                    COALESCE(SUM(total_amount_cents), 0) AS revenue_cents, \
                    COALESCE(SUM(profit_cents), 0) AS profit_cents \
             FROM transactions t WHERE t.organization_id = ",
        );
        qb.push_bind(organization_id);
        push_date_range(&mut qb, "t.created_at", range);
        let totals = qb.build_query_as::<TotalsRow>().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT COALESCE(SUM(i.quantity), 0) FROM transaction_items i \
             JOIN transactions t ON t.id = i.transaction_id \
             WHERE t.organization_id = ",
        );
        qb.push_bind(organization_id);
        push_date_range(&mut qb, "t.created_at", range);
        let items_sold: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE organization_id = ",
        );
        qb.push_bind(organization_id);
        push_date_range(&mut qb, "incurred_at", range);
        let expenses_cents: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT i.product_id, p.name, SUM(i.quantity) AS quantity, \
                    SUM(i.line_total_cents) AS revenue_cents \
             FROM transaction_items i \
             JOIN transactions t ON t.id = i.transaction_id \
             JOIN products p ON p.id = i.product_id \
             WHERE t.organization_id = ",
        );
        qb.push_bind(organization_id);
        push_date_range(&mut qb, "t.created_at", range);
        qb.push(" GROUP BY i.product_id, p.name ORDER BY quantity DESC, revenue_cents DESC LIMIT ");
        qb.push_bind(TOP_PRODUCTS);
        let top = qb
            .build_query_as::<TopProductRow>()
            .fetch_all(&self.pool)
            .await?;

        let profit = Money::from_cents(totals.profit_cents);
        let expenses = Money::from_cents(expenses_cents);

        Ok(SalesSummary {
            transaction_count: totals.transaction_count,
            items_sold,
            revenue: Money::from_cents(totals.revenue_cents),
            profit,
            expenses,
            net_income: profit - expenses,
            top_products: top
                .into_iter()
                .map(|row| TopProduct {
                    product_id: row.product_id,
                    name: row.name,
                    quantity: row.quantity,
                    revenue: Money::from_cents(row.revenue_cents),
                })
                .collect(),
        })
    }
}
