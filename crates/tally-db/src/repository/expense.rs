//! # Expense Repository
//!
//! Organization expenses, listed by `incurred_at` and summed by analytics.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::push_date_range;
use crate::error::{DbError, DbResult};
use tally_core::{DateRange, Expense, Money, Page, PageRequest};

const EXPENSE_COLUMNS: &str =
    "id, organization_id, description, amount_cents, category, incurred_at, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: String,
    organization_id: String,
    description: String,
    amount_cents: i64,
    category: Option<String>,
    incurred_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            organization_id: row.organization_id,
            description: row.description,
            amount: Money::from_cents(row.amount_cents),
            category: row.category,
            incurred_at: row.incurred_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Expense>> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1 AND organization_id = ?2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Expense::from))
    }

    /// Lists expenses newest first within `range` (on `incurred_at`).
    pub async fn list(
        &self,
        organization_id: &str,
        range: &DateRange,
        page: PageRequest,
    ) -> DbResult<Page<Expense>> {
        let mut count_qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM expenses WHERE organization_id = ");
        count_qb.push_bind(organization_id);
        push_date_range(&mut count_qb, "incurred_at", range);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE organization_id = "
        ));
        qb.push_bind(organization_id);
        push_date_range(&mut qb, "incurred_at", range);
        qb.push(" ORDER BY incurred_at DESC, id DESC LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset);

        let rows = qb
            .build_query_as::<ExpenseRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Expense::from).collect(),
            total,
            page,
        ))
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<Expense> {
        debug!(amount_cents = expense.amount.cents(), "Inserting expense");

        sqlx::query(
            "INSERT INTO expenses (
                id, organization_id, description, amount_cents, category, incurred_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&expense.id)
        .bind(&expense.organization_id)
        .bind(&expense.description)
        .bind(expense.amount.cents())
        .bind(&expense.category)
        .bind(expense.incurred_at)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense.clone())
    }

    pub async fn update(&self, expense: &Expense) -> DbResult<Expense> {
        let result = sqlx::query(
            "UPDATE expenses \
             SET description = ?3, amount_cents = ?4, category = ?5, incurred_at = ?6 \
             WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(&expense.id)
        .bind(&expense.organization_id)
        .bind(&expense.description)
        .bind(expense.amount.cents())
        .bind(&expense.category)
        .bind(expense.incurred_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", &expense.id));
        }

        self.get_by_id(&expense.organization_id, &expense.id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", &expense.id))
    }

    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1 AND organization_id = ?2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}
