//! # Discount Repository
//!
//! Discount codes, unique per organization. Lookup by code is what checkout
//! uses; the rest backs discount management.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Discount, DiscountScope, Page, PageRequest, Percentage};

const DISCOUNT_COLUMNS: &str = "id, organization_id, name, code, scope, percentage_bps, \
     product_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    organization_id: String,
    name: String,
    code: String,
    scope: DiscountScope,
    percentage_bps: i64,
    product_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DbError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let bps = u32::try_from(row.percentage_bps).map_err(|_| {
            DbError::corrupt("discounts", format!("percentage_bps {}", row.percentage_bps))
        })?;

        Ok(Discount {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            code: row.code,
            scope: row.scope,
            percentage: Percentage::from_bps(bps),
            product_id: row.product_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Resolves a code within an organization. Codes are matched exactly.
    pub async fn find_by_code(
        &self,
        organization_id: &str,
        code: &str,
    ) -> DbResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE organization_id = ?1 AND code = ?2"
        ))
        .bind(organization_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Discount::try_from).transpose()
    }

    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE organization_id = ?1 AND id = ?2"
        ))
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Discount::try_from).transpose()
    }

    /// Lists discounts ordered by code.
    pub async fn list(&self, organization_id: &str, page: PageRequest) -> DbResult<Page<Discount>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM discounts WHERE organization_id = ?1")
                .bind(organization_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE organization_id = ?1 \
             ORDER BY code LIMIT ?2 OFFSET ?3"
        ))
        .bind(organization_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let data = rows
            .into_iter()
            .map(Discount::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(data, total, page))
    }

    /// Inserts a discount.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - The code is taken in this organization
    pub async fn insert(&self, discount: &Discount) -> DbResult<Discount> {
        debug!(code = %discount.code, scope = discount.scope.as_str(), "Inserting discount");

        sqlx::query(
            "INSERT INTO discounts (
                id, organization_id, name, code, scope, percentage_bps,
                product_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&discount.id)
        .bind(&discount.organization_id)
        .bind(&discount.name)
        .bind(&discount.code)
        .bind(discount.scope)
        .bind(i64::from(discount.percentage.bps()))
        .bind(&discount.product_id)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&discount.code))?;

        Ok(discount.clone())
    }

    /// Replaces a discount's fields (code included).
    pub async fn update(&self, discount: &Discount) -> DbResult<Discount> {
        debug!(id = %discount.id, "Updating discount");

        let result = sqlx::query(
            "UPDATE discounts SET
                name = ?3,
                code = ?4,
                scope = ?5,
                percentage_bps = ?6,
                product_id = ?7,
                updated_at = ?8
            WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(&discount.id)
        .bind(&discount.organization_id)
        .bind(&discount.name)
        .bind(&discount.code)
        .bind(discount.scope)
        .bind(i64::from(discount.percentage.bps()))
        .bind(&discount.product_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&discount.code))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", &discount.id));
        }

        self.get_by_id(&discount.organization_id, &discount.id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", &discount.id))
    }

    pub async fn delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1 AND organization_id = ?2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{product, setup};
    use uuid::Uuid;

    fn discount(org: &str, code: &str, scope: DiscountScope, product_id: Option<&str>) -> Discount {
        let now = Utc::now();
        Discount {
            id: Uuid::new_v4().to_string(),
            organization_id: org.to_string(),
            name: format!("Promo {}", code),
            code: code.to_string(),
            scope,
            percentage: Percentage::from_bps(1000),
            product_id: product_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_by_code_is_org_scoped() {
        let (db, org) = setup().await;
        let other = db.organizations().create("Other", "other").await.unwrap();
        let repo = db.discounts();

        repo.insert(&discount(&org, "HEMAT10", DiscountScope::WholeOrder, None))
            .await
            .unwrap();

        let found = repo.find_by_code(&org, "HEMAT10").await.unwrap().unwrap();
        assert_eq!(found.percentage.bps(), 1000);
        assert_eq!(found.scope, DiscountScope::WholeOrder);

        assert!(repo.find_by_code(&other.id, "HEMAT10").await.unwrap().is_none());
        assert!(repo.find_by_code(&org, "NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let (db, org) = setup().await;
        let other = db.organizations().create("Other", "other").await.unwrap();
        let repo = db.discounts();

        repo.insert(&discount(&org, "DUP", DiscountScope::WholeOrder, None))
            .await
            .unwrap();

        match repo
            .insert(&discount(&org, "DUP", DiscountScope::WholeOrder, None))
            .await
        {
            Err(DbError::UniqueViolation { value, .. }) => assert_eq!(value, "DUP"),
            other => panic!("expected UniqueViolation, got {:?}", other),
        }

        // Same code in another organization is fine
        repo.insert(&discount(&other.id, "DUP", DiscountScope::WholeOrder, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_single_product_discount_round_trip_and_delete() {
        let (db, org) = setup().await;
        let p = product(&org, "Kopi", 10_000, 6_000, 5);
        db.products().insert(&p).await.unwrap();

        let repo = db.discounts();
        let mut d = discount(&org, "KOPI20", DiscountScope::SingleProduct, Some(&p.id));
        repo.insert(&d).await.unwrap();

        d.percentage = Percentage::from_bps(2000);
        let updated = repo.update(&d).await.unwrap();
        assert_eq!(updated.percentage.bps(), 2000);
        assert_eq!(updated.product_id.as_deref(), Some(p.id.as_str()));

        let page = repo.list(&org, PageRequest { offset: 0, limit: 10 }).await.unwrap();
        assert_eq!(page.total, 1);

        repo.delete(&org, &d.id).await.unwrap();
        assert!(repo.get_by_id(&org, &d.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&org, &d.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
