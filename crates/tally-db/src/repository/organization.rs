//! # Organization Repository
//!
//! Tenants. Created by the seed binary and by tests; the API only reads the
//! active organization off the caller's session.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::Organization;

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: SqlitePool,
}

impl OrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrganizationRepository { pool }
    }

    /// Creates an organization with a fresh id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - The slug is taken
    pub async fn create(&self, name: &str, slug: &str) -> DbResult<Organization> {
        let organization = Organization {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO organizations (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&organization.id)
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(organization.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(slug))?;

        info!(id = %organization.id, slug = %organization.slug, "Organization created");
        Ok(organization)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, slug, created_at FROM organizations WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Organization::from))
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, slug, created_at FROM organizations WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Organization::from))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.organizations();

        let org = repo.create("Warung Bu Sri", "bu-sri").await.unwrap();
        let by_id = repo.get_by_id(&org.id).await.unwrap().unwrap();
        let by_slug = repo.get_by_slug("bu-sri").await.unwrap().unwrap();

        assert_eq!(by_id.name, "Warung Bu Sri");
        assert_eq!(by_slug.id, org.id);
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.organizations().create("A", "same").await.unwrap();

        match db.organizations().create("B", "same").await {
            Err(DbError::UniqueViolation { field, value }) => {
                assert_eq!(field, "slug");
                assert_eq!(value, "same");
            }
            other => panic!("expected UniqueViolation, got {:?}", other),
        }
    }
}
