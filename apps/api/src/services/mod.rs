//! HTTP service implementations.
//!
//! Each module holds the domain operation (callable without HTTP, used by
//! tests) next to the axum handlers that wrap it.

pub mod analytics_service;
pub mod discount_service;
pub mod expense_service;
pub mod health_service;
pub mod product_service;
pub mod transaction_service;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use tally_core::{BundleTier, Money, Product};
    use tally_db::{Database, DbConfig};
    use uuid::Uuid;

    /// In-memory database with one organization.
    pub async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let org = db
            .organizations()
            .create("Warung Test", &format!("warung-{}", Uuid::new_v4().simple()))
            .await
            .unwrap();
        (db, org.id)
    }

    /// Inserts a product priced in whole currency units.
    pub async fn stocked(
        db: &Database,
        org: &str,
        name: &str,
        price: i64,
        cost: i64,
        stock: i64,
        bundle: Option<(i64, i64)>,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            organization_id: org.to_string(),
            name: name.to_string(),
            description: None,
            price: Money::from_units(price),
            cost: Money::from_units(cost),
            stock,
            bundle: bundle.map(|(quantity, price)| BundleTier {
                quantity,
                price: Money::from_units(price),
            }),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap()
    }
}
