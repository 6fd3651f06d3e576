//! Transaction service: the checkout orchestrator.
//!
//! ```text
//! POST /transactions
//!      │
//!      ├─ 1. validate items (non-empty, quantities, line count)
//!      ├─ 2. load products in one query ──────────► ProductsNotFound
//!      ├─ 3. resolve discount code ────────────────► DiscountNotFound
//!      ├─ 4. settle_order: stock pre-check, line pricing, whole-order
//!      │     discount, rounded profit ─────────────► InsufficientStock
//!      ├─ 5. commit_sale: header + guarded stock decrement + items,
//!      │     one SQL transaction ──────────────────► InsufficientStock (race)
//!      └─ 6. read it back with product names
//! ```
//!
//! Nothing is written before step 5, and step 5 either writes everything or
//! nothing.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use tally_core::validation::{validate_date_range, validate_line_count, validate_quantity};
use tally_core::{
    settle_order, CoreError, OrderLine, PageRequest, Page, Product, RoundingRule, Transaction,
    TransactionItem, TransactionView,
};
use tally_db::Database;

use crate::auth::OrgContext;
use crate::dto::{CreateTransactionRequest, ListQuery, PageResponse, TransactionResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Operations
// =============================================================================

/// Prices, stores and returns a sale.
pub async fn create_transaction(
    db: &Database,
    organization_id: &str,
    request: CreateTransactionRequest,
    rounding: RoundingRule,
) -> ApiResult<TransactionView> {
    if request.items.is_empty() {
        return Err(CoreError::EmptyOrder.into());
    }
    validate_line_count(request.items.len())?;
    for item in &request.items {
        validate_quantity(item.quantity)?;
    }

    let mut ids: Vec<String> = Vec::with_capacity(request.items.len());
    for item in &request.items {
        if !ids.contains(&item.product_id) {
            ids.push(item.product_id.clone());
        }
    }

    let products = db.products().get_many(organization_id, &ids).await?;
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut lines = Vec::with_capacity(request.items.len());
    let mut missing: Vec<String> = Vec::new();
    for item in &request.items {
        match by_id.get(item.product_id.as_str()) {
            Some(&product) => lines.push(OrderLine {
                product,
                quantity: item.quantity,
            }),
            None if !missing.contains(&item.product_id) => missing.push(item.product_id.clone()),
            None => {}
        }
    }
    if !missing.is_empty() {
        return Err(CoreError::ProductsNotFound(missing).into());
    }

    let discount = match request
        .discount_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        Some(code) => Some(
            db.discounts()
                .find_by_code(organization_id, code)
                .await?
                .ok_or_else(|| CoreError::DiscountNotFound(code.to_string()))?,
        ),
        None => None,
    };

    let settlement = settle_order(&lines, discount.as_ref(), rounding)?;
    debug!(
        subtotal_cents = settlement.subtotal.cents(),
        order_discount_cents = settlement.order_discount.cents(),
        total_cents = settlement.total_amount.cents(),
        "Order settled"
    );

    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        total_amount: settlement.total_amount,
        profit: settlement.profit,
        discount_code: discount.map(|d| d.code),
        payment_method: request.payment_method,
        created_at: request.created_at.unwrap_or_else(Utc::now),
    };
    let items: Vec<TransactionItem> = settlement
        .lines
        .iter()
        .map(|line| TransactionItem {
            id: Uuid::new_v4().to_string(),
            transaction_id: Some(transaction.id.clone()),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            line_total: line.line_total,
        })
        .collect();

    db.transactions()
        .commit_sale(&transaction, &items, &settlement.stock)
        .await?;

    info!(
        transaction_id = %transaction.id,
        organization_id = %organization_id,
        profit_cents = transaction.profit.cents(),
        "Sale recorded"
    );

    db.transactions()
        .get_view(organization_id, &transaction.id)
        .await?
        .ok_or_else(|| {
            ApiError::internal(format!("transaction {} missing after commit", transaction.id))
        })
}

pub async fn list_transactions(
    db: &Database,
    organization_id: &str,
    query: &ListQuery,
    page: PageRequest,
) -> ApiResult<Page<TransactionView>> {
    let range = validate_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    Ok(db.transactions().list(organization_id, &range, page).await?)
}

pub async fn get_transaction(
    db: &Database,
    organization_id: &str,
    id: &str,
) -> ApiResult<TransactionView> {
    db.transactions()
        .get_view(organization_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", id))
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /transactions`
pub async fn create(
    State(state): State<AppState>,
    ctx: OrgContext,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    let Json(request) = body?;
    let view = create_transaction(
        &state.db,
        &ctx.organization_id,
        request,
        state.config.profit_rounding,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// `GET /transactions`
pub async fn list(
    State(state): State<AppState>,
    ctx: OrgContext,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<TransactionResponse>>> {
    let Query(query) = query?;
    let page = state.page(query.offset, query.limit)?;
    let result = list_transactions(&state.db, &ctx.organization_id, &query, page).await?;
    Ok(Json(PageResponse::from_page(result, TransactionResponse::from)))
}

/// `GET /transactions/{id}`
pub async fn get(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionResponse>> {
    let view = get_transaction(&state.db, &ctx.organization_id, &id).await?;
    Ok(Json(view.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::OrderItemRequest;
    use crate::error::ErrorCode;
    use crate::services::test_support::{setup, stocked};
    use chrono::Utc;
    use tally_core::{Discount, DiscountScope, Money, PaymentMethod, Percentage};

    fn order(items: &[(&str, i64)]) -> CreateTransactionRequest {
        CreateTransactionRequest {
            items: items
                .iter()
                .map(|(id, quantity)| OrderItemRequest {
                    product_id: id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            discount_code: None,
            payment_method: Some(PaymentMethod::Cash),
            created_at: None,
        }
    }

    async fn discount(db: &Database, org: &str, code: &str, bps: u32, product_id: Option<&str>) {
        let now = Utc::now();
        let scope = if product_id.is_some() {
            DiscountScope::SingleProduct
        } else {
            DiscountScope::WholeOrder
        };
        db.discounts()
            .insert(&Discount {
                id: Uuid::new_v4().to_string(),
                organization_id: org.to_string(),
                name: code.to_string(),
                code: code.to_string(),
                scope,
                percentage: Percentage::from_bps(bps),
                product_id: product_id.map(str::to_string),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    async fn stock_of(db: &Database, org: &str, id: &str) -> i64 {
        db.products().get_by_id(org, id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_bundle_sale_round_trip() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi Susu", 10_000, 6_000, 50, Some((10, 90_000))).await;

        let req = order(&[(kopi.id.as_str(), 15)]);
        let view = create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap();

        assert_eq!(view.total_amount, Money::from_units(140_000));
        // 140,000 - 15 * 6,000
        assert_eq!(view.profit, Money::from_units(50_000));
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product_name, "Kopi Susu");
        assert_eq!(view.items[0].quantity, 15);
        assert_eq!(view.items[0].line_total, Money::from_units(140_000));
        assert_eq!(stock_of(&db, &org, &kopi.id).await, 35);

        let again = get_transaction(&db, &org, &view.id).await.unwrap();
        assert_eq!(again, view);
    }

    #[tokio::test]
    async fn test_discounts_apply() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 50, None).await;
        let teh = stocked(&db, &org, "Teh", 5_000, 2_000, 50, None).await;
        discount(&db, &org, "KOPI20", 2000, Some(kopi.id.as_str())).await;
        discount(&db, &org, "HEMAT10", 1000, None).await;

        let mut req = order(&[(kopi.id.as_str(), 2), (teh.id.as_str(), 2)]);
        req.discount_code = Some("KOPI20".to_string());
        let view = create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap();
        // kopi 20,000 * 0.8 + teh 10,000
        assert_eq!(view.total_amount, Money::from_units(26_000));
        assert_eq!(view.discount_code.as_deref(), Some("KOPI20"));

        let mut req = order(&[(kopi.id.as_str(), 2), (teh.id.as_str(), 2)]);
        req.discount_code = Some("HEMAT10".to_string());
        let view = create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap();
        assert_eq!(view.total_amount, Money::from_units(27_000));
        // 27,000 - (10,000 + 4,000)
        assert_eq!(view.profit, Money::from_units(13_000));
    }

    #[tokio::test]
    async fn test_empty_order_writes_nothing() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 5, None).await;

        let err = create_transaction(&db, &org, order(&[]), RoundingRule::HalfUp)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyOrder);
        assert_eq!(stock_of(&db, &org, &kopi.id).await, 5);

        let page = db
            .transactions()
            .list(&org, &Default::default(), PageRequest { offset: 0, limit: 10 })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 5, None).await;

        let req = order(&[(kopi.id.as_str(), 0)]);
        let err = create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let missing = Uuid::new_v4().to_string();
        let err = create_transaction(
            &db,
            &org,
            order(&[(kopi.id.as_str(), 1), (missing.as_str(), 1), (missing.as_str(), 2)]),
            RoundingRule::HalfUp,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductsNotFound);
        assert!(err.message.contains(&missing));

        let mut req = order(&[(kopi.id.as_str(), 1)]);
        req.discount_code = Some("GHOST".to_string());
        let err = create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountNotFound);

        assert_eq!(stock_of(&db, &org, &kopi.id).await, 5);
    }

    #[tokio::test]
    async fn test_insufficient_stock_counts_repeated_lines() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 5, None).await;

        let err = create_transaction(
            &db,
            &org,
            order(&[(kopi.id.as_str(), 3), (kopi.id.as_str(), 3)]),
            RoundingRule::HalfUp,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(stock_of(&db, &org, &kopi.id).await, 5);
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_see_or_sell() {
        let (db, org) = setup().await;
        let other = db.organizations().create("Other", "other").await.unwrap();
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 5, None).await;

        let req = order(&[(kopi.id.as_str(), 1)]);
        let view = create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap();

        let err = get_transaction(&db, &other.id, &view.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let req = order(&[(kopi.id.as_str(), 1)]);
        let err = create_transaction(&db, &other.id, req, RoundingRule::HalfUp).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductsNotFound);
    }

    #[tokio::test]
    async fn test_list_filters_by_date() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 50, None).await;

        for day in ["2024-03-01T09:00:00Z", "2024-03-02T09:00:00Z", "2024-03-03T09:00:00Z"] {
            let mut req = order(&[(kopi.id.as_str(), 1)]);
            req.created_at = Some(day.parse().unwrap());
            create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap();
        }

        let query = ListQuery {
            start_date: Some("2024-03-02".to_string()),
            end_date: Some("2024-03-03".to_string()),
            ..Default::default()
        };
        let page = list_transactions(&db, &org, &query, PageRequest { offset: 0, limit: 10 })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.data[0].created_at > page.data[1].created_at);
        assert!(page.data.iter().all(|t| t.items.len() == 1));

        let bad = ListQuery {
            start_date: Some("2024-03-05".to_string()),
            end_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        let err = list_transactions(&db, &org, &bad, PageRequest { offset: 0, limit: 10 })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateRange);
    }

    #[tokio::test]
    async fn test_list_timestamp_end_is_inclusive() {
        let (db, org) = setup().await;
        let kopi = stocked(&db, &org, "Kopi", 10_000, 5_000, 50, None).await;

        for at in ["2024-03-02T09:00:00Z", "2024-03-02T09:00:01Z"] {
            let mut req = order(&[(kopi.id.as_str(), 1)]);
            req.created_at = Some(at.parse().unwrap());
            create_transaction(&db, &org, req, RoundingRule::HalfUp).await.unwrap();
        }
        let page = PageRequest { offset: 0, limit: 10 };

        let up_to = ListQuery {
            end_date: Some("2024-03-02T09:00:00Z".to_string()),
            ..Default::default()
        };
        let found = list_transactions(&db, &org, &up_to, page).await.unwrap();
        assert_eq!(found.total, 1);

        let instant = ListQuery {
            start_date: Some("2024-03-02T09:00:00Z".to_string()),
            end_date: Some("2024-03-02T09:00:00Z".to_string()),
            ..Default::default()
        };
        let found = list_transactions(&db, &org, &instant, page).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.data[0].created_at.to_rfc3339(), "2024-03-02T09:00:00+00:00");
    }
}
