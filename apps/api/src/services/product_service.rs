//! Product catalog service.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use tally_core::validation::{
    validate_bundle, validate_description, validate_money_non_negative, validate_name,
    validate_stock,
};
use tally_core::{BundleTier, Money, Product};
use tally_db::Database;

use crate::auth::OrgContext;
use crate::dto::{ListQuery, PageResponse, ProductRequest, ProductResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Validates a request body and turns it into a product with the given id.
fn build_product(organization_id: &str, id: String, request: ProductRequest) -> ApiResult<Product> {
    let name = request.name.trim().to_string();
    validate_name("name", &name)?;
    validate_description(request.description.as_deref())?;

    let price = Money::from_cents(request.price_cents);
    let cost = Money::from_cents(request.cost_cents);
    validate_money_non_negative("price_cents", price)?;
    validate_money_non_negative("cost_cents", cost)?;
    validate_stock(request.stock)?;

    let bundle = request
        .bundle
        .map(|b| BundleTier {
            quantity: b.quantity,
            price: Money::from_cents(b.price_cents),
        });
    if let Some(tier) = &bundle {
        validate_bundle(tier)?;
    }

    let now = Utc::now();
    Ok(Product {
        id,
        organization_id: organization_id.to_string(),
        name,
        description: request.description.filter(|d| !d.trim().is_empty()),
        price,
        cost,
        stock: request.stock,
        bundle,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

pub async fn create_product(
    db: &Database,
    organization_id: &str,
    request: ProductRequest,
) -> ApiResult<Product> {
    let product = build_product(organization_id, Uuid::new_v4().to_string(), request)?;
    let product = db.products().insert(&product).await?;
    info!(id = %product.id, name = %product.name, "Product created");
    Ok(product)
}

/// Replaces every editable field of an existing product.
pub async fn update_product(
    db: &Database,
    organization_id: &str,
    id: &str,
    request: ProductRequest,
) -> ApiResult<Product> {
    let product = build_product(organization_id, id.to_string(), request)?;
    Ok(db.products().update(&product).await?)
}

pub async fn get_product(db: &Database, organization_id: &str, id: &str) -> ApiResult<Product> {
    db.products()
        .get_by_id(organization_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn create(
    State(state): State<AppState>,
    ctx: OrgContext,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let Json(request) = body?;
    let product = create_product(&state.db, &ctx.organization_id, request).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn list(
    State(state): State<AppState>,
    ctx: OrgContext,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<ProductResponse>>> {
    let Query(query) = query?;
    let page = state.page(query.offset, query.limit)?;
    let products = state
        .db
        .products()
        .list(&ctx.organization_id, query.search.as_deref(), page)
        .await?;
    Ok(Json(PageResponse::from_page(products, ProductResponse::from)))
}

pub async fn get(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductResponse>> {
    let product = get_product(&state.db, &ctx.organization_id, &id).await?;
    Ok(Json(product.into()))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<ProductResponse>> {
    let Json(request) = body?;
    let product = update_product(&state.db, &ctx.organization_id, &id, request).await?;
    Ok(Json(product.into()))
}

/// Soft delete: the product disappears from reads and checkout, sales history
/// keeps its name.
pub async fn delete(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&ctx.organization_id, &id).await?;
    info!(id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
