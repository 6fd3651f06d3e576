//! Discount service.
//!
//! A discount is either `whole_order` (taken once off the order subtotal) or
//! `single_product` (taken off the line of one product). Codes are unique per
//! organization and matched exactly.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use tally_core::validation::{
    validate_code, validate_discount_target, validate_name, validate_percentage,
};
use tally_core::Discount;
use tally_db::Database;

use crate::auth::OrgContext;
use crate::dto::{DiscountRequest, DiscountResponse, ListQuery, PageResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

async fn build_discount(
    db: &Database,
    organization_id: &str,
    id: String,
    request: DiscountRequest,
) -> ApiResult<Discount> {
    let name = request.name.trim().to_string();
    let code = request.code.trim().to_string();
    validate_name("name", &name)?;
    validate_code(&code)?;
    let percentage = validate_percentage(request.percentage)?;

    let product_id = request
        .product_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    validate_discount_target(request.scope, product_id.as_deref())?;

    if let Some(pid) = &product_id {
        if db.products().get_by_id(organization_id, pid).await?.is_none() {
            return Err(ApiError::validation(format!(
                "product_id {} does not refer to an active product",
                pid
            )));
        }
    }

    let now = Utc::now();
    Ok(Discount {
        id,
        organization_id: organization_id.to_string(),
        name,
        code,
        scope: request.scope,
        percentage,
        product_id,
        created_at: now,
        updated_at: now,
    })
}

pub async fn create_discount(
    db: &Database,
    organization_id: &str,
    request: DiscountRequest,
) -> ApiResult<Discount> {
    let discount = build_discount(db, organization_id, Uuid::new_v4().to_string(), request).await?;
    let discount = db.discounts().insert(&discount).await?;
    info!(code = %discount.code, scope = discount.scope.as_str(), "Discount created");
    Ok(discount)
}

pub async fn update_discount(
    db: &Database,
    organization_id: &str,
    id: &str,
    request: DiscountRequest,
) -> ApiResult<Discount> {
    let discount = build_discount(db, organization_id, id.to_string(), request).await?;
    Ok(db.discounts().update(&discount).await?)
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn create(
    State(state): State<AppState>,
    ctx: OrgContext,
    body: Result<Json<DiscountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DiscountResponse>)> {
    let Json(request) = body?;
    let discount = create_discount(&state.db, &ctx.organization_id, request).await?;
    Ok((StatusCode::CREATED, Json(discount.into())))
}

pub async fn list(
    State(state): State<AppState>,
    ctx: OrgContext,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<DiscountResponse>>> {
    let Query(query) = query?;
    let page = state.page(query.offset, query.limit)?;
    let discounts = state.db.discounts().list(&ctx.organization_id, page).await?;
    Ok(Json(PageResponse::from_page(discounts, DiscountResponse::from)))
}

pub async fn get(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DiscountResponse>> {
    let discount = state
        .db
        .discounts()
        .get_by_id(&ctx.organization_id, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Discount", &id))?;
    Ok(Json(discount.into()))
}

/// `GET /discounts/code/{code}`: what the till calls before checkout.
pub async fn get_by_code(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(code): Path<String>,
) -> ApiResult<Json<DiscountResponse>> {
    let discount = state
        .db
        .discounts()
        .find_by_code(&ctx.organization_id, &code)
        .await?
        .ok_or_else(|| ApiError::not_found("Discount", &code))?;
    Ok(Json(discount.into()))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
    body: Result<Json<DiscountRequest>, JsonRejection>,
) -> ApiResult<Json<DiscountResponse>> {
    let Json(request) = body?;
    let discount = update_discount(&state.db, &ctx.organization_id, &id, request).await?;
    Ok(Json(discount.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.discounts().delete(&ctx.organization_id, &id).await?;
    info!(id = %id, "Discount deleted");
    Ok(StatusCode::NO_CONTENT)
}
