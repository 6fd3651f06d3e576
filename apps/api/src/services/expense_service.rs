//! Expense service. Expenses feed the net income figure of the sales summary.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use tally_core::validation::{validate_date_range, validate_expense_amount, validate_name};
use tally_core::{Expense, Money};
use tally_db::Database;

use crate::auth::OrgContext;
use crate::dto::{ExpenseRequest, ExpenseResponse, ListQuery, PageResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn build_expense(organization_id: &str, id: String, request: ExpenseRequest) -> ApiResult<Expense> {
    let description = request.description.trim().to_string();
    validate_name("description", &description)?;

    let amount = Money::from_cents(request.amount_cents);
    validate_expense_amount(amount)?;

    let category = request
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if let Some(category) = &category {
        validate_name("category", category)?;
    }

    let now = Utc::now();
    Ok(Expense {
        id,
        organization_id: organization_id.to_string(),
        description,
        amount,
        category,
        incurred_at: request.incurred_at.unwrap_or(now),
        created_at: now,
    })
}

pub async fn create_expense(
    db: &Database,
    organization_id: &str,
    request: ExpenseRequest,
) -> ApiResult<Expense> {
    let expense = build_expense(organization_id, Uuid::new_v4().to_string(), request)?;
    let expense = db.expenses().insert(&expense).await?;
    info!(id = %expense.id, amount_cents = expense.amount.cents(), "Expense recorded");
    Ok(expense)
}

pub async fn update_expense(
    db: &Database,
    organization_id: &str,
    id: &str,
    request: ExpenseRequest,
) -> ApiResult<Expense> {
    let expense = build_expense(organization_id, id.to_string(), request)?;
    Ok(db.expenses().update(&expense).await?)
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn create(
    State(state): State<AppState>,
    ctx: OrgContext,
    body: Result<Json<ExpenseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ExpenseResponse>)> {
    let Json(request) = body?;
    let expense = create_expense(&state.db, &ctx.organization_id, request).await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}

pub async fn list(
    State(state): State<AppState>,
    ctx: OrgContext,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<PageResponse<ExpenseResponse>>> {
    let Query(query) = query?;
    let page = state.page(query.offset, query.limit)?;
    let range = validate_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    let expenses = state
        .db
        .expenses()
        .list(&ctx.organization_id, &range, page)
        .await?;
    Ok(Json(PageResponse::from_page(expenses, ExpenseResponse::from)))
}

pub async fn get(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ExpenseResponse>> {
    let expense = state
        .db
        .expenses()
        .get_by_id(&ctx.organization_id, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Expense", &id))?;
    Ok(Json(expense.into()))
}

pub async fn update(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
    body: Result<Json<ExpenseRequest>, JsonRejection>,
) -> ApiResult<Json<ExpenseResponse>> {
    let Json(request) = body?;
    let expense = update_expense(&state.db, &ctx.organization_id, &id, request).await?;
    Ok(Json(expense.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    ctx: OrgContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.expenses().delete(&ctx.organization_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
