//! Sales summary service.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use tracing::debug;

use tally_core::validation::validate_date_range;
use tally_core::SalesSummary;
use tally_db::Database;

use crate::auth::OrgContext;
use crate::dto::{DateRangeQuery, SummaryResponse};
use crate::error::ApiResult;
use crate::AppState;

pub async fn sales_summary(
    db: &Database,
    organization_id: &str,
    query: &DateRangeQuery,
) -> ApiResult<SalesSummary> {
    let range = validate_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
    debug!(?range, "Computing sales summary");
    Ok(db.analytics().summary(organization_id, &range).await?)
}

/// `GET /analytics/summary?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
pub async fn summary(
    State(state): State<AppState>,
    ctx: OrgContext,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ApiResult<Json<SummaryResponse>> {
    let Query(query) = query?;
    let summary = sales_summary(&state.db, &ctx.organization_id, &query).await?;
    Ok(Json(summary.into()))
}
