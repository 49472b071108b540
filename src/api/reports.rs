use axum::extract::{Query, State};
use axum::Json;

use super::AppState;
use crate::error::AppResult;
use crate::models::report::{
    BudgetVarianceQuery, BudgetVarianceReport, CashFlowQuery, CashFlowReport, ProfitLossQuery,
    ProfitLossReport, ProfitabilityQuery, ProfitabilityReport,
};

pub async fn profit_loss(
    State(state): State<AppState>,
    Query(query): Query<ProfitLossQuery>,
) -> AppResult<Json<ProfitLossReport>> {
    Ok(Json(state.reports.profit_loss(&query).await?))
}

pub async fn cash_flow(
    State(state): State<AppState>,
    Query(query): Query<CashFlowQuery>,
) -> AppResult<Json<CashFlowReport>> {
    Ok(Json(state.reports.cash_flow(&query).await?))
}

pub async fn budget_variance(
    State(state): State<AppState>,
    Query(query): Query<BudgetVarianceQuery>,
) -> AppResult<Json<BudgetVarianceReport>> {
    Ok(Json(state.reports.budget_variance(&query).await?))
}

pub async fn event_profitability(
    State(state): State<AppState>,
    Query(query): Query<ProfitabilityQuery>,
) -> AppResult<Json<ProfitabilityReport>> {
    Ok(Json(state.reports.event_profitability(&query).await?))
}
