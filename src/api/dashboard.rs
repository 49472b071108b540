use axum::extract::{Query, State};
use axum::Json;

use super::AppState;
use crate::error::AppResult;
use crate::models::report::{ChartQuery, ChartReport, DashboardOverview, KpiQuery, KpiReport};

pub async fn overview(State(state): State<AppState>) -> AppResult<Json<DashboardOverview>> {
    Ok(Json(state.dashboard.overview().await?))
}

pub async fn kpis(
    State(state): State<AppState>,
    Query(query): Query<KpiQuery>,
) -> AppResult<Json<KpiReport>> {
    Ok(Json(state.dashboard.kpis(query.period).await?))
}

pub async fn revenue_expenses_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<ChartReport>> {
    Ok(Json(state.dashboard.revenue_expenses_chart(&query).await?))
}
