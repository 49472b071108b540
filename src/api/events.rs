use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::ledger::EventRollup;
use crate::models::{
    Event, EventBudget, EventBudgetLine, EventDetail, EventFilter, EventSummary, EventUpdate,
    NewEvent, SetEventBudget,
};

pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> AppResult<Json<Vec<EventSummary>>> {
    Ok(Json(state.events.list_events(&filter).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let event = state.events.create_event(new).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventDetail>> {
    Ok(Json(state.events.get_event(id).await?))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<EventUpdate>,
) -> AppResult<Json<Event>> {
    Ok(Json(state.events.update_event(id, update).await?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.events.delete_event(id).await?;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

/// Rebuild the cached financials from the committed ledger
pub async fn update_financials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventRollup>> {
    let financials = state.ledger.recompute_event_financials(id).await?;
    Ok(Json(EventRollup {
        event_id: id,
        financials,
    }))
}

pub async fn list_budget_lines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<EventBudgetLine>>> {
    Ok(Json(state.budgets.lines_for_event(id).await?))
}

pub async fn set_budget_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(line): ApiJson<SetEventBudget>,
) -> AppResult<Json<EventBudget>> {
    if line.budgeted_amount.is_sign_negative() {
        return Err(AppError::Validation(
            "Budgeted amount must be non-negative".into(),
        ));
    }
    Ok(Json(state.budgets.upsert_event_budget(id, &line).await?))
}
