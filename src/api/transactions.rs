use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::error::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::ledger::TransactionMutation;
use crate::models::{
    NewTransaction, TransactionFilter, TransactionList, TransactionUpdate, TransactionView,
};

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> AppResult<Json<TransactionList>> {
    Ok(Json(state.transactions.list(&filter).await?))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransactionView>> {
    let transaction = state
        .transactions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;
    Ok(Json(transaction))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewTransaction>,
) -> AppResult<(StatusCode, Json<TransactionMutation>)> {
    let mutation = state.ledger.create_transaction(new).await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<TransactionUpdate>,
) -> AppResult<Json<TransactionMutation>> {
    Ok(Json(state.ledger.update_transaction(id, update).await?))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransactionMutation>> {
    Ok(Json(state.ledger.delete_transaction(id).await?))
}

pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.transactions.categories().await?))
}
