use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Client, ClientUpdate, NewClient};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Client>>> {
    Ok(Json(state.clients.list(query.search.as_deref()).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewClient>,
) -> AppResult<(StatusCode, Json<Client>)> {
    if new.name.trim().is_empty() {
        return Err(AppError::Validation("Client name is required".into()));
    }
    let client = state.clients.create(&new).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Client>> {
    let client = state
        .clients
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;
    Ok(Json(client))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<ClientUpdate>,
) -> AppResult<Json<Client>> {
    let client = state
        .clients
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;
    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.clients.delete(id).await?;
    Ok(Json(json!({ "message": "Client deleted successfully" })))
}
