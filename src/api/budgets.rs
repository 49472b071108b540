use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{BudgetCategory, NewBudgetCategory, TransactionType};

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<BudgetCategory>>> {
    Ok(Json(state.budgets.list_categories(query.category_type).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewBudgetCategory>,
) -> AppResult<(StatusCode, Json<BudgetCategory>)> {
    if new.name.trim().is_empty() {
        return Err(AppError::Validation("Category name is required".into()));
    }
    let category = state.budgets.create_category(&new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
