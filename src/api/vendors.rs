use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::ApiJson;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{NewVendor, Vendor, VendorFilter, VendorUpdate};

fn validate_rating(rating: Option<Decimal>) -> AppResult<()> {
    match rating {
        Some(r) if r < Decimal::ZERO || r > Decimal::from(5) => Err(AppError::Validation(
            "Rating must be between 0 and 5".into(),
        )),
        _ => Ok(()),
    }
}

pub async fn list_vendors(
    State(state): State<AppState>,
    Query(filter): Query<VendorFilter>,
) -> AppResult<Json<Vec<Vendor>>> {
    Ok(Json(state.vendors.list(&filter).await?))
}

pub async fn create_vendor(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewVendor>,
) -> AppResult<(StatusCode, Json<Vendor>)> {
    if new.company_name.trim().is_empty() {
        return Err(AppError::Validation("Company name is required".into()));
    }
    validate_rating(new.rating)?;
    let vendor = state.vendors.create(&new).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vendor>> {
    let vendor = state
        .vendors
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vendor {} not found", id)))?;
    Ok(Json(vendor))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<VendorUpdate>,
) -> AppResult<Json<Vendor>> {
    validate_rating(update.rating)?;
    let vendor = state
        .vendors
        .update(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vendor {} not found", id)))?;
    Ok(Json(vendor))
}

pub async fn delete_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.vendors.delete(id).await?;
    Ok(Json(json!({ "message": "Vendor deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(None).is_ok());
        assert!(validate_rating(Some(Decimal::new(45, 1))).is_ok());
        assert!(validate_rating(Some(Decimal::from(5))).is_ok());
        assert!(validate_rating(Some(Decimal::new(51, 1))).is_err());
        assert!(validate_rating(Some(Decimal::new(-1, 0))).is_err());
    }
}
