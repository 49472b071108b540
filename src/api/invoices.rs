use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::ApiJson;
use super::AppState;
use crate::error::AppResult;
use crate::models::{
    Invoice, InvoiceDetail, InvoiceFilter, InvoiceStats, InvoiceUpdate, InvoiceView, NewInvoice,
};

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(filter): Query<InvoiceFilter>,
) -> AppResult<Json<Vec<InvoiceView>>> {
    Ok(Json(state.invoices.list_invoices(&filter).await?))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewInvoice>,
) -> AppResult<(StatusCode, Json<InvoiceDetail>)> {
    let invoice = state.invoices.create_invoice(new).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InvoiceDetail>> {
    Ok(Json(state.invoices.get_invoice(id).await?))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<InvoiceUpdate>,
) -> AppResult<Json<InvoiceDetail>> {
    Ok(Json(state.invoices.update_invoice(id, update).await?))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.invoices.delete_invoice(id).await?;
    Ok(Json(json!({ "message": "Invoice deleted successfully" })))
}

pub async fn send_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.invoices.send_invoice(id).await?))
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.invoices.pay_invoice(id).await?))
}

pub async fn invoice_stats(State(state): State<AppState>) -> AppResult<Json<InvoiceStats>> {
    Ok(Json(state.invoices.stats().await?))
}
