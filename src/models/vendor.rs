use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Supplier paid through expense transactions
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub service_category: Option<String>,
    pub rating: Option<Decimal>,
    pub payment_terms: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVendor {
    pub company_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub service_category: Option<String>,
    pub rating: Option<Decimal>,
    pub payment_terms: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorUpdate {
    pub company_name: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub service_category: Option<String>,
    pub rating: Option<Decimal>,
    pub payment_terms: Option<i32>,
    pub is_active: Option<bool>,
}

/// Filters for vendor listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorFilter {
    pub search: Option<String>,
    pub service_category: Option<String>,
    pub is_active: Option<bool>,
}
