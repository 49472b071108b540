use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::transaction::TransactionType;

/// Named bucket that budget lines and transactions are grouped by
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BudgetCategory {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub category_type: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBudgetCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub description: Option<String>,
}

/// Planned amount for one category of one event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventBudget {
    pub id: Uuid,
    pub event_id: Uuid,
    pub category_id: Uuid,
    pub budgeted_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Upsert payload for an event budget line
#[derive(Debug, Clone, Deserialize)]
pub struct SetEventBudget {
    pub category_id: Uuid,
    pub budgeted_amount: Decimal,
    pub notes: Option<String>,
}

/// Budget line joined with its category, as shown on the event page
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventBudgetLine {
    pub category_id: Uuid,
    pub category_name: String,
    pub category_type: String,
    pub budgeted_amount: Decimal,
    pub notes: Option<String>,
}
