use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::budget::EventBudgetLine;
use super::transaction::Transaction;

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Planning,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Planning => "planning",
            EventStatus::Confirmed => "confirmed",
            EventStatus::InProgress => "in_progress",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planning" => Ok(EventStatus::Planning),
            "confirmed" => Ok(EventStatus::Confirmed),
            "in_progress" => Ok(EventStatus::InProgress),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A billable engagement. `revenue`, `actual_cost` and `profit_margin` are
/// rollup columns owned by the ledger and never written from event input.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub event_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub expected_attendees: Option<i32>,
    pub status: String, // Stored as TEXT, use EventStatus enum for type safety
    pub budget: Decimal,
    pub currency: String,
    pub revenue: Decimal,
    pub actual_cost: Decimal,
    pub profit_margin: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    /// Get status as an enum
    pub fn status_enum(&self) -> EventStatus {
        self.status.parse().unwrap_or(EventStatus::Planning)
    }

    /// Revenue minus actual cost
    pub fn profit(&self) -> Decimal {
        self.revenue - self.actual_cost
    }
}

/// Input for creating an event
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub event_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub expected_attendees: Option<i32>,
    #[serde(default)]
    pub budget: Decimal,
    pub currency: Option<String>,
}

/// Partial update of an event's descriptive fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub client_id: Option<Uuid>,
    pub event_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub expected_attendees: Option<i32>,
    pub status: Option<EventStatus>,
    pub budget: Option<Decimal>,
    pub currency: Option<String>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.client_id.is_none()
            && self.event_date.is_none()
            && self.end_date.is_none()
            && self.venue.is_none()
            && self.expected_attendees.is_none()
            && self.status.is_none()
            && self.budget.is_none()
            && self.currency.is_none()
    }
}

/// Sortable columns for event listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSort {
    #[default]
    EventDate,
    Name,
    Status,
    Budget,
    Revenue,
    CreatedAt,
}

impl EventSort {
    pub fn column(&self) -> &'static str {
        match self {
            EventSort::EventDate => "event_date",
            EventSort::Name => "name",
            EventSort::Status => "status",
            EventSort::Budget => "budget",
            EventSort::Revenue => "revenue",
            EventSort::CreatedAt => "created_at",
        }
    }
}

/// Sort direction shared by list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters for event listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub client_id: Option<Uuid>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub sort_by: EventSort,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Event listing row with client name and profit
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub client_name: Option<String>,
    pub profit: Decimal,
}

impl<'r> FromRow<'r, PgRow> for EventSummary {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let event = Event::from_row(row)?;
        let profit = event.profit();
        Ok(Self {
            event,
            client_name: row.try_get("client_name")?,
            profit,
        })
    }
}

/// Event with its ledger and budget lines
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub client_name: Option<String>,
    pub profit: Decimal,
    pub transactions: Vec<Transaction>,
    pub budget_breakdown: Vec<EventBudgetLine>,
}
