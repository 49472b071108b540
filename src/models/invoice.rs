//! Client invoices and their line items.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Billing state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Sent or overdue: billed and still awaiting payment
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Sent | Self::Overdue)
    }

    /// Paid and cancelled invoices are closed
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Allowed status moves. Staying put is always allowed.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            Self::Draft => matches!(next, Self::Sent | Self::Cancelled),
            Self::Sent => matches!(next, Self::Paid | Self::Overdue | Self::Cancelled),
            Self::Overdue => matches!(next, Self::Paid | Self::Cancelled),
            Self::Paid | Self::Cancelled => false,
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub event_id: Option<Uuid>,
    pub client_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Invoice {
    pub fn status_enum(&self) -> Option<InvoiceStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub line_no: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoiceItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl NewInvoiceItem {
    pub fn line_total(&self) -> Decimal {
        money(self.quantity * self.unit_price)
    }
}

/// Amounts derived from the line items and the tax rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceTotals {
    pub fn from_subtotal(subtotal: Decimal, tax_rate: Decimal) -> Self {
        let tax_amount = money(subtotal * tax_rate / Decimal::ONE_HUNDRED);
        Self {
            subtotal,
            tax_amount,
            total_amount: subtotal + tax_amount,
        }
    }

    pub fn compute(items: &[NewInvoiceItem], tax_rate: Decimal) -> Self {
        let subtotal = items.iter().map(NewInvoiceItem::line_total).sum();
        Self::from_subtotal(subtotal, tax_rate)
    }
}

/// Input for creating an invoice. The number and the amounts are assigned
/// by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub client_id: Uuid,
    pub event_id: Option<Uuid>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<NewInvoiceItem>,
    #[serde(default)]
    pub tax_rate: Decimal,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. Supplying `items` replaces every line item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceUpdate {
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub items: Option<Vec<NewInvoiceItem>>,
}

impl InvoiceUpdate {
    pub fn is_empty(&self) -> bool {
        self.issue_date.is_none()
            && self.due_date.is_none()
            && self.tax_rate.is_none()
            && self.notes.is_none()
            && self.status.is_none()
            && self.items.is_none()
    }

    /// Anything other than a status change
    pub fn edits_content(&self) -> bool {
        self.issue_date.is_some()
            || self.due_date.is_some()
            || self.tax_rate.is_some()
            || self.notes.is_some()
            || self.items.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
}

/// Invoice joined with client and event names. `days_overdue` is computed
/// by the query and is 0 unless the invoice is overdue.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client_name: String,
    pub event_name: Option<String>,
    pub days_overdue: i64,
}

impl<'r> FromRow<'r, PgRow> for InvoiceView {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let invoice = Invoice::from_row(row)?;
        let days_overdue: i32 = row.try_get("days_overdue")?;
        Ok(Self {
            invoice,
            client_name: row.try_get("client_name")?,
            event_name: row.try_get("event_name")?,
            days_overdue: i64::from(days_overdue),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: InvoiceView,
    pub items: Vec<InvoiceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct InvoiceStatsRow {
    pub total_invoices: i64,
    pub draft_invoices: i64,
    pub sent_invoices: i64,
    pub paid_invoices: i64,
    pub overdue_invoices: i64,
    pub cancelled_invoices: i64,
    /// Excludes cancelled invoices
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub outstanding_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceStats {
    #[serde(flatten)]
    pub totals: InvoiceStatsRow,
    /// Paid share of everything invoiced, in percent
    pub collection_rate: Decimal,
}

/// Sent and overdue invoices awaiting payment
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct OutstandingInvoices {
    pub count: i64,
    pub amount: Decimal,
}
