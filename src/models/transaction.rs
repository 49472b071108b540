//! Ledger entries owned by events.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Currency assumed when none is given
pub const DEFAULT_CURRENCY: &str = "IDR";

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

/// Settlement state of a ledger entry. Only `Completed` entries count
/// towards an event's rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// Transaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub event_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_date: NaiveDate,
    pub status: String,
    pub client_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    pub fn tx_type(&self) -> Option<TransactionType> {
        self.transaction_type.parse().ok()
    }

    pub fn status_enum(&self) -> Option<TransactionStatus> {
        self.status.parse().ok()
    }

    pub fn is_completed(&self) -> bool {
        self.status_enum() == Some(TransactionStatus::Completed)
    }

    /// Apply a patch in place; `updated_at` is left to the caller
    pub fn apply(&mut self, update: &TransactionUpdate) {
        if let Some(event_id) = update.event_id {
            self.event_id = event_id;
        }
        if let Some(tx_type) = update.transaction_type {
            self.transaction_type = tx_type.as_str().to_string();
        }
        if let Some(category) = &update.category {
            self.category = category.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(currency) = &update.currency {
            self.currency = currency.clone();
        }
        if let Some(date) = update.transaction_date {
            self.transaction_date = date;
        }
        if let Some(status) = update.status {
            self.status = status.as_str().to_string();
        }
        if let Some(client_id) = update.client_id {
            self.client_id = Some(client_id);
        }
        if let Some(vendor_id) = update.vendor_id {
            self.vendor_id = Some(vendor_id);
        }
        if let Some(method) = &update.payment_method {
            self.payment_method = Some(method.clone());
        }
        if let Some(reference) = &update.reference_number {
            self.reference_number = Some(reference.clone());
        }
    }
}

/// Input for recording a ledger entry
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub event_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub status: TransactionStatus,
    pub client_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
}

impl NewTransaction {
    /// Minimal completed entry, mostly for fixtures
    pub fn new(
        event_id: Uuid,
        transaction_type: TransactionType,
        category: &str,
        amount: Decimal,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            event_id,
            transaction_type,
            category: category.to_string(),
            description: None,
            amount,
            currency: None,
            transaction_date,
            status: TransactionStatus::Completed,
            client_id: None,
            vendor_id: None,
            payment_method: None,
            reference_number: None,
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

/// Partial update of a ledger entry; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    pub event_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub status: Option<TransactionStatus>,
    pub client_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub reference_number: Option<String>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.event_id.is_none()
            && self.transaction_type.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
            && self.transaction_date.is_none()
            && self.status.is_none()
            && self.client_id.is_none()
            && self.vendor_id.is_none()
            && self.payment_method.is_none()
            && self.reference_number.is_none()
    }

    /// Whether the patch touches a field the rollup reads
    pub fn affects_rollup(&self) -> bool {
        self.event_id.is_some()
            || self.transaction_type.is_some()
            || self.amount.is_some()
            || self.status.is_some()
    }
}

/// Sortable columns for transaction listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSort {
    #[default]
    TransactionDate,
    Amount,
    Type,
    Category,
    Status,
    CreatedAt,
}

impl TransactionSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::TransactionDate => "transaction_date",
            Self::Amount => "amount",
            Self::Type => "type",
            Self::Category => "category",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Filters for transaction listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub event_id: Option<Uuid>,
    pub category: Option<String>,
    pub status: Option<TransactionStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: TransactionSort,
    #[serde(default)]
    pub sort_order: super::SortOrder,
}

/// Transaction row joined with event and counterparty names
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub event_name: Option<String>,
    pub entity_name: Option<String>,
    pub entity_type: &'static str,
}

impl<'r> FromRow<'r, PgRow> for TransactionView {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let transaction = Transaction::from_row(row)?;
        let entity_type = if transaction.client_id.is_some() {
            "client"
        } else {
            "vendor"
        };
        Ok(Self {
            transaction,
            event_name: row.try_get("event_name")?,
            entity_name: row.try_get("entity_name")?,
            entity_type,
        })
    }
}

/// Totals block returned with a transaction listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct TransactionSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub income_count: i64,
    pub expense_count: i64,
}

/// Listing response: rows plus totals over the same filter
#[derive(Debug, Clone, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<TransactionView>,
    pub summary: TransactionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        let now = chrono::Utc::now().naive_utc();
        Transaction {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            transaction_type: "income".to_string(),
            category: "event_fee".to_string(),
            description: None,
            amount: Decimal::new(1_000, 0),
            currency: DEFAULT_CURRENCY.to_string(),
            transaction_date: now.date(),
            status: "pending".to_string(),
            client_id: None,
            vendor_id: None,
            payment_method: None,
            reference_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transaction_enums_parse_database_strings() {
        assert_eq!("income".parse::<TransactionType>().unwrap(), TransactionType::Income);
        assert_eq!("expense".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("refund".parse::<TransactionType>().is_err());
        assert_eq!(
            "cancelled".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Cancelled
        );
        assert!("approved".parse::<TransactionStatus>().is_err());
        assert_eq!(TransactionStatus::default(), TransactionStatus::Completed);
    }

    #[test]
    fn test_update_affects_rollup_only_for_ledger_fields() {
        let cosmetic = TransactionUpdate {
            description: Some("Deposit".into()),
            payment_method: Some("transfer".into()),
            ..Default::default()
        };
        assert!(!cosmetic.is_empty());
        assert!(!cosmetic.affects_rollup());

        let status = TransactionUpdate {
            status: Some(TransactionStatus::Cancelled),
            ..Default::default()
        };
        assert!(status.affects_rollup());

        let tx_type = TransactionUpdate {
            transaction_type: Some(TransactionType::Expense),
            ..Default::default()
        };
        assert!(tx_type.affects_rollup());
    }

    #[test]
    fn test_apply_patch() {
        let mut tx = sample();
        let update = TransactionUpdate {
            amount: Some(Decimal::new(2_500, 0)),
            status: Some(TransactionStatus::Completed),
            reference_number: Some("INV-7".into()),
            ..Default::default()
        };
        tx.apply(&update);

        assert_eq!(tx.amount, Decimal::new(2_500, 0));
        assert!(tx.is_completed());
        assert_eq!(tx.reference_number.as_deref(), Some("INV-7"));
        assert_eq!(tx.category, "event_fee");
    }

    #[test]
    fn test_new_transaction_defaults() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let tx = NewTransaction::new(
            Uuid::new_v4(),
            TransactionType::Income,
            "event_fee",
            Decimal::new(15_000_000, 0),
            date,
        );
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.currency_or_default(), "IDR");

        let pending = tx.with_status(TransactionStatus::Pending);
        assert_eq!(pending.status, TransactionStatus::Pending);
    }

    #[test]
    fn test_new_transaction_deserializes_type_field() {
        let json = serde_json::json!({
            "event_id": Uuid::nil(),
            "type": "expense",
            "category": "equipment",
            "amount": "3500000",
            "transaction_date": "2024-01-14"
        });
        let tx: NewTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Expense);
        assert_eq!(tx.amount, Decimal::new(3_500_000, 0));
        assert_eq!(tx.status, TransactionStatus::Completed);
    }
}
