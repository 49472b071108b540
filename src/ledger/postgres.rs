use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use super::rollup::{EventFinancials, LedgerTotals};
use super::store::{LedgerStore, LedgerUnit};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{NewTransaction, Transaction, TransactionType};

const TRANSACTION_COLUMNS: &str = r#"
    id, event_id, type, category, description, amount, currency, transaction_date,
    status, client_id, vendor_id, payment_method, reference_number, created_at, updated_at
"#;

/// Ledger store backed by PostgreSQL; one unit is one `BEGIN`/`COMMIT`
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerUnit>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerUnit { tx }))
    }
}

/// Open database transaction. Dropping it without `commit` rolls back.
pub struct PgLedgerUnit {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn lock_event(&mut self, event_id: Uuid) -> LedgerResult<()> {
        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        locked
            .map(|_| ())
            .ok_or(LedgerError::EventNotFound(event_id))
    }

    async fn insert_transaction(&mut self, new: &NewTransaction) -> LedgerResult<Transaction> {
        let sql = format!(
            r#"
            INSERT INTO transactions (
                event_id, type, category, description, amount, currency, transaction_date,
                status, client_id, vendor_id, payment_method, reference_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(new.event_id)
            .bind(new.transaction_type.as_str())
            .bind(&new.category)
            .bind(&new.description)
            .bind(new.amount)
            .bind(new.currency_or_default())
            .bind(new.transaction_date)
            .bind(new.status.as_str())
            .bind(new.client_id)
            .bind(new.vendor_id)
            .bind(&new.payment_method)
            .bind(&new.reference_number)
            .fetch_one(&mut *self.tx)
            .await?;

        debug!(transaction_id = %transaction.id, event_id = %transaction.event_id, "transaction inserted");
        Ok(transaction)
    }

    async fn find_transaction_for_update(&mut self, id: Uuid) -> LedgerResult<Transaction> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE id = $1 FOR UPDATE",
            TRANSACTION_COLUMNS
        );

        sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> LedgerResult<Transaction> {
        let sql = format!(
            r#"
            UPDATE transactions
            SET event_id = $2,
                type = $3,
                category = $4,
                description = $5,
                amount = $6,
                currency = $7,
                transaction_date = $8,
                status = $9,
                client_id = $10,
                vendor_id = $11,
                payment_method = $12,
                reference_number = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction.id)
            .bind(transaction.event_id)
            .bind(&transaction.transaction_type)
            .bind(&transaction.category)
            .bind(&transaction.description)
            .bind(transaction.amount)
            .bind(&transaction.currency)
            .bind(transaction.transaction_date)
            .bind(&transaction.status)
            .bind(transaction.client_id)
            .bind(transaction.vendor_id)
            .bind(&transaction.payment_method)
            .bind(&transaction.reference_number)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction.id))
    }

    async fn delete_transaction(&mut self, id: Uuid) -> LedgerResult<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::TransactionNotFound(id));
        }
        Ok(())
    }

    async fn completed_totals(&mut self, event_id: Uuid) -> LedgerResult<LedgerTotals> {
        let rows: Vec<(String, Decimal)> = sqlx::query_as(
            r#"
            SELECT type, COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE event_id = $1 AND status = 'completed'
            GROUP BY type
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut totals = LedgerTotals::default();
        for (tx_type, sum) in rows {
            match tx_type.parse::<TransactionType>() {
                Ok(TransactionType::Income) => totals.income = sum,
                Ok(TransactionType::Expense) => totals.expense = sum,
                Err(e) => return Err(LedgerError::Storage(e)),
            }
        }
        Ok(totals)
    }

    async fn write_financials(
        &mut self,
        event_id: Uuid,
        financials: &EventFinancials,
    ) -> LedgerResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET revenue = $2, actual_cost = $3, profit_margin = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(financials.revenue)
        .bind(financials.actual_cost)
        .bind(financials.profit_margin)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::EventNotFound(event_id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
