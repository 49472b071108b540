use async_trait::async_trait;
use uuid::Uuid;

use super::rollup::{EventFinancials, LedgerTotals};
use crate::error::LedgerResult;
use crate::models::{NewTransaction, Transaction};

/// Opens ledger units.
///
/// A unit is one atomic storage scope: everything written through it becomes
/// visible on [`LedgerUnit::commit`], and dropping it uncommitted discards
/// every write.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerUnit>>;
}

/// Write primitives of the ledger, scoped to one open unit
#[async_trait]
pub trait LedgerUnit: Send {
    /// Take the event row lock; `EventNotFound` when absent
    async fn lock_event(&mut self, event_id: Uuid) -> LedgerResult<()>;

    async fn insert_transaction(&mut self, new: &NewTransaction) -> LedgerResult<Transaction>;

    /// Read and lock a transaction row; `TransactionNotFound` when absent
    async fn find_transaction_for_update(&mut self, id: Uuid) -> LedgerResult<Transaction>;

    /// Overwrite a transaction row with `transaction` and touch `updated_at`
    async fn update_transaction(&mut self, transaction: &Transaction) -> LedgerResult<Transaction>;

    async fn delete_transaction(&mut self, id: Uuid) -> LedgerResult<()>;

    /// Completed income and expense sums for one event
    async fn completed_totals(&mut self, event_id: Uuid) -> LedgerResult<LedgerTotals>;

    /// Overwrite the cached financial columns; `EventNotFound` when absent
    async fn write_financials(
        &mut self,
        event_id: Uuid,
        financials: &EventFinancials,
    ) -> LedgerResult<()>;

    async fn commit(self: Box<Self>) -> LedgerResult<()>;
}
