//! Transaction ledger and the event financial rollup.
//!
//! Every transaction mutation and the rollup it triggers run inside one
//! [`LedgerUnit`], so the cached columns on `events` never disagree with the
//! committed ledger.

pub mod memory;
pub mod postgres;
pub mod rollup;
pub mod store;

pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;
pub use rollup::{percent_of, recompute, EventFinancials, LedgerTotals};
pub use store::{LedgerStore, LedgerUnit};

use serde::Serialize;
use uuid::Uuid;

use crate::models::Transaction;

/// Financials of one event after a recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventRollup {
    pub event_id: Uuid,
    #[serde(flatten)]
    pub financials: EventFinancials,
}

/// Outcome of a create, update or delete on the ledger
#[derive(Debug, Clone, Serialize)]
pub struct TransactionMutation {
    /// Stored row; for deletes, the row as it was before removal
    pub transaction: Transaction,
    /// Events whose financials were recomputed, in lock order
    pub rollups: Vec<EventRollup>,
}

impl TransactionMutation {
    /// Recomputed financials for `event_id`, if it was part of this mutation
    pub fn financials_for(&self, event_id: Uuid) -> Option<EventFinancials> {
        self.rollups
            .iter()
            .find(|r| r.event_id == event_id)
            .map(|r| r.financials)
    }
}
