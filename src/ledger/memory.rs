//! In-memory ledger store for tests.
//!
//! All units serialize on one async mutex held for the unit's lifetime.
//! Writes go to a working copy that replaces the shared state on commit, so
//! an uncommitted unit leaves no trace. Failure flags let tests break a unit
//! at a chosen step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::rollup::{EventFinancials, LedgerTotals};
use super::store::{LedgerStore, LedgerUnit};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Event, EventStatus, NewTransaction, Transaction, TransactionStatus, TransactionType,
    DEFAULT_CURRENCY,
};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    events: HashMap<Uuid, Event>,
    transactions: HashMap<Uuid, Transaction>,
}

#[derive(Debug, Default)]
struct FailureFlags {
    fail_on_begin: RwLock<bool>,
    fail_on_write_financials: RwLock<bool>,
    fail_on_commit: RwLock<bool>,
}

/// Mock ledger store that keeps events and transactions in memory
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
    failures: Arc<FailureFlags>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_begin(&self, fail: bool) {
        *self.failures.fail_on_begin.write().await = fail;
    }

    pub async fn set_fail_on_write_financials(&self, fail: bool) {
        *self.failures.fail_on_write_financials.write().await = fail;
    }

    pub async fn set_fail_on_commit(&self, fail: bool) {
        *self.failures.fail_on_commit.write().await = fail;
    }

    /// Seed an event with zeroed financials
    pub async fn add_event(&self, name: &str, budget: Decimal) -> Event {
        let now = Utc::now().naive_utc();
        let event = Event {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            client_id: None,
            event_date: now.date(),
            end_date: None,
            venue: None,
            expected_attendees: None,
            status: EventStatus::Planning.as_str().to_string(),
            budget,
            currency: DEFAULT_CURRENCY.to_string(),
            revenue: Decimal::ZERO,
            actual_cost: Decimal::ZERO,
            profit_margin: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .events
            .insert(event.id, event.clone());
        event
    }

    pub async fn event(&self, id: Uuid) -> Option<Event> {
        self.state.lock().await.events.get(&id).cloned()
    }

    pub async fn transaction(&self, id: Uuid) -> Option<Transaction> {
        self.state.lock().await.transactions.get(&id).cloned()
    }

    /// Committed transactions of one event, oldest first
    pub async fn transactions_for(&self, event_id: Uuid) -> Vec<Transaction> {
        let state = self.state.lock().await;
        let mut rows: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.created_at);
        rows
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerUnit>> {
        if *self.failures.fail_on_begin.read().await {
            return Err(LedgerError::Storage("connection refused".to_string()));
        }

        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryLedgerUnit {
            guard,
            working,
            failures: Arc::clone(&self.failures),
        }))
    }
}

struct MemoryLedgerUnit {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    failures: Arc<FailureFlags>,
}

fn check_constraints(amount: Decimal, currency: &str) -> LedgerResult<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount violates check constraint".to_string(),
        ));
    }
    if currency.chars().count() != 3 {
        return Err(LedgerError::Validation(
            "currency violates check constraint".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl LedgerUnit for MemoryLedgerUnit {
    async fn lock_event(&mut self, event_id: Uuid) -> LedgerResult<()> {
        // The store mutex already serializes units.
        if self.working.events.contains_key(&event_id) {
            Ok(())
        } else {
            Err(LedgerError::EventNotFound(event_id))
        }
    }

    async fn insert_transaction(&mut self, new: &NewTransaction) -> LedgerResult<Transaction> {
        if !self.working.events.contains_key(&new.event_id) {
            return Err(LedgerError::Validation(format!(
                "event {} violates foreign key constraint",
                new.event_id
            )));
        }
        check_constraints(new.amount, new.currency_or_default())?;

        let now = Utc::now().naive_utc();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            transaction_type: new.transaction_type.as_str().to_string(),
            category: new.category.clone(),
            description: new.description.clone(),
            amount: new.amount,
            currency: new.currency_or_default().to_string(),
            transaction_date: new.transaction_date,
            status: new.status.as_str().to_string(),
            client_id: new.client_id,
            vendor_id: new.vendor_id,
            payment_method: new.payment_method.clone(),
            reference_number: new.reference_number.clone(),
            created_at: now,
            updated_at: now,
        };
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn find_transaction_for_update(&mut self, id: Uuid) -> LedgerResult<Transaction> {
        self.working
            .transactions
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> LedgerResult<Transaction> {
        if !self.working.events.contains_key(&transaction.event_id) {
            return Err(LedgerError::Validation(format!(
                "event {} violates foreign key constraint",
                transaction.event_id
            )));
        }
        check_constraints(transaction.amount, &transaction.currency)?;

        let slot = self
            .working
            .transactions
            .get_mut(&transaction.id)
            .ok_or(LedgerError::TransactionNotFound(transaction.id))?;
        *slot = Transaction {
            updated_at: Utc::now().naive_utc(),
            ..transaction.clone()
        };
        Ok(slot.clone())
    }

    async fn delete_transaction(&mut self, id: Uuid) -> LedgerResult<()> {
        self.working
            .transactions
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    async fn completed_totals(&mut self, event_id: Uuid) -> LedgerResult<LedgerTotals> {
        let mut totals = LedgerTotals::default();
        for tx in self.working.transactions.values() {
            if tx.event_id != event_id || tx.status_enum() != Some(TransactionStatus::Completed) {
                continue;
            }
            match tx.tx_type() {
                Some(TransactionType::Income) => totals.income += tx.amount,
                Some(TransactionType::Expense) => totals.expense += tx.amount,
                None => {
                    return Err(LedgerError::Storage(format!(
                        "unknown transaction type {}",
                        tx.transaction_type
                    )))
                }
            }
        }
        Ok(totals)
    }

    async fn write_financials(
        &mut self,
        event_id: Uuid,
        financials: &EventFinancials,
    ) -> LedgerResult<()> {
        if *self.failures.fail_on_write_financials.read().await {
            return Err(LedgerError::Storage(
                "write to events failed".to_string(),
            ));
        }

        let event = self
            .working
            .events
            .get_mut(&event_id)
            .ok_or(LedgerError::EventNotFound(event_id))?;
        event.revenue = financials.revenue;
        event.actual_cost = financials.actual_cost;
        event.profit_margin = financials.profit_margin;
        event.updated_at = Utc::now().naive_utc();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        if *self.failures.fail_on_commit.read().await {
            return Err(LedgerError::Storage("commit failed".to_string()));
        }

        let MemoryLedgerUnit {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
