use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{recompute, EventFinancials, EventRollup, LedgerStore, TransactionMutation};
use crate::models::{NewTransaction, TransactionUpdate};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Transaction-mutating operations. Each call runs as one ledger unit: the
/// ledger write and the rollup of every affected event commit together or
/// not at all.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

fn validate_category(category: &str) -> LedgerResult<()> {
    if category.trim().is_empty() {
        return Err(LedgerError::Validation("Category is required".into()));
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Amount must be a non-negative number".into(),
        ));
    }
    Ok(())
}

/// Three ASCII letters, returned upper-cased
fn normalize_currency(currency: &str) -> LedgerResult<String> {
    let code = currency.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::Validation(format!(
            "Currency must be a three-letter code, got '{}'",
            currency
        )));
    }
    Ok(code.to_ascii_uppercase())
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Record a transaction and recompute its event
    pub async fn create_transaction(&self, mut new: NewTransaction) -> LedgerResult<TransactionMutation> {
        validate_category(&new.category)?;
        validate_amount(new.amount)?;
        if let Some(currency) = new.currency.as_deref() {
            new.currency = Some(normalize_currency(currency)?);
        }

        let mut unit = self.store.begin().await?;
        unit.lock_event(new.event_id).await?;
        let transaction = unit.insert_transaction(&new).await?;
        let financials = recompute(&mut *unit, new.event_id).await?;
        unit.commit().await?;

        info!(
            transaction_id = %transaction.id,
            event_id = %transaction.event_id,
            r#type = %transaction.transaction_type,
            amount = %transaction.amount,
            "transaction created"
        );

        Ok(TransactionMutation {
            transaction,
            rollups: vec![EventRollup {
                event_id: new.event_id,
                financials,
            }],
        })
    }

    /// Apply a partial update. Moving a transaction to another event
    /// recomputes both events.
    pub async fn update_transaction(
        &self,
        id: Uuid,
        mut update: TransactionUpdate,
    ) -> LedgerResult<TransactionMutation> {
        if update.is_empty() {
            return Err(LedgerError::Validation("No fields to update".into()));
        }
        if let Some(category) = update.category.as_deref() {
            validate_category(category)?;
        }
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }
        if let Some(currency) = update.currency.as_deref() {
            update.currency = Some(normalize_currency(currency)?);
        }

        let mut unit = self.store.begin().await?;

        // Lock order: transaction row, then events by ascending id
        let current = unit.find_transaction_for_update(id).await?;
        let previous_event = current.event_id;
        let target_event = update.event_id.unwrap_or(previous_event);
        let mut affected = vec![previous_event, target_event];
        affected.sort();
        affected.dedup();
        for event_id in &affected {
            unit.lock_event(*event_id).await?;
        }

        let mut patched = current;
        patched.apply(&update);
        let transaction = unit.update_transaction(&patched).await?;

        let mut rollups = Vec::new();
        if update.affects_rollup() {
            for event_id in affected {
                let financials = recompute(&mut *unit, event_id).await?;
                rollups.push(EventRollup {
                    event_id,
                    financials,
                });
            }
        }
        unit.commit().await?;

        if previous_event != target_event {
            info!(
                transaction_id = %id,
                from_event = %previous_event,
                to_event = %target_event,
                "transaction moved between events"
            );
        } else {
            info!(transaction_id = %id, recomputed = !rollups.is_empty(), "transaction updated");
        }

        Ok(TransactionMutation {
            transaction,
            rollups,
        })
    }

    /// Remove a transaction and recompute its former event
    pub async fn delete_transaction(&self, id: Uuid) -> LedgerResult<TransactionMutation> {
        let mut unit = self.store.begin().await?;

        let transaction = unit.find_transaction_for_update(id).await?;
        let event_id = transaction.event_id;
        unit.lock_event(event_id).await?;
        unit.delete_transaction(id).await?;
        let financials = recompute(&mut *unit, event_id).await?;
        unit.commit().await?;

        info!(transaction_id = %id, %event_id, "transaction deleted");

        Ok(TransactionMutation {
            transaction,
            rollups: vec![EventRollup {
                event_id,
                financials,
            }],
        })
    }

    /// Rebuild one event's cached financials from its committed ledger
    pub async fn recompute_event_financials(&self, event_id: Uuid) -> LedgerResult<EventFinancials> {
        let mut unit = self.store.begin().await?;
        unit.lock_event(event_id).await?;
        let financials = recompute(&mut *unit, event_id).await?;
        unit.commit().await?;

        info!(%event_id, revenue = %financials.revenue, "event financials refreshed");
        Ok(financials)
    }
}
