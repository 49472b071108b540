use crate::error::{AppError, AppResult};
use crate::models::{
    Event, EventDetail, EventFilter, EventSummary, EventUpdate, NewEvent, DEFAULT_CURRENCY,
};
use crate::repositories::{BudgetRepository, EventRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Event metadata operations. Financial columns are owned by
/// [`crate::services::LedgerService`] and never touched here.
pub struct EventService {
    event_repo: Arc<EventRepository>,
    budget_repo: Arc<BudgetRepository>,
}

fn validate_new_event(new: &NewEvent) -> AppResult<()> {
    if new.name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".into()));
    }
    if new.budget.is_sign_negative() {
        return Err(AppError::Validation("Budget must be non-negative".into()));
    }
    if let Some(end) = new.end_date {
        if end < new.event_date {
            return Err(AppError::Validation(
                "End date cannot be before the event date".into(),
            ));
        }
    }
    if let Some(currency) = new.currency.as_deref() {
        validate_currency(currency)?;
    }
    Ok(())
}

pub(crate) fn validate_currency(currency: &str) -> AppResult<()> {
    if currency.len() != DEFAULT_CURRENCY.len()
        || !currency.chars().all(|c| c.is_ascii_uppercase())
    {
        return Err(AppError::Validation(format!(
            "Currency must be a three-letter code, got '{}'",
            currency
        )));
    }
    Ok(())
}

impl EventService {
    pub fn new(event_repo: Arc<EventRepository>, budget_repo: Arc<BudgetRepository>) -> Self {
        Self {
            event_repo,
            budget_repo,
        }
    }

    /// Create a new event
    pub async fn create_event(&self, new: NewEvent) -> AppResult<Event> {
        validate_new_event(&new)?;
        let event = self.event_repo.create(&new).await?;
        info!(event_id = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    /// Event with its transactions and budget breakdown
    pub async fn get_event(&self, id: Uuid) -> AppResult<EventDetail> {
        let summary = self
            .event_repo
            .find_summary(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

        let transactions = self.event_repo.transactions(id).await?;
        let budget_breakdown = self.budget_repo.lines_for_event(id).await?;

        Ok(EventDetail {
            profit: summary.profit,
            client_name: summary.client_name,
            event: summary.event,
            transactions,
            budget_breakdown,
        })
    }

    pub async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<EventSummary>> {
        Ok(self.event_repo.list(filter).await?)
    }

    /// Update descriptive fields only
    pub async fn update_event(&self, id: Uuid, update: EventUpdate) -> AppResult<Event> {
        if update.is_empty() {
            return Err(AppError::Validation("No fields to update".into()));
        }
        if let Some(name) = update.name.as_deref() {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Event name cannot be empty".into()));
            }
        }
        if update.budget.map_or(false, |b| b.is_sign_negative()) {
            return Err(AppError::Validation("Budget must be non-negative".into()));
        }
        if let Some(currency) = update.currency.as_deref() {
            validate_currency(currency)?;
        }

        let event = self
            .event_repo
            .update(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
        info!(event_id = %id, "event updated");
        Ok(event)
    }

    /// Delete an event that has no transactions
    pub async fn delete_event(&self, id: Uuid) -> AppResult<()> {
        self.event_repo.delete(id).await?;
        info!(event_id = %id, "event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn new_event() -> NewEvent {
        NewEvent {
            name: "Annual Gala".into(),
            description: None,
            client_id: None,
            event_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: None,
            venue: None,
            expected_attendees: Some(200),
            budget: Decimal::from(50_000_000),
            currency: None,
        }
    }

    #[test]
    fn test_validate_new_event() {
        assert!(validate_new_event(&new_event()).is_ok());

        let mut blank = new_event();
        blank.name = "   ".into();
        assert!(matches!(validate_new_event(&blank), Err(AppError::Validation(_))));

        let mut backwards = new_event();
        backwards.end_date = NaiveDate::from_ymd_opt(2024, 5, 31);
        assert!(validate_new_event(&backwards).is_err());

        let mut negative = new_event();
        negative.budget = Decimal::from(-1);
        assert!(validate_new_event(&negative).is_err());

        let mut currency = new_event();
        currency.currency = Some("usd".into());
        assert!(validate_new_event(&currency).is_err());
    }
}
