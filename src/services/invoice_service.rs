use crate::error::{AppError, AppResult};
use crate::ledger::percent_of;
use crate::models::{
    Invoice, InvoiceDetail, InvoiceFilter, InvoiceStats, InvoiceStatsRow, InvoiceStatus,
    InvoiceTotals, InvoiceUpdate, InvoiceView, NewInvoice, NewInvoiceItem,
};
use crate::repositories::InvoiceRepository;
use crate::services::event_service::validate_currency;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Invoice lifecycle: draft, sent, then paid (or overdue, or cancelled)
pub struct InvoiceService {
    invoice_repo: Arc<InvoiceRepository>,
}

fn validate_items(items: &[NewInvoiceItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::Validation("At least one item is required".into()));
    }
    for (i, item) in items.iter().enumerate() {
        let line = i + 1;
        if item.description.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Item {}: description is required",
                line
            )));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "Item {}: quantity must be positive",
                line
            )));
        }
        if item.unit_price <= Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "Item {}: unit price must be positive",
                line
            )));
        }
    }
    Ok(())
}

/// Tax rate as a percentage between 0 and 100, kept at two decimal places
fn normalize_tax_rate(rate: Decimal) -> AppResult<Decimal> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(AppError::Validation(
            "Tax rate must be between 0 and 100".into(),
        ));
    }
    Ok(rate.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn validate_new_invoice(new: &mut NewInvoice) -> AppResult<()> {
    validate_items(&new.items)?;
    new.tax_rate = normalize_tax_rate(new.tax_rate)?;
    if new.due_date < new.issue_date {
        return Err(AppError::Validation(
            "Due date cannot be before the issue date".into(),
        ));
    }
    if let Some(currency) = new.currency.as_deref() {
        validate_currency(currency)?;
    }
    Ok(())
}

fn validate_update(update: &mut InvoiceUpdate) -> AppResult<()> {
    if update.is_empty() {
        return Err(AppError::Validation("No fields to update".into()));
    }
    if let Some(items) = update.items.as_deref() {
        validate_items(items)?;
    }
    if let Some(rate) = update.tax_rate {
        update.tax_rate = Some(normalize_tax_rate(rate)?);
    }
    Ok(())
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Invoice {} not found", id))
}

pub fn build_stats(totals: InvoiceStatsRow) -> InvoiceStats {
    InvoiceStats {
        collection_rate: percent_of(totals.paid_amount, totals.total_amount),
        totals,
    }
}

impl InvoiceService {
    pub fn new(invoice_repo: Arc<InvoiceRepository>) -> Self {
        Self { invoice_repo }
    }

    pub async fn list_invoices(&self, filter: &InvoiceFilter) -> AppResult<Vec<InvoiceView>> {
        Ok(self.invoice_repo.list(filter).await?)
    }

    /// Invoice with its line items
    pub async fn get_invoice(&self, id: Uuid) -> AppResult<InvoiceDetail> {
        let invoice = self
            .invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let items = self.invoice_repo.items(id).await?;
        Ok(InvoiceDetail { invoice, items })
    }

    /// Create a draft invoice; amounts are derived from the items
    pub async fn create_invoice(&self, mut new: NewInvoice) -> AppResult<InvoiceDetail> {
        validate_new_invoice(&mut new)?;
        let totals = InvoiceTotals::compute(&new.items, new.tax_rate);
        let invoice = self.invoice_repo.create(&new, &totals).await?;
        info!(
            invoice_id = %invoice.id,
            number = %invoice.invoice_number,
            total = %invoice.total_amount,
            "invoice created"
        );
        self.get_invoice(invoice.id).await
    }

    pub async fn update_invoice(
        &self,
        id: Uuid,
        mut update: InvoiceUpdate,
    ) -> AppResult<InvoiceDetail> {
        validate_update(&mut update)?;
        let invoice = self.invoice_repo.update(id, &update).await?;
        info!(
            invoice_id = %id,
            status = %invoice.status,
            total = %invoice.total_amount,
            "invoice updated"
        );
        self.get_invoice(id).await
    }

    /// Delete an unpaid invoice
    pub async fn delete_invoice(&self, id: Uuid) -> AppResult<()> {
        self.invoice_repo.delete(id).await?;
        info!(invoice_id = %id, "invoice deleted");
        Ok(())
    }

    /// Draft to sent
    pub async fn send_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        let invoice = self
            .invoice_repo
            .transition(id, &[InvoiceStatus::Draft], InvoiceStatus::Sent)
            .await?;
        info!(invoice_id = %id, number = %invoice.invoice_number, "invoice sent");
        Ok(invoice)
    }

    /// Sent or overdue to paid
    pub async fn pay_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        let invoice = self
            .invoice_repo
            .transition(
                id,
                &[InvoiceStatus::Sent, InvoiceStatus::Overdue],
                InvoiceStatus::Paid,
            )
            .await?;
        info!(
            invoice_id = %id,
            number = %invoice.invoice_number,
            amount = %invoice.total_amount,
            "invoice paid"
        );
        Ok(invoice)
    }

    pub async fn stats(&self) -> AppResult<InvoiceStats> {
        Ok(build_stats(self.invoice_repo.stats().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_invoice() -> NewInvoice {
        NewInvoice {
            client_id: Uuid::new_v4(),
            event_id: None,
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            items: vec![NewInvoiceItem {
                description: "Venue rental".into(),
                quantity: Decimal::ONE,
                unit_price: Decimal::from(10_000_000),
            }],
            tax_rate: Decimal::new(11_005, 3),
            currency: None,
            notes: None,
        }
    }

    #[test]
    fn test_validate_new_invoice() {
        let mut ok = new_invoice();
        assert!(validate_new_invoice(&mut ok).is_ok());
        assert_eq!(ok.tax_rate, Decimal::new(1101, 2));

        let mut empty = new_invoice();
        empty.items.clear();
        assert!(matches!(validate_new_invoice(&mut empty), Err(AppError::Validation(_))));

        let mut free = new_invoice();
        free.items[0].unit_price = Decimal::ZERO;
        assert!(validate_new_invoice(&mut free).is_err());

        let mut taxed = new_invoice();
        taxed.tax_rate = Decimal::from(101);
        assert!(validate_new_invoice(&mut taxed).is_err());

        let mut backwards = new_invoice();
        backwards.due_date = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert!(validate_new_invoice(&mut backwards).is_err());

        let mut currency = new_invoice();
        currency.currency = Some("idr".into());
        assert!(validate_new_invoice(&mut currency).is_err());
    }

    #[test]
    fn test_empty_update_rejected() {
        let mut update = InvoiceUpdate::default();
        assert!(validate_update(&mut update).is_err());

        let mut items = InvoiceUpdate {
            items: Some(Vec::new()),
            ..Default::default()
        };
        assert!(validate_update(&mut items).is_err());
    }

    #[test]
    fn test_collection_rate() {
        let stats = build_stats(InvoiceStatsRow {
            total_invoices: 3,
            paid_invoices: 1,
            sent_invoices: 2,
            total_amount: Decimal::from(3_000_000),
            paid_amount: Decimal::from(1_000_000),
            outstanding_amount: Decimal::from(2_000_000),
            ..Default::default()
        });
        assert_eq!(stats.collection_rate, Decimal::new(3333, 2));

        let empty = build_stats(InvoiceStatsRow::default());
        assert_eq!(empty.collection_rate, Decimal::ZERO);
    }
}
