use crate::error::RepositoryError;
use crate::models::{
    Invoice, InvoiceFilter, InvoiceItem, InvoiceStatsRow, InvoiceStatus, InvoiceTotals,
    InvoiceUpdate, InvoiceView, NewInvoice, NewInvoiceItem, OutstandingInvoices,
    DEFAULT_CURRENCY,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

const VIEW_SELECT: &str = r#"
    SELECT i.*, c.name AS client_name, e.name AS event_name,
           CASE WHEN i.status = 'overdue' THEN GREATEST(CURRENT_DATE - i.due_date, 0)
                ELSE 0 END AS days_overdue
    FROM invoices i
    JOIN clients c ON i.client_id = c.id
    LEFT JOIN events e ON i.event_id = e.id
"#;

/// Repository for invoices and their line items. Every write that touches
/// items or amounts runs in one database transaction.
pub struct InvoiceRepository {
    pool: PgPool,
}

fn not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("Invoice {} not found", id))
}

fn status_of(invoice: &Invoice) -> RepoResult<InvoiceStatus> {
    invoice.status_enum().ok_or_else(|| {
        RepositoryError::InvalidInput(format!("Unknown invoice status: {}", invoice.status))
    })
}

async fn lock_invoice(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> RepoResult<Invoice> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    invoice_id: Uuid,
    items: &[NewInvoiceItem],
) -> RepoResult<()> {
    for (line_no, item) in (1_i32..).zip(items) {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                invoice_id, line_no, description, quantity, unit_price, total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(invoice_id)
        .bind(line_no)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

impl InvoiceRepository {
    /// Create a new InvoiceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a draft invoice and its items under the next `INV-` number
    pub async fn create(&self, new: &NewInvoice, totals: &InvoiceTotals) -> RepoResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let client: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM clients WHERE id = $1")
            .bind(new.client_id)
            .fetch_optional(&mut *tx)
            .await?;
        if client.is_none() {
            return Err(RepositoryError::NotFound(format!(
                "Client {} not found",
                new.client_id
            )));
        }

        if let Some(event_id) = new.event_id {
            let event: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
            if event.is_none() {
                return Err(RepositoryError::NotFound(format!("Event {} not found", event_id)));
            }
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_number, event_id, client_id, issue_date, due_date,
                subtotal, tax_rate, tax_amount, total_amount, currency, notes
            )
            VALUES (
                'INV-' || LPAD(nextval('invoice_number_seq')::text, 6, '0'),
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            RETURNING *
            "#,
        )
        .bind(new.event_id)
        .bind(new.client_id)
        .bind(new.issue_date)
        .bind(new.due_date)
        .bind(totals.subtotal)
        .bind(new.tax_rate)
        .bind(totals.tax_amount)
        .bind(totals.total_amount)
        .bind(new.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await?;

        insert_items(&mut tx, invoice.id, &new.items).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    /// Invoice with client and event names
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<InvoiceView>> {
        let sql = format!("{} WHERE i.id = $1", VIEW_SELECT);
        let view = sqlx::query_as::<_, InvoiceView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(view)
    }

    /// Line items in entry order
    pub async fn items(&self, invoice_id: Uuid) -> RepoResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            "SELECT * FROM invoice_items WHERE invoice_id = $1 ORDER BY line_no",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Invoices matching `filter`, newest first
    pub async fn list(&self, filter: &InvoiceFilter) -> RepoResult<Vec<InvoiceView>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(VIEW_SELECT);
        qb.push(" WHERE 1 = 1");

        if let Some(status) = filter.status {
            qb.push(" AND i.status = ").push_bind(status.as_str());
        }
        if let Some(client_id) = filter.client_id {
            qb.push(" AND i.client_id = ").push_bind(client_id);
        }
        if let Some(event_id) = filter.event_id {
            qb.push(" AND i.event_id = ").push_bind(event_id);
        }
        if let Some(start) = filter.start_date {
            qb.push(" AND i.issue_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND i.issue_date <= ").push_bind(end);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            qb.push(" AND (i.invoice_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY i.created_at DESC, i.invoice_number DESC");

        let invoices = qb
            .build_query_as::<InvoiceView>()
            .fetch_all(&self.pool)
            .await?;
        Ok(invoices)
    }

    /// Apply `update` under a row lock and recompute the amounts.
    ///
    /// Supplied items replace the stored ones. A tax rate change alone
    /// recomputes from the stored subtotal. Paid and cancelled invoices only
    /// accept a no-op status.
    pub async fn update(&self, id: Uuid, update: &InvoiceUpdate) -> RepoResult<Invoice> {
        let mut tx = self.pool.begin().await?;
        let current = lock_invoice(&mut tx, id).await?;
        let status = status_of(&current)?;

        if update.edits_content() && status.is_closed() {
            return Err(RepositoryError::BusinessRule(format!(
                "Invoice {} is {} and cannot be edited",
                current.invoice_number,
                status.as_str()
            )));
        }
        let next_status = update.status.unwrap_or(status);
        if !status.can_transition_to(next_status) {
            return Err(RepositoryError::BusinessRule(format!(
                "Invoice {} cannot move from {} to {}",
                current.invoice_number,
                status.as_str(),
                next_status.as_str()
            )));
        }

        let issue_date = update.issue_date.unwrap_or(current.issue_date);
        let due_date = update.due_date.unwrap_or(current.due_date);
        if due_date < issue_date {
            return Err(RepositoryError::InvalidInput(
                "Due date cannot be before the issue date".into(),
            ));
        }

        let tax_rate = update.tax_rate.unwrap_or(current.tax_rate);
        let totals = match update.items.as_deref() {
            Some(items) => {
                sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_items(&mut tx, id, items).await?;
                InvoiceTotals::compute(items, tax_rate)
            }
            None => InvoiceTotals::from_subtotal(current.subtotal, tax_rate),
        };

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET issue_date = $2,
                due_date = $3,
                tax_rate = $4,
                subtotal = $5,
                tax_amount = $6,
                total_amount = $7,
                notes = COALESCE($8, notes),
                status = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(issue_date)
        .bind(due_date)
        .bind(tax_rate)
        .bind(totals.subtotal)
        .bind(totals.tax_amount)
        .bind(totals.total_amount)
        .bind(&update.notes)
        .bind(next_status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Move an invoice to `to` when its current status is one of `from`
    pub async fn transition(
        &self,
        id: Uuid,
        from: &[InvoiceStatus],
        to: InvoiceStatus,
    ) -> RepoResult<Invoice> {
        let mut tx = self.pool.begin().await?;
        let current = lock_invoice(&mut tx, id).await?;
        let status = status_of(&current)?;

        if !from.contains(&status) {
            return Err(RepositoryError::BusinessRule(format!(
                "Invoice {} is {} and cannot be marked {}",
                current.invoice_number,
                status.as_str(),
                to.as_str()
            )));
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            "UPDATE invoices SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(to.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Delete an invoice and its items. Paid invoices are kept.
    pub async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        let current = lock_invoice(&mut tx, id).await?;

        if status_of(&current)? == InvoiceStatus::Paid {
            return Err(RepositoryError::BusinessRule(format!(
                "Cannot delete paid invoice {}",
                current.invoice_number
            )));
        }

        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Counts per status and billed, paid and outstanding amounts
    pub async fn stats(&self) -> RepoResult<InvoiceStatsRow> {
        let row = sqlx::query_as::<_, InvoiceStatsRow>(
            r#"
            SELECT
                COUNT(*) AS total_invoices,
                COUNT(*) FILTER (WHERE status = 'draft') AS draft_invoices,
                COUNT(*) FILTER (WHERE status = 'sent') AS sent_invoices,
                COUNT(*) FILTER (WHERE status = 'paid') AS paid_invoices,
                COUNT(*) FILTER (WHERE status = 'overdue') AS overdue_invoices,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled_invoices,
                COALESCE(SUM(total_amount) FILTER (WHERE status <> 'cancelled'), 0)
                    AS total_amount,
                COALESCE(SUM(total_amount) FILTER (WHERE status = 'paid'), 0) AS paid_amount,
                COALESCE(SUM(total_amount) FILTER (WHERE status IN ('sent', 'overdue')), 0)
                    AS outstanding_amount
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Sent and overdue invoices awaiting payment
    pub async fn outstanding(&self) -> RepoResult<OutstandingInvoices> {
        let row = sqlx::query_as::<_, OutstandingInvoices>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(total_amount), 0) AS amount
            FROM invoices
            WHERE status IN ('sent', 'overdue')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
