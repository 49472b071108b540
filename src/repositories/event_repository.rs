use crate::error::RepositoryError;
use crate::models::{
    Event, EventFilter, EventStatus, EventSummary, EventUpdate, NewEvent, Transaction,
    DEFAULT_CURRENCY,
};
use crate::models::report::{StatusCount, TopEvent};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

/// Repository for event metadata. The financial columns are read here but
/// only ever written by the ledger.
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new EventRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event in `planning` with zeroed financials
    pub async fn create(&self, new: &NewEvent) -> RepoResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                name, description, client_id, event_date, end_date, venue,
                expected_attendees, budget, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.client_id)
        .bind(new.event_date)
        .bind(new.end_date)
        .bind(&new.venue)
        .bind(new.expected_attendees)
        .bind(new.budget)
        .bind(new.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find an event by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    /// Find an event with its client name
    pub async fn find_summary(&self, id: Uuid) -> RepoResult<Option<EventSummary>> {
        let summary = sqlx::query_as::<_, EventSummary>(
            r#"
            SELECT e.*, c.name AS client_name
            FROM events e
            LEFT JOIN clients c ON e.client_id = c.id
            WHERE e.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(summary)
    }

    /// List events matching `filter`
    pub async fn list(&self, filter: &EventFilter) -> RepoResult<Vec<EventSummary>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT e.*, c.name AS client_name FROM events e \
             LEFT JOIN clients c ON e.client_id = c.id WHERE 1 = 1",
        );

        if let Some(status) = filter.status {
            qb.push(" AND e.status = ").push_bind(status.as_str());
        }
        if let Some(client_id) = filter.client_id {
            qb.push(" AND e.client_id = ").push_bind(client_id);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            qb.push(" AND (e.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(start) = filter.start_date {
            qb.push(" AND e.event_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND e.event_date <= ").push_bind(end);
        }

        // Column and direction come from whitelisted enums
        qb.push(format!(
            " ORDER BY e.{} {}",
            filter.sort_by.column(),
            filter.sort_order.as_sql()
        ));

        let events = qb
            .build_query_as::<EventSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    /// Update descriptive fields; `None` keeps the stored value
    pub async fn update(&self, id: Uuid, update: &EventUpdate) -> RepoResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                client_id = COALESCE($4, client_id),
                event_date = COALESCE($5, event_date),
                end_date = COALESCE($6, end_date),
                venue = COALESCE($7, venue),
                expected_attendees = COALESCE($8, expected_attendees),
                status = COALESCE($9, status),
                budget = COALESCE($10, budget),
                currency = COALESCE($11, currency),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.client_id)
        .bind(update.event_date)
        .bind(update.end_date)
        .bind(&update.venue)
        .bind(update.expected_attendees)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.budget)
        .bind(&update.currency)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    /// Delete an event. Refused while any transaction references it.
    ///
    /// The event row is locked first, the same lock a ledger write takes, so
    /// no transaction can be attached between the check and the delete.
    pub async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound(format!("Event {} not found", id)));
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE event_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if count > 0 {
            return Err(RepositoryError::BusinessRule(format!(
                "Cannot delete event with {} existing transactions",
                count
            )));
        }

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Ledger entries of one event, newest first
    pub async fn transactions(&self, event_id: Uuid) -> RepoResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE event_id = $1
            ORDER BY transaction_date DESC, created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Planning or confirmed events dated between `from` and `until`
    pub async fn upcoming(
        &self,
        from: NaiveDate,
        until: NaiveDate,
        limit: i64,
    ) -> RepoResult<Vec<EventSummary>> {
        let rows = sqlx::query_as::<_, EventSummary>(
            r#"
            SELECT e.*, c.name AS client_name
            FROM events e
            LEFT JOIN clients c ON e.client_id = c.id
            WHERE e.event_date BETWEEN $1 AND $2
              AND e.status IN ($3, $4)
            ORDER BY e.event_date ASC
            LIMIT $5
            "#,
        )
        .bind(from)
        .bind(until)
        .bind(EventStatus::Planning.as_str())
        .bind(EventStatus::Confirmed.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Completed events with revenue, highest profit first
    pub async fn top_by_profit(&self, limit: i64) -> RepoResult<Vec<TopEvent>> {
        let rows = sqlx::query_as::<_, TopEvent>(
            r#"
            SELECT id, name, revenue, actual_cost,
                   (revenue - actual_cost) AS profit, profit_margin
            FROM events
            WHERE status = $1 AND revenue > 0
            ORDER BY (revenue - actual_cost) DESC
            LIMIT $2
            "#,
        )
        .bind(EventStatus::Completed.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Event count per status
    pub async fn count_by_status(&self) -> RepoResult<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM events GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
