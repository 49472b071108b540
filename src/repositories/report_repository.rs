use crate::error::RepositoryError;
use crate::models::report::{
    BudgetLineActualRow, CategoryTotalRow, EventProfitRow, EventWindowRow, Granularity,
    LedgerWindowRow, PeriodTotalsRow, ProfitabilityQuery,
};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

/// Date and event bounds applied to completed-transaction aggregates
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub event_id: Option<Uuid>,
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, window: &LedgerWindow) {
    qb.push(" WHERE t.status = 'completed'");
    if let Some(start) = window.start_date {
        qb.push(" AND t.transaction_date >= ").push_bind(start);
    }
    if let Some(end) = window.end_date {
        qb.push(" AND t.transaction_date <= ").push_bind(end);
    }
    if let Some(event_id) = window.event_id {
        qb.push(" AND t.event_id = ").push_bind(event_id);
    }
}

/// Aggregate queries behind the reports and the dashboard.
/// Every ledger aggregate counts `completed` transactions only.
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Totals per (type, category), largest first within each type
    pub async fn category_totals(&self, window: &LedgerWindow) -> RepoResult<Vec<CategoryTotalRow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT t.type, t.category, SUM(t.amount) AS total_amount, \
             COUNT(t.id) AS transaction_count FROM transactions t",
        );
        push_window(&mut qb, window);
        qb.push(" GROUP BY t.type, t.category ORDER BY t.type, total_amount DESC");

        let rows = qb
            .build_query_as::<CategoryTotalRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Income and expense per date bucket, oldest first
    pub async fn period_totals(
        &self,
        granularity: Granularity,
        window: &LedgerWindow,
    ) -> RepoResult<Vec<PeriodTotalsRow>> {
        // The unit comes from a closed enum, so it is safe to inline
        let bucket = format!("DATE_TRUNC('{}', t.transaction_date)", granularity.trunc_unit());

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            r#"
            SELECT
                {bucket}::date AS period,
                COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount ELSE 0 END), 0) AS cash_in,
                COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount ELSE 0 END), 0) AS cash_out,
                COUNT(CASE WHEN t.type = 'income' THEN 1 END) AS income_count,
                COUNT(CASE WHEN t.type = 'expense' THEN 1 END) AS expense_count
            FROM transactions t
            "#,
            bucket = bucket
        ));
        push_window(&mut qb, window);
        qb.push(format!(" GROUP BY {} ORDER BY period ASC", bucket));

        let rows = qb
            .build_query_as::<PeriodTotalsRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Budgeted and actual amounts per category for one event.
    /// Categories with neither a budget line nor completed spend are omitted.
    pub async fn budget_lines(&self, event_id: Uuid) -> RepoResult<Vec<BudgetLineActualRow>> {
        let rows = sqlx::query_as::<_, BudgetLineActualRow>(
            r#"
            SELECT
                bc.name AS category_name,
                bc.type AS category_type,
                eb.budgeted_amount,
                COALESCE(SUM(t.amount), 0) AS actual_amount
            FROM budget_categories bc
            LEFT JOIN event_budgets eb
                   ON eb.category_id = bc.id AND eb.event_id = $1
            LEFT JOIN transactions t
                   ON t.event_id = $1
                  AND t.category = bc.name
                  AND t.type = bc.type
                  AND t.status = 'completed'
            GROUP BY bc.id, bc.name, bc.type, eb.budgeted_amount
            HAVING eb.budgeted_amount IS NOT NULL OR COALESCE(SUM(t.amount), 0) > 0
            ORDER BY bc.type, bc.name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Per-event revenue, expense and counterparty counts
    pub async fn event_profit_rows(
        &self,
        query: &ProfitabilityQuery,
    ) -> RepoResult<Vec<EventProfitRow>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                e.id, e.name, e.event_date, e.status, e.budget,
                COALESCE(SUM(CASE WHEN t.type = 'income' AND t.status = 'completed' THEN t.amount ELSE 0 END), 0) AS total_revenue,
                COALESCE(SUM(CASE WHEN t.type = 'expense' AND t.status = 'completed' THEN t.amount ELSE 0 END), 0) AS total_expenses,
                COUNT(CASE WHEN t.type = 'income' AND t.status = 'completed' THEN 1 END) AS revenue_transactions,
                COUNT(CASE WHEN t.type = 'expense' AND t.status = 'completed' THEN 1 END) AS expense_transactions,
                COUNT(DISTINCT t.client_id) AS unique_clients,
                COUNT(DISTINCT t.vendor_id) AS unique_vendors
            FROM events e
            LEFT JOIN transactions t ON e.id = t.event_id
            WHERE 1 = 1
            "#,
        );
        if let Some(start) = query.start_date {
            qb.push(" AND e.event_date >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            qb.push(" AND e.event_date <= ").push_bind(end);
        }
        if let Some(status) = query.status {
            qb.push(" AND e.status = ").push_bind(status.as_str());
        }
        qb.push(" GROUP BY e.id, e.name, e.event_date, e.status, e.budget ORDER BY e.event_date DESC");

        let rows = qb
            .build_query_as::<EventProfitRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Completed ledger totals since `since`
    pub async fn ledger_since(&self, since: NaiveDate) -> RepoResult<LedgerWindowRow> {
        let row = sqlx::query_as::<_, LedgerWindowRow>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0) AS revenue,
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0) AS expenses,
                COUNT(DISTINCT event_id) AS active_events,
                AVG(CASE WHEN type = 'income' THEN amount END) AS avg_revenue_per_transaction,
                AVG(CASE WHEN type = 'expense' THEN amount END) AS avg_expense_per_transaction
            FROM transactions
            WHERE status = 'completed' AND transaction_date >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Event outcome counts for events created since `since`
    pub async fn events_since(&self, since: NaiveDate) -> RepoResult<EventWindowRow> {
        let row = sqlx::query_as::<_, EventWindowRow>(
            r#"
            SELECT
                COUNT(*) AS total_events,
                COUNT(CASE WHEN status = 'completed' THEN 1 END) AS completed_events,
                COUNT(CASE WHEN status = 'cancelled' THEN 1 END) AS cancelled_events,
                AVG(CASE WHEN status = 'completed' THEN revenue - actual_cost END) AS avg_profit_per_event
            FROM events
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
