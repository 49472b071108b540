use crate::error::RepositoryError;
use crate::models::{TransactionFilter, TransactionList, TransactionSummary, TransactionView};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

const VIEW_SELECT: &str = r#"
    SELECT t.*, e.name AS event_name, COALESCE(c.name, v.company_name) AS entity_name
    FROM transactions t
    LEFT JOIN events e ON t.event_id = e.id
    LEFT JOIN clients c ON t.client_id = c.id
    LEFT JOIN vendors v ON t.vendor_id = v.id
"#;

/// Read side of the ledger. Writes go through [`crate::ledger::LedgerUnit`].
pub struct TransactionRepository {
    pool: PgPool,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(tx_type) = filter.transaction_type {
        qb.push(" AND t.type = ").push_bind(tx_type.as_str());
    }
    if let Some(event_id) = filter.event_id {
        qb.push(" AND t.event_id = ").push_bind(event_id);
    }
    if let Some(category) = filter.category.clone() {
        qb.push(" AND t.category = ").push_bind(category);
    }
    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status.as_str());
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND t.transaction_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND t.transaction_date <= ").push_bind(end);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (t.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.reference_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

impl TransactionRepository {
    /// Create a new TransactionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Filtered listing plus totals over the same filter
    pub async fn list(&self, filter: &TransactionFilter) -> RepoResult<TransactionList> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(VIEW_SELECT);
        push_filters(&mut qb, filter);
        qb.push(format!(
            " ORDER BY t.{} {}, t.created_at DESC",
            filter.sort_by.column(),
            filter.sort_order.as_sql()
        ));
        let transactions = qb
            .build_query_as::<TransactionView>()
            .fetch_all(&self.pool)
            .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount ELSE 0 END), 0) AS total_income,
                COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount ELSE 0 END), 0) AS total_expenses,
                COUNT(CASE WHEN t.type = 'income' THEN 1 END) AS income_count,
                COUNT(CASE WHEN t.type = 'expense' THEN 1 END) AS expense_count
            FROM transactions t
            "#,
        );
        push_filters(&mut qb, filter);
        let summary = qb
            .build_query_as::<TransactionSummary>()
            .fetch_one(&self.pool)
            .await?;

        Ok(TransactionList {
            transactions,
            summary,
        })
    }

    /// Find a transaction with its event and counterparty names
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TransactionView>> {
        let sql = format!("{} WHERE t.id = $1", VIEW_SELECT);
        let row = sqlx::query_as::<_, TransactionView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Most recently recorded transactions
    pub async fn recent(&self, limit: i64) -> RepoResult<Vec<TransactionView>> {
        let sql = format!("{} ORDER BY t.created_at DESC LIMIT $1", VIEW_SELECT);
        let rows = sqlx::query_as::<_, TransactionView>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Distinct categories in use, alphabetical
    pub async fn categories(&self) -> RepoResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM transactions ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }
}
