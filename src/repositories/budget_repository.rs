use crate::error::RepositoryError;
use crate::models::{
    BudgetCategory, EventBudget, EventBudgetLine, NewBudgetCategory, SetEventBudget,
    TransactionType,
};
use sqlx::PgPool;
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

/// Budget categories and per-event budget lines
pub struct BudgetRepository {
    pool: PgPool,
}

impl BudgetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_categories(
        &self,
        category_type: Option<TransactionType>,
    ) -> RepoResult<Vec<BudgetCategory>> {
        let categories = sqlx::query_as::<_, BudgetCategory>(
            r#"
            SELECT * FROM budget_categories
            WHERE $1::text IS NULL OR type = $1
            ORDER BY type, name
            "#,
        )
        .bind(category_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Insert a category; (name, type) pairs are unique
    pub async fn create_category(&self, new: &NewBudgetCategory) -> RepoResult<BudgetCategory> {
        let category = sqlx::query_as::<_, BudgetCategory>(
            r#"
            INSERT INTO budget_categories (name, type, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.category_type.as_str())
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    /// Insert or replace the budget line for (event, category)
    pub async fn upsert_event_budget(
        &self,
        event_id: Uuid,
        line: &SetEventBudget,
    ) -> RepoResult<EventBudget> {
        let budget = sqlx::query_as::<_, EventBudget>(
            r#"
            INSERT INTO event_budgets (event_id, category_id, budgeted_amount, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, category_id) DO UPDATE
            SET budgeted_amount = EXCLUDED.budgeted_amount,
                notes = EXCLUDED.notes,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(line.category_id)
        .bind(line.budgeted_amount)
        .bind(&line.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(budget)
    }

    /// Budget lines of one event joined with category names
    pub async fn lines_for_event(&self, event_id: Uuid) -> RepoResult<Vec<EventBudgetLine>> {
        let lines = sqlx::query_as::<_, EventBudgetLine>(
            r#"
            SELECT eb.category_id, bc.name AS category_name, bc.type AS category_type,
                   eb.budgeted_amount, eb.notes
            FROM event_budgets eb
            JOIN budget_categories bc ON eb.category_id = bc.id
            WHERE eb.event_id = $1
            ORDER BY bc.type, bc.name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
