use crate::error::RepositoryError;
use crate::models::client::DEFAULT_PAYMENT_TERMS;
use crate::models::{Client, ClientUpdate, NewClient};
use sqlx::PgPool;
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

/// Repository for client data access
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Create a new ClientRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewClient) -> RepoResult<Client> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                name, email, phone, address, company, contact_person,
                credit_limit, payment_terms, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.company)
        .bind(&new.contact_person)
        .bind(new.credit_limit)
        .bind(new.payment_terms.unwrap_or(DEFAULT_PAYMENT_TERMS))
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(client)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    /// All clients by name, optionally matching `search` on name, company or email
    pub async fn list(&self, search: Option<&str>) -> RepoResult<Vec<Client>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE $1::text IS NULL
               OR name ILIKE $1
               OR company ILIKE $1
               OR email ILIKE $1
            ORDER BY name ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn update(&self, id: Uuid, update: &ClientUpdate) -> RepoResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                company = COALESCE($6, company),
                contact_person = COALESCE($7, contact_person),
                credit_limit = COALESCE($8, credit_limit),
                payment_terms = COALESCE($9, payment_terms),
                notes = COALESCE($10, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.company)
        .bind(&update.contact_person)
        .bind(update.credit_limit)
        .bind(update.payment_terms)
        .bind(&update.notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// Delete a client; a foreign key violation surfaces as `ConstraintViolation`
    pub async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Client {} not found", id)));
        }
        Ok(())
    }
}
