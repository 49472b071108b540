use crate::error::RepositoryError;
use crate::models::client::DEFAULT_PAYMENT_TERMS;
use crate::models::{NewVendor, Vendor, VendorFilter, VendorUpdate};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

type RepoResult<T> = Result<T, RepositoryError>;

/// Repository for vendor data access
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    /// Create a new VendorRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewVendor) -> RepoResult<Vendor> {
        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (
                company_name, contact_person, email, phone, address, city, country,
                service_category, rating, payment_terms, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&new.company_name)
        .bind(&new.contact_person)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.country)
        .bind(&new.service_category)
        .bind(new.rating)
        .bind(new.payment_terms.unwrap_or(DEFAULT_PAYMENT_TERMS))
        .bind(new.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;
        Ok(vendor)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vendor)
    }

    pub async fn list(&self, filter: &VendorFilter) -> RepoResult<Vec<Vendor>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM vendors WHERE 1 = 1");

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            qb.push(" AND (company_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR contact_person ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = filter.service_category.clone() {
            qb.push(" AND service_category = ").push_bind(category);
        }
        if let Some(active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(active);
        }
        qb.push(" ORDER BY company_name ASC");

        let vendors = qb.build_query_as::<Vendor>().fetch_all(&self.pool).await?;
        Ok(vendors)
    }

    pub async fn update(&self, id: Uuid, update: &VendorUpdate) -> RepoResult<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>(
            r#"
            UPDATE vendors
            SET company_name = COALESCE($2, company_name),
                contact_person = COALESCE($3, contact_person),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                country = COALESCE($8, country),
                service_category = COALESCE($9, service_category),
                rating = COALESCE($10, rating),
                payment_terms = COALESCE($11, payment_terms),
                is_active = COALESCE($12, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.company_name)
        .bind(&update.contact_person)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.city)
        .bind(&update.country)
        .bind(&update.service_category)
        .bind(update.rating)
        .bind(update.payment_terms)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vendor)
    }

    pub async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Vendor {} not found", id)));
        }
        Ok(())
    }
}
