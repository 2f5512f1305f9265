use async_trait::async_trait;
use sqlx::PgPool;

use super::{search_term, Contact, ContactPayload};
use crate::error::AppError;

/// CRUD over the contact collection
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// # Errors
    /// A duplicate email is a unique-constraint violation.
    async fn create(&self, contact: ContactPayload) -> Result<Contact, AppError>;

    /// All contacts, or those matching `search` on first name, last name
    /// or email (case-insensitive substring).
    async fn list(&self, search: Option<&str>) -> Result<Vec<Contact>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<Contact>, AppError>;

    /// Replace every field of contact `id`. `None` when it does not exist.
    async fn update(&self, id: i64, contact: ContactPayload) -> Result<Option<Contact>, AppError>;

    /// Remove contact `id`, returning what was removed.
    async fn delete(&self, id: i64) -> Result<Option<Contact>, AppError>;
}

pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn create(&self, contact: ContactPayload) -> Result<Contact, AppError> {
        let created = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (first_name, last_name, email, phone_number, birth_date, additional_data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, last_name, email, phone_number, birth_date, additional_data
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(contact.birth_date)
        .bind(&contact.additional_data)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Contact>, AppError> {
        let contacts = match search_term(search) {
            Some(search) => {
                sqlx::query_as::<_, Contact>(
                    r#"
                    SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data
                    FROM contacts
                    WHERE first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1
                    ORDER BY id
                    "#,
                )
                .bind(like_pattern(search))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Contact>(
                    r#"
                    SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data
                    FROM contacts
                    ORDER BY id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(contacts)
    }

    async fn get(&self, id: i64) -> Result<Option<Contact>, AppError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, first_name, last_name, email, phone_number, birth_date, additional_data
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contact)
    }

    async fn update(&self, id: i64, contact: ContactPayload) -> Result<Option<Contact>, AppError> {
        let updated = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET first_name = $1, last_name = $2, email = $3, phone_number = $4,
                birth_date = $5, additional_data = $6
            WHERE id = $7
            RETURNING id, first_name, last_name, email, phone_number, birth_date, additional_data
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.phone_number)
        .bind(contact.birth_date)
        .bind(&contact.additional_data)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<Option<Contact>, AppError> {
        let deleted = sqlx::query_as::<_, Contact>(
            r#"
            DELETE FROM contacts
            WHERE id = $1
            RETURNING id, first_name, last_name, email, phone_number, birth_date, additional_data
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }
}
