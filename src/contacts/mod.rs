/// Contact records
///
/// The persisted contact collection, the payload accepted for create and
/// update, and the upcoming-birthday filter.

mod birthdays;
mod store;

pub use birthdays::{next_birthday, upcoming_birthdays, BIRTHDAY_WINDOW_DAYS};
pub use store::{ContactStore, PgContactStore};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validators::{
    is_valid_birth_date, is_valid_email, is_valid_name, is_valid_notes, is_valid_phone,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    pub additional_data: Option<String>,
}

/// Fields accepted when creating or replacing a contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub additional_data: Option<String>,
}

impl ContactPayload {
    /// Validate every field and return the normalized payload.
    pub fn validate(self, today: NaiveDate) -> Result<Self, ValidationError> {
        Ok(Self {
            first_name: is_valid_name("first_name", &self.first_name)?,
            last_name: is_valid_name("last_name", &self.last_name)?,
            email: is_valid_email(&self.email)?,
            phone_number: is_valid_phone(&self.phone_number)?,
            birth_date: is_valid_birth_date(self.birth_date, today)?,
            additional_data: is_valid_notes(self.additional_data.as_deref())?,
        })
    }

    pub fn into_contact(self, id: i64) -> Contact {
        Contact {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            birth_date: self.birth_date,
            additional_data: self.additional_data,
        }
    }
}

/// Trimmed search term; a blank one means no filter.
pub fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

impl Contact {
    /// Case-insensitive substring match on first name, last name or email.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.first_name, &self.last_name, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}
