mod auth;
mod contacts;
mod health_check;
mod registration;

pub use auth::{current_user, login, refresh};
pub use contacts::{
    create_contact, delete_contact, get_contact, list_contacts, update_contact,
    upcoming_birthdays,
};
pub use health_check::{health_check, index};
pub use registration::{register, verify_email};
