pub mod auth;
pub mod configuration;
pub mod contacts;
pub mod email_client;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod users;
pub mod validators;
pub mod verification_token;
