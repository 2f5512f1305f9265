use config::{ConfigError, Environment, File};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub email_client: EmailClientSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public URL used to build links in outgoing emails
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings
///
/// `secret` and `algorithm` normally come from `SECRET_KEY` and `ALGORITHM`.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: String,
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Loads settings from, in increasing priority:
/// 1. built-in defaults
/// 2. an optional `configuration.{yaml,toml,json}` file
/// 3. `APP_`-prefixed variables, `__` separating sections (`APP_DATABASE__HOST`)
/// 4. `SECRET_KEY` / `ALGORITHM`
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("application.base_url", "http://127.0.0.1:8000")?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432)?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "password")?
        .set_default("database.database_name", "contacts")?
        .set_default("jwt.access_token_expire_minutes", 30)?
        .set_default("email_client.base_url", "http://localhost:8025")?
        .set_default("email_client.sender_email", "no-reply@example.com")?
        .set_default("email_client.authorization_token", "")?
        .set_default("email_client.timeout_milliseconds", 10_000)?
        .add_source(File::with_name("configuration").required(false))
        .add_source(Environment::with_prefix("APP").prefix_separator("_").separator("__"))
        .set_override_option("jwt.secret", std::env::var("SECRET_KEY").ok())?
        .set_override_option("jwt.algorithm", std::env::var("ALGORITHM").ok())?
        .build()?;
    settings.try_deserialize::<Settings>()
}
