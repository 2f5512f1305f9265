use contacts_api::auth::SessionIssuer;
use contacts_api::configuration::get_configuration;
use contacts_api::contacts::PgContactStore;
use contacts_api::email_client::EmailClient;
use contacts_api::startup::run;
use contacts_api::telemetry::init_telemetry;
use contacts_api::users::PgUserStore;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

fn startup_error(kind: std::io::ErrorKind, message: &str) -> std::io::Error {
    std::io::Error::new(kind, message.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    tracing::info!("Configuration loaded successfully");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to migrate the database: {}", e);
        startup_error(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Database ready");

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let contacts = Arc::new(PgContactStore::new(pool));

    let issuer = SessionIssuer::from_settings(&configuration.jwt, users.clone()).map_err(|e| {
        tracing::error!("Invalid JWT settings: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;

    let email_client = EmailClient::from_settings(&configuration.email_client).map_err(|e| {
        tracing::error!("Invalid email client settings: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Email client configuration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        users,
        contacts,
        issuer,
        email_client,
        configuration.application.base_url.clone(),
    )?;

    server.await
}
