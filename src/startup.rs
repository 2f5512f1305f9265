use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionIssuer;
use crate::contacts::ContactStore;
use crate::email_client::EmailClient;
use crate::logger::RequestLogger;
use crate::middleware::AuthMiddleware;
use crate::routes::{
    create_contact, current_user, delete_contact, get_contact, health_check, index,
    list_contacts, login, refresh, register, update_contact, upcoming_birthdays, verify_email,
};
use crate::users::UserStore;

/// Public base URL of the service, used in verification links
#[derive(Clone, Debug)]
pub struct ApplicationBaseUrl(pub String);

pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserStore>,
    contacts: Arc<dyn ContactStore>,
    issuer: SessionIssuer,
    email_client: EmailClient,
    base_url: String,
) -> Result<Server, std::io::Error> {
    let users = web::Data::from(users);
    let contacts = web::Data::from(contacts);
    let issuer_data = web::Data::new(issuer.clone());
    let email_client = web::Data::new(email_client);
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(users.clone())
            .app_data(contacts.clone())
            .app_data(issuer_data.clone())
            .app_data(email_client.clone())
            .app_data(base_url.clone())

            // Public routes
            .route("/", web::get().to(index))
            .route("/health_check", web::get().to(health_check))
            .route("/token", web::post().to(login))
            .route("/refresh-token", web::post().to(refresh))
            .route("/register", web::post().to(register))
            .route("/verify/{username}/{token}", web::get().to(verify_email))

            // Protected routes (bearer token required)
            .service(
                web::scope("/users")
                    .wrap(AuthMiddleware::new(issuer.clone()))
                    .route("/me", web::get().to(current_user)),
            )
            .service(
                web::scope("/contacts")
                    .wrap(AuthMiddleware::new(issuer.clone()))
                    .route("", web::post().to(create_contact))
                    .route("", web::get().to(list_contacts))
                    .route("/birthdays", web::get().to(upcoming_birthdays))
                    .route("/{id}", web::get().to(get_contact))
                    .route("/{id}", web::put().to(update_contact))
                    .route("/{id}", web::delete().to(delete_contact)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
