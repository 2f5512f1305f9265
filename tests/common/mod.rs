#![allow(dead_code)]

//! Shared harness: the real server on a random port, backed by in-memory
//! stores, plus a stub email API that records what it is sent.

use actix_web::{web, App, HttpResponse, HttpServer};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use contacts_api::auth::{SessionIssuer, TokenCodec};
use contacts_api::contacts::{search_term, Contact, ContactPayload, ContactStore};
use contacts_api::email_client::{EmailClient, SenderEmail};
use contacts_api::error::{AppError, DatabaseError};
use contacts_api::startup::run;
use contacts_api::users::{NewUser, User, UserStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-key-32-chars!";
pub const TEST_ALGORITHM: &str = "HS256";

// ---------------------------------------------------------------------------
// In-memory stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<BTreeMap<String, User>>,
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.username) || users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation("users".to_string()).into());
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            verification_token_hash: Some(user.verification_token_hash),
            is_verified: false,
            created_at: Utc::now(),
        };
        users.insert(created.username.clone(), created.clone());
        Ok(created)
    }

    async fn mark_verified(&self, username: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(username)
            .ok_or_else(|| AppError::not_found("User"))?;
        user.is_verified = true;
        user.verification_token_hash = None;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryContacts {
    contacts: Mutex<BTreeMap<i64, Contact>>,
    next_id: Mutex<i64>,
}

impl InMemoryContacts {
    fn email_taken(contacts: &BTreeMap<i64, Contact>, email: &str, except: Option<i64>) -> bool {
        contacts
            .values()
            .any(|c| c.email == email && Some(c.id) != except)
    }
}

#[async_trait]
impl ContactStore for InMemoryContacts {
    async fn create(&self, contact: ContactPayload) -> Result<Contact, AppError> {
        let mut contacts = self.contacts.lock().unwrap();
        if Self::email_taken(&contacts, &contact.email, None) {
            return Err(DatabaseError::UniqueConstraintViolation("contacts".to_string()).into());
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let created = contact.into_contact(*next_id);
        contacts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Contact>, AppError> {
        let contacts = self.contacts.lock().unwrap();
        let search = search_term(search);
        Ok(contacts
            .values()
            .filter(|c| search.map_or(true, |q| c.matches_search(q)))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Contact>, AppError> {
        Ok(self.contacts.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, id: i64, contact: ContactPayload) -> Result<Option<Contact>, AppError> {
        let mut contacts = self.contacts.lock().unwrap();
        if !contacts.contains_key(&id) {
            return Ok(None);
        }
        if Self::email_taken(&contacts, &contact.email, Some(id)) {
            return Err(DatabaseError::UniqueConstraintViolation("contacts".to_string()).into());
        }

        let updated = contact.into_contact(id);
        contacts.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> Result<Option<Contact>, AppError> {
        Ok(self.contacts.lock().unwrap().remove(&id))
    }
}

// ---------------------------------------------------------------------------
// Stub email API
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct EmailOutbox {
    received: Arc<Mutex<Vec<Value>>>,
    failing: Arc<AtomicBool>,
}

impl EmailOutbox {
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn resume_deliveries(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    /// The verification link from the most recent email.
    pub fn last_verification_link(&self) -> String {
        let emails = self.received();
        let body = emails
            .last()
            .and_then(|email| email["TextBody"].as_str())
            .expect("No email received");

        body.split_whitespace()
            .find(|word| word.starts_with("http"))
            .expect("No link in email body")
            .to_string()
    }
}

async fn receive_email(body: web::Json<Value>, outbox: web::Data<EmailOutbox>) -> HttpResponse {
    if outbox.failing.load(Ordering::SeqCst) {
        return HttpResponse::InternalServerError().finish();
    }
    outbox.received.lock().unwrap().push(body.into_inner());
    HttpResponse::Ok().finish()
}

fn spawn_email_server() -> (String, EmailOutbox) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let outbox = EmailOutbox::default();

    let data = web::Data::new(outbox.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/email", web::post().to(receive_email))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to bind email server")
    .run();
    let _ = tokio::spawn(server);

    (format!("http://127.0.0.1:{}", port), outbox)
}

// ---------------------------------------------------------------------------
// Application under test
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub users: Arc<InMemoryUsers>,
    pub contacts: Arc<InMemoryContacts>,
    pub codec: TokenCodec,
    pub outbox: EmailOutbox,
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let (email_address, outbox) = spawn_email_server();
    let email_client = EmailClient::new(
        email_address,
        SenderEmail::parse("no-reply@example.com").unwrap(),
        "test-token".to_string(),
        std::time::Duration::from_secs(2),
    )
    .expect("Failed to build email client");

    let users = Arc::new(InMemoryUsers::default());
    let contacts = Arc::new(InMemoryContacts::default());
    let codec = TokenCodec::new(TEST_SECRET, TEST_ALGORITHM).expect("Failed to build codec");
    let issuer = SessionIssuer::new(codec.clone(), users.clone(), Duration::minutes(30));

    let server = run(
        listener,
        users.clone(),
        contacts.clone(),
        issuer,
        email_client,
        address.clone(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
        users,
        contacts,
        codec,
        outbox,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Insert a user directly, bypassing registration.
    pub async fn seed_user(&self, username: &str, password: &str) -> User {
        self.users
            .insert(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                // cost 4 keeps tests fast; verification reads the cost from the hash
                password_hash: bcrypt::hash(password, 4).unwrap(),
                verification_token_hash: "seeded".to_string(),
            })
            .await
            .expect("Failed to seed user")
    }

    pub async fn post_token(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Seed the standard test user and log in.
    pub async fn login_test_user(&self) -> String {
        self.seed_user("test", "testpassword").await;
        let body: Value = self
            .post_token("test", "testpassword")
            .await
            .json()
            .await
            .expect("Failed to parse token response");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// A token signed with the app's key for an arbitrary claim set.
    pub fn token_with_claims(&self, claims: Value, ttl: Duration) -> String {
        self.codec
            .issue(claims.as_object().unwrap(), ttl)
            .expect("Failed to issue token")
    }
}
