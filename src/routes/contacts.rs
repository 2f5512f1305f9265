/// Contact Routes
///
/// CRUD over the contact collection. All routes sit behind
/// `AuthMiddleware`.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::contacts::{self, ContactPayload, ContactStore, BIRTHDAY_WINDOW_DAYS};
use crate::error::{AppError, ErrorContext};
use crate::logger::RequestId;
use crate::users::User;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// POST /contacts
///
/// # Errors
/// - 400: Invalid field
/// - 409: Email already used by another contact
pub async fn create_contact(
    body: web::Json<ContactPayload>,
    store: web::Data<dyn ContactStore>,
    user: web::ReqData<User>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new(request_id.as_str(), "contact_create").with_username(user.username.as_str());
    let payload = body.into_inner().validate(Utc::now().date_naive())?;

    let contact = store.create(payload).await.map_err(|e| {
        context.log_error(&e);
        e
    })?;

    tracing::info!(
        request_id = %context.request_id,
        contact_id = contact.id,
        "Contact created"
    );
    Ok(HttpResponse::Created().json(contact))
}

/// GET /contacts?search=
pub async fn list_contacts(
    query: web::Query<SearchQuery>,
    store: web::Data<dyn ContactStore>,
) -> Result<HttpResponse, AppError> {
    let contacts = store.list(query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

/// GET /contacts/birthdays
///
/// Contacts with a birthday in the next seven days, today included.
pub async fn upcoming_birthdays(
    store: web::Data<dyn ContactStore>,
) -> Result<HttpResponse, AppError> {
    let all = store.list(None).await?;
    let upcoming = contacts::upcoming_birthdays(all, Utc::now().date_naive(), BIRTHDAY_WINDOW_DAYS);
    Ok(HttpResponse::Ok().json(upcoming))
}

/// GET /contacts/{id}
pub async fn get_contact(
    path: web::Path<i64>,
    store: web::Data<dyn ContactStore>,
) -> Result<HttpResponse, AppError> {
    let contact = store
        .get(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Contact"))?;
    Ok(HttpResponse::Ok().json(contact))
}

/// PUT /contacts/{id}
///
/// Full replacement of every field.
pub async fn update_contact(
    path: web::Path<i64>,
    body: web::Json<ContactPayload>,
    store: web::Data<dyn ContactStore>,
    user: web::ReqData<User>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let context = ErrorContext::new(request_id.as_str(), "contact_update").with_username(user.username.as_str());
    let payload = body.into_inner().validate(Utc::now().date_naive())?;

    let contact = store
        .update(id, payload)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?
        .ok_or_else(|| AppError::not_found("Contact"))?;

    tracing::info!(request_id = %context.request_id, contact_id = id, "Contact updated");
    Ok(HttpResponse::Ok().json(contact))
}

/// DELETE /contacts/{id}
///
/// Responds with the deleted contact.
pub async fn delete_contact(
    path: web::Path<i64>,
    store: web::Data<dyn ContactStore>,
    user: web::ReqData<User>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let contact = store
        .delete(id)
        .await?
        .ok_or_else(|| AppError::not_found("Contact"))?;

    tracing::info!(user = %user.username, contact_id = id, "Contact deleted");
    Ok(HttpResponse::Ok().json(contact))
}
