mod common;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use common::{spawn_app, TestApp};
use serde_json::{json, Value};

fn contact_body(first_name: &str, email: &str, birth_date: NaiveDate) -> Value {
    json!({
        "first_name": first_name,
        "last_name": "Nowak",
        "email": email,
        "phone_number": "+48 600 100 200",
        "birth_date": birth_date.to_string(),
        "additional_data": "met at the conference"
    })
}

/// A birth date in 1990 whose anniversary lands `days` from today.
fn birthday_in(days: i64) -> NaiveDate {
    let target = Utc::now().date_naive() + Duration::days(days);
    // avoid 29 Feb, which 1990 does not have
    let day = if target.month() == 2 && target.day() == 29 { 28 } else { target.day() };
    NaiveDate::from_ymd_opt(1990, target.month(), day).unwrap()
}

async fn create(app: &TestApp, token: &str, body: &Value) -> reqwest::Response {
    app.client
        .post(app.url("/contacts"))
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn contacts_require_a_token() {
    let app = spawn_app().await;

    for path in ["/contacts", "/contacts/birthdays", "/contacts/1"] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(401, response.status().as_u16(), "{}", path);
    }
}

#[tokio::test]
async fn contact_crud_round_trip() {
    let app = spawn_app().await;
    let token = app.login_test_user().await;
    let birth_date = NaiveDate::from_ymd_opt(1985, 12, 1).unwrap();

    let created = create(&app, &token, &contact_body("Anna", "anna@example.com", birth_date)).await;
    assert_eq!(201, created.status().as_u16());
    let created: Value = created.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["first_name"], "Anna");
    assert_eq!(created["birth_date"], "1985-12-01");

    let fetched: Value = app
        .client
        .get(app.url(&format!("/contacts/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    let mut replacement = contact_body("Anna", "anna.k@example.com", birth_date);
    replacement["last_name"] = json!("Kowalska");
    let updated = app
        .client
        .put(app.url(&format!("/contacts/{}", id)))
        .bearer_auth(&token)
        .json(&replacement)
        .send()
        .await
        .unwrap();
    assert_eq!(200, updated.status().as_u16());
    let updated: Value = updated.json().await.unwrap();
    assert_eq!(updated["last_name"], "Kowalska");
    assert_eq!(updated["email"], "anna.k@example.com");

    let deleted = app
        .client
        .delete(app.url(&format!("/contacts/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, deleted.status().as_u16());

    let gone = app
        .client
        .get(app.url(&format!("/contacts/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(404, gone.status().as_u16());
}

#[tokio::test]
async fn missing_contacts_are_not_found() {
    let app = spawn_app().await;
    let token = app.login_test_user().await;
    let body = contact_body("Anna", "anna@example.com", NaiveDate::from_ymd_opt(1985, 1, 1).unwrap());

    let update = app
        .client
        .put(app.url("/contacts/999"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    let delete = app
        .client
        .delete(app.url("/contacts/999"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(404, update.status().as_u16());
    assert_eq!(404, delete.status().as_u16());
}

#[tokio::test]
async fn invalid_or_duplicate_contacts_are_rejected() {
    let app = spawn_app().await;
    let token = app.login_test_user().await;
    let birth_date = NaiveDate::from_ymd_opt(1985, 1, 1).unwrap();

    let mut bad_email = contact_body("Anna", "not-an-email", birth_date);
    assert_eq!(400, create(&app, &token, &bad_email).await.status().as_u16());

    bad_email["email"] = json!("anna@example.com");
    bad_email["birth_date"] = json!((Utc::now().date_naive() + Duration::days(30)).to_string());
    assert_eq!(400, create(&app, &token, &bad_email).await.status().as_u16());

    let ok = contact_body("Anna", "anna@example.com", birth_date);
    assert_eq!(201, create(&app, &token, &ok).await.status().as_u16());
    let duplicate = contact_body("Other", "anna@example.com", birth_date);
    assert_eq!(409, create(&app, &token, &duplicate).await.status().as_u16());
}

#[tokio::test]
async fn list_filters_by_search_term() {
    let app = spawn_app().await;
    let token = app.login_test_user().await;
    let birth_date = NaiveDate::from_ymd_opt(1985, 1, 1).unwrap();
    create(&app, &token, &contact_body("Anna", "anna@example.com", birth_date)).await;
    create(&app, &token, &contact_body("Jan", "jan@work.org", birth_date)).await;

    let all: Vec<Value> = app
        .client
        .get(app.url("/contacts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let filtered: Vec<Value> = app
        .client
        .get(app.url("/contacts?search=WORK"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["first_name"], "Jan");

    let blank: Vec<Value> = app
        .client
        .get(app.url("/contacts?search=%20%20"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(blank.len(), 2);

    let padded: Vec<Value> = app
        .client
        .get(app.url("/contacts?search=%20anna%20"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(padded.len(), 1);
}

#[tokio::test]
async fn birthdays_lists_the_coming_week_soonest_first() {
    let app = spawn_app().await;
    let token = app.login_test_user().await;
    create(&app, &token, &contact_body("Later", "later@example.com", birthday_in(5))).await;
    create(&app, &token, &contact_body("Today", "today@example.com", birthday_in(0))).await;
    create(&app, &token, &contact_body("Outside", "outside@example.com", birthday_in(20))).await;

    let response = app
        .client
        .get(app.url("/contacts/birthdays"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let upcoming: Vec<Value> = response.json().await.unwrap();
    let names: Vec<&str> = upcoming
        .iter()
        .map(|c| c["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Today", "Later"]);
}
