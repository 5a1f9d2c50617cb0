//! Handler tests over the in-memory service and mocked ports.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{MockUsersCommand, MockUsersQuery};
use crate::inbound::http::error::json_config;
use crate::inbound::http::idempotency::IDEMPOTENCY_KEY_HEADER;
use crate::test_support::InMemoryUsers;

#[fixture]
fn users() -> InMemoryUsers {
    InMemoryUsers::default()
}

fn state_for(users: &InMemoryUsers) -> HttpState {
    let service = Arc::new(users.service.clone());
    HttpState::new(service.clone(), service)
}

macro_rules! init_app {
    ($state:expr) => {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(json_config())
                .service(web::scope("/api").configure(configure)),
        )
        .await
    };
}

fn ada() -> Value {
    json!({"name": "Ada", "email": "ada@example.com"})
}

#[rstest]
#[actix_web::test]
async fn same_key_twice_returns_identical_bodies_and_one_row(users: InMemoryUsers) {
    let app = init_app!(state_for(&users));

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let request = actix_test::TestRequest::post()
            .uri("/api/users")
            .insert_header((IDEMPOTENCY_KEY_HEADER, "abc-1"))
            .set_json(ada())
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        bodies.push(actix_test::read_body(response).await);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(users.repository.len(), 1);
    let created: Value = serde_json::from_slice(&bodies[0]).expect("user JSON");
    assert_eq!(created["role"], "user");
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[rstest]
#[actix_web::test]
async fn blank_key_header_creates_independent_users(users: InMemoryUsers) {
    let app = init_app!(state_for(&users));

    for _ in 0..2 {
        let request = actix_test::TestRequest::post()
            .uri("/api/users")
            .insert_header((IDEMPOTENCY_KEY_HEADER, ""))
            .set_json(ada())
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    assert_eq!(users.repository.len(), 2);
}

#[rstest]
#[case(json!({"name": "", "email": "ada@example.com"}))]
#[case(json!({"name": "Ada"}))]
#[actix_web::test]
async fn invalid_create_body_is_a_bad_request(users: InMemoryUsers, #[case] body: Value) {
    let app = init_app!(state_for(&users));

    let request = actix_test::TestRequest::post()
        .uri("/api/users")
        .set_json(body)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
    assert!(users.repository.is_empty());
}

#[rstest]
#[actix_web::test]
async fn partial_update_then_delete_round_trip(users: InMemoryUsers) {
    let app = init_app!(state_for(&users));

    let request = actix_test::TestRequest::post()
        .uri("/api/users")
        .set_json(ada())
        .to_request();
    let created: Value = actix_test::call_and_read_body_json(&app, request).await;
    let id = created["id"].as_str().expect("id").to_owned();

    let request = actix_test::TestRequest::put()
        .uri(&format!("/api/users/{id}"))
        .set_json(json!({"email": "lovelace@example.com"}))
        .to_request();
    let updated: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(updated["email"], "lovelace@example.com");
    assert_eq!(updated["name"], created["name"]);
    assert_eq!(updated["created_at"], created["created_at"]);

    let request = actix_test::TestRequest::get().uri("/api/users").to_request();
    let listed: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["users"][0]["id"], id.as_str());

    let request = actix_test::TestRequest::delete()
        .uri(&format!("/api/users/{id}"))
        .to_request();
    let deleted: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(deleted, json!({"message": "user deleted"}));

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/users/{id}"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case(actix_test::TestRequest::get())]
#[case(actix_test::TestRequest::put().set_json(json!({"name": "Grace"})))]
#[case(actix_test::TestRequest::delete())]
#[actix_web::test]
async fn missing_user_is_not_found(users: InMemoryUsers, #[case] request: actix_test::TestRequest) {
    let app = init_app!(state_for(&users));

    let response =
        actix_test::call_service(&app, request.uri("/api/users/no-such-user").to_request()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[actix_web::test]
async fn in_progress_key_maps_to_unprocessable_entity() {
    let mut command = MockUsersCommand::new();
    command
        .expect_create_user()
        .times(1)
        .returning(|_, _| Err(Error::already_in_progress("request already in progress")));
    let state = HttpState::new(Arc::new(command), Arc::new(MockUsersQuery::new()));
    let app = init_app!(state);

    let request = actix_test::TestRequest::post()
        .uri("/api/users")
        .insert_header((IDEMPOTENCY_KEY_HEADER, "abc-1"))
        .set_json(ada())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "already_in_progress");
}

#[rstest]
#[actix_web::test]
async fn list_failure_is_redacted() {
    let mut query = MockUsersQuery::new();
    query
        .expect_list_users()
        .times(1)
        .returning(|| Err(Error::internal("password authentication failed")));
    let state = HttpState::new(Arc::new(MockUsersCommand::new()), Arc::new(query));
    let app = init_app!(state);

    let request = actix_test::TestRequest::get().uri("/api/users").to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
}
