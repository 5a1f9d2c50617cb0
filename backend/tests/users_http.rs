//! End-to-end HTTP tests: a bound actix server driven by `UsersClient`.

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use rstest::rstest;

use user_service::Trace;
use user_service::client::{ClientError, UsersClient};
use user_service::domain::{CreateUserRequest, UpdateUserRequest};
use user_service::inbound::http::json_config;
use user_service::inbound::http::state::HttpState;
use user_service::inbound::http::users::configure as configure_users;
use user_service::test_support::InMemoryUsers;

struct TestServer {
    client: UsersClient,
    handle: ServerHandle,
    users: InMemoryUsers,
}

impl TestServer {
    fn start() -> Self {
        let users = InMemoryUsers::default();
        let service = Arc::new(users.service.clone());
        let state = web::Data::new(HttpState::new(service.clone(), service));

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .app_data(json_config())
                .wrap(Trace)
                .service(web::scope("/api").configure(configure_users))
        })
        .workers(1)
        .listen(listener)
        .expect("listen")
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let client = UsersClient::new(format!("http://{addr}")).expect("client builds");
        Self {
            client,
            handle,
            users,
        }
    }

    async fn stop(self) {
        self.handle.stop(true).await;
    }
}

fn ada() -> CreateUserRequest {
    CreateUserRequest {
        name: "Ada".to_owned(),
        email: "ada@example.com".to_owned(),
        role: Some("admin".to_owned()),
    }
}

#[rstest]
#[actix_web::test]
async fn retried_post_with_same_key_returns_the_same_user() {
    let server = TestServer::start();

    let first = server
        .client
        .create_user(&ada(), Some("abc-1"))
        .await
        .expect("first create");
    let second = server
        .client
        .create_user(&ada(), Some("abc-1"))
        .await
        .expect("retried create");

    assert_eq!(first, second);
    assert_eq!(server.users.repository.len(), 1);
    server.stop().await;
}

#[rstest]
#[actix_web::test]
async fn simultaneous_posts_with_same_key_create_one_row() {
    let server = TestServer::start();

    let (left_user, right_user) = (ada(), ada());
    let (left, right) = futures::join!(
        server.client.create_user(&left_user, Some("abc-1")),
        server.client.create_user(&right_user, Some("abc-1")),
    );

    for outcome in [&left, &right] {
        assert!(
            matches!(outcome, Ok(_) | Err(ClientError::AlreadyInProgress(_))),
            "unexpected outcome: {outcome:?}"
        );
    }
    if let (Ok(a), Ok(b)) = (&left, &right) {
        assert_eq!(a, b);
    }
    assert_eq!(server.users.repository.len(), 1);
    server.stop().await;
}

#[rstest]
#[actix_web::test]
async fn crud_lifecycle_over_http() {
    let server = TestServer::start();
    let created = server
        .client
        .create_user(&ada(), None)
        .await
        .expect("create");
    let id = created.id().as_str().to_owned();

    let fetched = server.client.get_user(&id).await.expect("get");
    assert_eq!(fetched, created);

    let update = UpdateUserRequest {
        email: Some("lovelace@example.com".to_owned()),
        ..UpdateUserRequest::default()
    };
    let updated = server.client.update_user(&id, &update).await.expect("update");
    assert_eq!(updated.email(), "lovelace@example.com");
    assert_eq!(updated.name(), created.name());
    assert_eq!(updated.role(), created.role());
    assert_eq!(updated.created_at(), created.created_at());

    let listed = server.client.list_users().await.expect("list");
    assert_eq!(listed.total, 1);
    assert_eq!(listed.users, vec![updated]);

    server.client.delete_user(&id).await.expect("delete");
    assert!(matches!(
        server.client.get_user(&id).await,
        Err(ClientError::NotFound(_))
    ));
    assert!(matches!(
        server.client.delete_user(&id).await,
        Err(ClientError::NotFound(_))
    ));
    server.stop().await;
}

#[rstest]
#[actix_web::test]
async fn validation_failures_surface_as_invalid_request() {
    let server = TestServer::start();
    let request = CreateUserRequest {
        name: "   ".to_owned(),
        ..ada()
    };

    let err = server
        .client
        .create_user(&request, Some("abc-2"))
        .await
        .expect_err("blank name");

    assert!(matches!(err, ClientError::InvalidRequest(_)));
    assert!(server.users.repository.is_empty());
    assert!(!server.users.store.is_locked(
        &user_service::domain::IdempotencyKey::new("abc-2").expect("valid key")
    ));
    server.stop().await;
}
