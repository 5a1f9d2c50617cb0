//! Behavioural tests for idempotent user creation over in-memory adapters.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use rstest::{fixture, rstest};

use user_service::domain::ports::{IdempotencyStore, UsersCommand, UsersQuery};
use user_service::domain::{
    CreateUserRequest, ErrorCode, IdempotencyConfig, IdempotencyKey, StoreFailurePolicy,
    UserEventMethod,
};
use user_service::test_support::InMemoryUsers;

const RESULT_TTL: Duration = Duration::from_secs(3600);
const LOCK_TTL: Duration = Duration::from_secs(30);

fn config() -> IdempotencyConfig {
    IdempotencyConfig::default()
        .with_result_ttl(RESULT_TTL)
        .with_lock_ttl(LOCK_TTL)
}

#[fixture]
fn users() -> InMemoryUsers {
    InMemoryUsers::new(config())
}

#[fixture]
fn key() -> IdempotencyKey {
    IdempotencyKey::new("abc-1").expect("valid key")
}

fn ada() -> CreateUserRequest {
    CreateUserRequest {
        name: "Ada".to_owned(),
        email: "ada@example.com".to_owned(),
        role: None,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_keyed_creates_persist_one_row(users: InMemoryUsers, key: IdempotencyKey) {
    let attempts = (0..16).map(|_| {
        let service = users.service.clone();
        let key = key.clone();
        tokio::spawn(async move { service.create_user(Some(key), ada()).await })
    });

    let mut ids = HashSet::new();
    for outcome in join_all(attempts).await {
        match outcome.expect("task completes") {
            Ok(user) => {
                ids.insert(user.id().clone());
            }
            Err(err) => assert_eq!(err.code(), ErrorCode::AlreadyInProgress),
        }
    }

    assert_eq!(ids.len(), 1, "every success returns the same user");
    assert_eq!(users.repository.len(), 1);
    assert!(!users.store.is_locked(&key));

    let replay = users
        .service
        .create_user(Some(key), ada())
        .await
        .expect("replay succeeds");
    assert!(ids.contains(replay.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unkeyed_creates_persist_every_row(users: InMemoryUsers) {
    let attempts = (0..8).map(|_| {
        let service = users.service.clone();
        tokio::spawn(async move { service.create_user(None, ada()).await })
    });

    let ids: HashSet<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|outcome| {
            outcome
                .expect("task completes")
                .expect("create succeeds")
                .id()
                .clone()
        })
        .collect();

    assert_eq!(ids.len(), 8);
    assert_eq!(users.repository.len(), 8);
    assert_eq!(users.notifier.events().len(), 8);
}

#[rstest]
#[tokio::test]
async fn replay_publishes_no_second_event(users: InMemoryUsers, key: IdempotencyKey) {
    let first = users
        .service
        .create_user(Some(key.clone()), ada())
        .await
        .expect("create");
    let second = users
        .service
        .create_user(Some(key), ada())
        .await
        .expect("replay");

    assert_eq!(first, second);
    let events = users.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].method, UserEventMethod::Create);
}

#[rstest]
#[tokio::test]
async fn expired_record_allows_a_fresh_create(users: InMemoryUsers, key: IdempotencyKey) {
    let first = users
        .service
        .create_user(Some(key.clone()), ada())
        .await
        .expect("create");

    users.clock.advance(RESULT_TTL + Duration::from_secs(1));
    let second = users
        .service
        .create_user(Some(key), ada())
        .await
        .expect("create after expiry");

    assert_ne!(first.id(), second.id());
    assert!(second.created_at() > first.created_at());
    assert_eq!(users.repository.len(), 2);
}

#[rstest]
#[tokio::test]
async fn abandoned_lock_heals_after_its_ttl(users: InMemoryUsers, key: IdempotencyKey) {
    users
        .store
        .acquire_lock(&key, LOCK_TTL)
        .await
        .expect("store online")
        .expect("lock is free");

    let err = users
        .service
        .create_user(Some(key.clone()), ada())
        .await
        .expect_err("lock is held");
    assert_eq!(err.code(), ErrorCode::AlreadyInProgress);
    assert!(users.repository.is_empty());

    users.clock.advance(LOCK_TTL + Duration::from_secs(1));
    users
        .service
        .create_user(Some(key), ada())
        .await
        .expect("create after lock expiry");
    assert_eq!(users.repository.len(), 1);
}

#[rstest]
#[tokio::test]
async fn unreachable_store_degrades_open_by_default(users: InMemoryUsers, key: IdempotencyKey) {
    users.store.set_offline(true);

    users
        .service
        .create_user(Some(key.clone()), ada())
        .await
        .expect("create proceeds without idempotency");
    users
        .service
        .create_user(Some(key), ada())
        .await
        .expect("second create also proceeds");

    assert_eq!(users.repository.len(), 2);
}

#[rstest]
#[tokio::test]
async fn unreachable_store_rejects_when_fail_closed(key: IdempotencyKey) {
    let users = InMemoryUsers::new(config().with_failure_policy(StoreFailurePolicy::FailClosed));
    users.store.set_offline(true);

    let err = users
        .service
        .create_user(Some(key), ada())
        .await
        .expect_err("fail-closed rejects");

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert!(users.repository.is_empty());
    let unkeyed = users.service.create_user(None, ada()).await;
    assert!(unkeyed.is_ok(), "unkeyed creates never touch the store");
}

#[rstest]
#[tokio::test]
async fn list_returns_newest_first(users: InMemoryUsers) {
    let first = users.service.create_user(None, ada()).await.expect("create");
    users.clock.advance(Duration::from_secs(1));
    let second = users.service.create_user(None, ada()).await.expect("create");

    let listed = users.service.list_users().await.expect("list");
    let ids: Vec<_> = listed.iter().map(|user| user.id().clone()).collect();
    assert_eq!(ids, vec![second.id().clone(), first.id().clone()]);
}
