//! Integration tests for the session authorizer's check path.
//!
//! Uses wiremock as the remote record store; mock expectations pin down
//! exactly how many grant lookups each scenario performs.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use guacamaya_console::config::RecordStoreConfig;
use guacamaya_console::identity::IdentityClient;
use guacamaya_console::models::CurrentUser;
use guacamaya_console::services::authorizer::{SessionAuthorizer, TtlAdminCache};
use guacamaya_console::store::StoreClient;
use guacamaya_core::UserId;

const GRANTS_PATH: &str = "/rest/v1/admin_users";

fn store_config(server: &MockServer) -> RecordStoreConfig {
    RecordStoreConfig {
        base_url: server.uri(),
        service_key: SecretString::from("test-service-key"),
    }
}

fn authorizer(server: &MockServer, cache_ttl: Duration) -> SessionAuthorizer {
    let config = store_config(server);
    SessionAuthorizer::new(
        IdentityClient::new(&config),
        &StoreClient::new(&config),
        Arc::new(TtlAdminCache::new(cache_ttl)),
    )
}

fn current_user(id: UserId) -> CurrentUser {
    CurrentUser {
        id,
        email: "staff@guacamaya.example".to_string(),
        access_token: "session-token".to_string(),
    }
}

/// Mock for the active-grant lookup of one user.
fn grant_query(user_id: UserId, rows: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(GRANTS_PATH))
        .and(query_param("select", "user_id"))
        .and(query_param("user_id", format!("eq.{user_id}")))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
}

#[tokio::test]
async fn anonymous_visitor_is_not_an_admin_and_not_an_error() {
    let server = MockServer::start().await;
    let authorizer = authorizer(&server, Duration::from_secs(300));

    let status = authorizer.check_admin(None).await;

    assert!(!status.is_admin);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn fresh_session_without_grant_is_denied_without_error() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    grant_query(user_id, json!([])).expect(1).mount(&server).await;

    let authorizer = authorizer(&server, Duration::from_secs(300));
    let status = authorizer.check_admin(Some(&current_user(user_id))).await;

    assert!(!status.is_admin);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn second_check_within_ttl_hits_the_cache() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    // Exactly one store query for two checks.
    grant_query(user_id, json!([{ "user_id": user_id }]))
        .expect(1)
        .mount(&server)
        .await;

    let authorizer = authorizer(&server, Duration::from_secs(300));
    let user = current_user(user_id);

    let first = authorizer.check_admin(Some(&user)).await;
    let second = authorizer.check_admin(Some(&user)).await;

    assert!(first.is_admin);
    assert_eq!(first, second);
}

#[tokio::test]
async fn negative_answers_are_cached_too() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    grant_query(user_id, json!([])).expect(1).mount(&server).await;

    let authorizer = authorizer(&server, Duration::from_secs(300));
    let user = current_user(user_id);

    let first = authorizer.check_admin(Some(&user)).await;
    let second = authorizer.check_admin(Some(&user)).await;

    assert!(!first.is_admin);
    assert_eq!(first, second);
}

#[tokio::test]
async fn different_user_forces_a_fresh_lookup() {
    let server = MockServer::start().await;
    let admin = UserId::new(Uuid::new_v4());
    let visitor = UserId::new(Uuid::new_v4());

    grant_query(admin, json!([{ "user_id": admin }]))
        .expect(1)
        .mount(&server)
        .await;
    grant_query(visitor, json!([])).expect(1).mount(&server).await;

    let authorizer = authorizer(&server, Duration::from_secs(300));

    let admin_status = authorizer.check_admin(Some(&current_user(admin))).await;
    let visitor_status = authorizer.check_admin(Some(&current_user(visitor))).await;

    assert!(admin_status.is_admin);
    assert!(!visitor_status.is_admin);
}

#[tokio::test]
async fn expired_cache_entry_forces_a_fresh_lookup() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    grant_query(user_id, json!([{ "user_id": user_id }]))
        .expect(2)
        .mount(&server)
        .await;

    // TTL far below the production default to keep the test fast.
    let authorizer = authorizer(&server, Duration::from_millis(50));
    let user = current_user(user_id);

    let first = authorizer.check_admin(Some(&user)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = authorizer.check_admin(Some(&user)).await;

    assert!(first.is_admin);
    assert!(second.is_admin);
}

#[tokio::test]
async fn lookup_failure_surfaces_as_error_and_is_not_cached() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    // First lookup fails...
    Mock::given(method("GET"))
        .and(path(GRANTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // ...the retry on the next check succeeds.
    grant_query(user_id, json!([{ "user_id": user_id }]))
        .expect(1)
        .mount(&server)
        .await;

    let authorizer = authorizer(&server, Duration::from_secs(300));
    let user = current_user(user_id);

    let failed = authorizer.check_admin(Some(&user)).await;
    assert!(!failed.is_admin);
    assert!(failed.error.is_some());

    let retried = authorizer.check_admin(Some(&user)).await;
    assert!(retried.is_admin);
    assert!(retried.error.is_none());
}

#[tokio::test]
async fn logout_drops_the_cached_answer() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    grant_query(user_id, json!([{ "user_id": user_id }]))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let authorizer = authorizer(&server, Duration::from_secs(300));
    let user = current_user(user_id);

    let first = authorizer.check_admin(Some(&user)).await;
    assert!(first.is_admin);

    authorizer.logout(&user.access_token, user.id).await;

    // The entry is gone, so this check must query the store again.
    let after_logout = authorizer.check_admin(Some(&user)).await;
    assert!(after_logout.is_admin);
}
