//! Integration tests for the login flow.
//!
//! Password sign-in at the identity provider, one cache-bypassing grant
//! lookup, and immediate session termination for authenticated
//! non-admins.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use guacamaya_console::config::RecordStoreConfig;
use guacamaya_console::identity::{IdentityClient, IdentityError};
use guacamaya_console::models::CurrentUser;
use guacamaya_console::services::authorizer::{AuthError, SessionAuthorizer, TtlAdminCache};
use guacamaya_console::store::StoreClient;
use guacamaya_core::{Email, UserId};

const TOKEN_PATH: &str = "/auth/v1/token";
const LOGOUT_PATH: &str = "/auth/v1/logout";
const GRANTS_PATH: &str = "/rest/v1/admin_users";

const EMAIL: &str = "staff@guacamaya.example";
const PASSWORD: &str = "hunter2hunter2";

fn authorizer(server: &MockServer) -> SessionAuthorizer {
    let config = RecordStoreConfig {
        base_url: server.uri(),
        service_key: SecretString::from("test-service-key"),
    };
    SessionAuthorizer::new(
        IdentityClient::new(&config),
        &StoreClient::new(&config),
        Arc::new(TtlAdminCache::new(Duration::from_secs(300))),
    )
}

fn email() -> Email {
    Email::parse(EMAIL).expect("valid email")
}

/// Mock for a successful password sign-in.
fn sign_in_ok(user_id: UserId) -> Mock {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({ "email": EMAIL, "password": PASSWORD })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-access-token",
            "token_type": "bearer",
            "user": { "id": user_id, "email": EMAIL }
        })))
}

fn grant_query(user_id: UserId, rows: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(GRANTS_PATH))
        .and(query_param("user_id", format!("eq.{user_id}")))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
}

fn sign_out_ok() -> Mock {
    Mock::given(method("POST"))
        .and(path(LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(204))
}

#[tokio::test]
async fn admin_login_succeeds_and_primes_the_cache() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    sign_in_ok(user_id).expect(1).mount(&server).await;
    // Exactly one grant lookup: login bypasses the cache, and the
    // follow-up check right after must not query again.
    grant_query(user_id, json!([{ "user_id": user_id }]))
        .expect(1)
        .mount(&server)
        .await;

    let authorizer = authorizer(&server);
    let admin = authorizer
        .login(&email(), PASSWORD)
        .await
        .expect("login should succeed");

    assert_eq!(admin.user_id, user_id);
    assert_eq!(admin.email, EMAIL);
    assert_eq!(admin.access_token, "fresh-access-token");

    let status = authorizer
        .check_admin(Some(&CurrentUser {
            id: admin.user_id,
            email: admin.email,
            access_token: admin.access_token,
        }))
        .await;
    assert!(status.is_admin);
}

#[tokio::test]
async fn rejected_credentials_fail_with_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let result = authorizer(&server).login(&email(), "wrong-password").await;

    assert!(matches!(
        result,
        Err(AuthError::Identity(IdentityError::InvalidCredentials))
    ));
}

#[tokio::test]
async fn authenticated_non_admin_is_signed_out_and_rejected() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    sign_in_ok(user_id).mount(&server).await;
    grant_query(user_id, json!([])).mount(&server).await;
    // The freshly issued session must be revoked upstream.
    sign_out_ok().expect(1).mount(&server).await;

    let result = authorizer(&server).login(&email(), PASSWORD).await;

    assert!(matches!(result, Err(AuthError::NotAdmin)));
}

#[tokio::test]
async fn grant_lookup_failure_terminates_the_fresh_session() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    sign_in_ok(user_id).mount(&server).await;
    Mock::given(method("GET"))
        .and(path(GRANTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    sign_out_ok().expect(1).mount(&server).await;

    let result = authorizer(&server).login(&email(), PASSWORD).await;

    // Distinguishable from "not an admin": the lookup itself failed.
    assert!(matches!(result, Err(AuthError::Grants(_))));
}

#[tokio::test]
async fn non_admin_rejection_does_not_prime_the_cache() {
    let server = MockServer::start().await;
    let user_id = UserId::new(Uuid::new_v4());

    sign_in_ok(user_id).mount(&server).await;
    // Two lookups: one during the failed login, one for the later check.
    grant_query(user_id, json!([])).expect(2).mount(&server).await;
    sign_out_ok().mount(&server).await;

    let authorizer = authorizer(&server);
    let result = authorizer.login(&email(), PASSWORD).await;
    assert!(matches!(result, Err(AuthError::NotAdmin)));

    let status = authorizer
        .check_admin(Some(&CurrentUser {
            id: user_id,
            email: EMAIL.to_string(),
            access_token: "stale-token".to_string(),
        }))
        .await;
    assert!(!status.is_admin);
}
