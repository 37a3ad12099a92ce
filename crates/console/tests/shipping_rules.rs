//! Integration tests for shipping rule management.
//!
//! Covers the duplicate-prevention invariant on the write path: at most
//! one active rule per `(country, state, city-or-null)`, with the
//! store-side uniqueness constraint as the authoritative backstop.

use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use guacamaya_console::config::RecordStoreConfig;
use guacamaya_console::models::ShippingRuleDraft;
use guacamaya_console::services::shipping::{RuleWriteError, ShippingRuleService};
use guacamaya_console::store::StoreClient;
use guacamaya_core::RuleId;

const RULES_PATH: &str = "/rest/v1/shipping_rules";

fn service(server: &MockServer) -> ShippingRuleService {
    ShippingRuleService::new(&StoreClient::new(&RecordStoreConfig {
        base_url: server.uri(),
        service_key: SecretString::from("test-service-key"),
    }))
}

fn draft(state: &str, city: &str) -> ShippingRuleDraft {
    ShippingRuleDraft {
        country: "Venezuela".to_string(),
        state: state.to_string(),
        city: city.to_string(),
        is_free: false,
        base_cost: "4.00".parse().expect("decimal"),
        notes: String::new(),
        is_active: true,
    }
}

/// Mock for the pre-insert conflict query (`select=id`, active only).
fn conflict_query(state: &str, city: Option<&str>, rows: serde_json::Value) -> Mock {
    let mock = Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .and(query_param("select", "id"))
        .and(query_param("country", "eq.Venezuela"))
        .and(query_param("state", format!("eq.{state}")))
        .and(query_param("is_active", "eq.true"));
    let mock = match city {
        Some(city) => mock.and(query_param("city", format!("eq.{city}"))),
        None => mock.and(query_param("city", "is.null")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(rows))
}

fn stored_rule(id: Uuid, state: &str, city: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "country": "Venezuela",
        "state": state,
        "city": city,
        "is_free": false,
        "base_cost": "4.00",
        "is_active": true,
        "notes": null,
        "created_at": "2026-01-15T12:00:00+00:00"
    })
}

#[tokio::test]
async fn second_active_state_default_is_rejected() {
    let server = MockServer::start().await;

    conflict_query("Miranda", None, json!([{ "id": Uuid::new_v4() }]))
        .mount(&server)
        .await;

    // No POST mock: an attempted insert would surface as a store error.
    let result = service(&server).create(&draft("Miranda", "")).await;

    assert!(matches!(result, Err(RuleWriteError::Duplicate)));
}

#[tokio::test]
async fn city_override_beside_existing_default_is_accepted() {
    let server = MockServer::start().await;
    let created_id = Uuid::new_v4();

    // The conflict check only looks at the exact (state, city) slot, so an
    // existing Miranda default is irrelevant here.
    conflict_query("Miranda", Some("Caracas"), json!([]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([stored_rule(created_id, "Miranda", Some("Caracas"))])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rule = service(&server)
        .create(&draft("Miranda", "Caracas"))
        .await
        .expect("create should succeed");

    assert_eq!(rule.id, RuleId::new(created_id));
    assert_eq!(rule.city.as_deref(), Some("Caracas"));
}

#[tokio::test]
async fn store_unique_constraint_maps_to_duplicate() {
    let server = MockServer::start().await;

    // Pre-check sees nothing (a concurrent writer won the race)...
    conflict_query("Miranda", None, json!([])).mount(&server).await;
    // ...and the store's unique constraint rejects the insert.
    Mock::given(method("POST"))
        .and(path(RULES_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&server)
        .await;

    let result = service(&server).create(&draft("Miranda", "")).await;

    assert!(matches!(result, Err(RuleWriteError::Duplicate)));
}

#[tokio::test]
async fn update_excludes_the_edited_rule_from_the_duplicate_check() {
    let server = MockServer::start().await;
    let id = RuleId::new(Uuid::new_v4());

    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .and(query_param("select", "id"))
        .and(query_param("city", "is.null"))
        .and(query_param("id", format!("neq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(RULES_PATH))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .update(id, &draft("Miranda", ""))
        .await
        .expect("update should succeed");
}

#[tokio::test]
async fn activation_rechecks_the_duplicate_invariant() {
    let server = MockServer::start().await;
    let id = RuleId::new(Uuid::new_v4());

    // Fetch of the rule being activated.
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .and(query_param("select", "*"))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([stored_rule(id.as_uuid(), "Miranda", None)])),
        )
        .mount(&server)
        .await;
    // Another active default already occupies the slot.
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .and(query_param("select", "id"))
        .and(query_param("city", "is.null"))
        .and(query_param("id", format!("neq.{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&server)
        .await;

    let result = service(&server).set_active(id, true).await;

    assert!(matches!(result, Err(RuleWriteError::Duplicate)));
}

#[tokio::test]
async fn deactivating_the_sole_default_is_allowed() {
    let server = MockServer::start().await;
    let id = RuleId::new(Uuid::new_v4());

    // Deactivation goes straight to the patch - no conflict check.
    Mock::given(method("PATCH"))
        .and(path(RULES_PATH))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .set_active(id, false)
        .await
        .expect("deactivation should succeed");
}

#[tokio::test]
async fn negative_cost_is_rejected_before_any_write() {
    let server = MockServer::start().await;
    let id = RuleId::new(Uuid::new_v4());

    let result = service(&server)
        .set_cost(id, false, "-2.50".parse().expect("decimal"))
        .await;

    assert!(matches!(result, Err(RuleWriteError::Validation(_))));
}

#[tokio::test]
async fn free_cost_update_stores_zero() {
    let server = MockServer::start().await;
    let id = RuleId::new(Uuid::new_v4());

    Mock::given(method("PATCH"))
        .and(path(RULES_PATH))
        .and(query_param("id", format!("eq.{id}")))
        .and(wiremock::matchers::body_json(json!({
            "is_free": true,
            "base_cost": "0"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    service(&server)
        .set_cost(id, true, "9.99".parse().expect("decimal"))
        .await
        .expect("cost update should succeed");
}
