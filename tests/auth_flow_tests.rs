use std::sync::Arc;
use std::time::Duration;

use accountd::api::{self, AppState};
use accountd::config::{CollaboratorConfig, Config};
use accountd::db::{Store, hash_password};
use accountd::domain::{Role, StatusCode};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode as HttpStatus},
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    app: Router,
    state: Arc<AppState>,
    profile: MockServer,
    notification: MockServer,
}

async fn spawn_app() -> TestApp {
    let profile = MockServer::start().await;
    let notification = MockServer::start().await;

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config.observability.metrics_enabled = false;
    config.collaborators = vec![
        CollaboratorConfig {
            name: "profile".to_string(),
            base_url: profile.uri(),
            timeout_secs: 5,
        },
        CollaboratorConfig {
            name: "notification".to_string(),
            base_url: notification.uri(),
            timeout_secs: 5,
        },
    ];

    // A single shared connection, so every query sees the same in-memory db.
    let store = Store::with_pool_options(&config.general.database_url(), 1, 1)
        .await
        .expect("Failed to open store");

    let state = api::create_app_state_with_store(config, store, None);
    let app = api::router(state.clone());

    TestApp {
        app,
        state,
        profile,
        notification,
    }
}

fn envelope_ok(status: u16) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "status": status,
        "data": "remote-id"
    }))
}

fn envelope_fail(http: u16, status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(http).set_body_json(json!({
        "success": false,
        "status": status,
        "message": message
    }))
}

async fn mount_collaborators_ok(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/api/profile/create"))
        .respond_with(envelope_ok(201))
        .mount(&app.profile)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/notification/send"))
        .respond_with(envelope_ok(200))
        .mount(&app.notification)
        .await;
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

fn register_body(login: &str) -> serde_json::Value {
    json!({
        "login": login,
        "password": "password123",
        "confirmPassword": "password123"
    })
}

/// Value of a named cookie from the response's set-cookie headers.
fn extract_cookie(response: &axum::response::Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| {
            v.split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
                .map(|(_, value)| value.to_string())
        })
}

async fn body_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Seed a user directly through the store, bypassing the saga.
async fn seed_user(state: &AppState, login: &str, password: &str) -> String {
    let (salt, digest) = hash_password(password, 1024, 1, 1).unwrap();
    let created = state
        .store
        .create_user(login, &digest, &salt, Role::User)
        .await;
    created.data.expect("Failed to seed user").id
}

#[tokio::test]
async fn register_issues_session_and_cookies() {
    let harness = spawn_app().await;
    mount_collaborators_ok(&harness).await;

    let response = harness
        .app
        .clone()
        .oneshot(post_json("/api/authorization/register", register_body("alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::CREATED);

    let access = extract_cookie(&response, "access_token").expect("missing access cookie");
    let refresh = extract_cookie(&response, "refresh_token").expect("missing refresh cookie");
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());

    let cookie_headers: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    for header in &cookie_headers {
        assert!(header.contains("HttpOnly"), "cookie not http-only: {header}");
        assert!(header.contains("SameSite=Strict"), "cookie not strict: {header}");
    }

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["status"], json!(201));
    assert_eq!(body["data"]["login"], json!("alice"));
    // The notification reply above carries a data payload; a healthy send
    // must still be recognized as such.
    assert_eq!(body["message"], json!("Account created"));

    let count = harness.state.store.count_users_by_login("alice").await;
    assert_eq!(count.data, Some(1));
}

#[tokio::test]
async fn duplicate_registration_conflicts_without_second_profile_call() {
    let harness = spawn_app().await;

    // The profile collaborator must be called exactly once: the duplicate
    // attempt has to be rejected before any side effects.
    Mock::given(method("POST"))
        .and(path("/api/profile/create"))
        .respond_with(envelope_ok(201))
        .expect(1)
        .mount(&harness.profile)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/notification/send"))
        .respond_with(envelope_ok(200))
        .mount(&harness.notification)
        .await;

    let first = harness
        .app
        .clone()
        .oneshot(post_json("/api/authorization/register", register_body("bob")))
        .await
        .unwrap();
    assert_eq!(first.status(), HttpStatus::CREATED);

    let second = harness
        .app
        .clone()
        .oneshot(post_json("/api/authorization/register", register_body("bob")))
        .await
        .unwrap();
    assert_eq!(second.status(), HttpStatus::CONFLICT);

    let body = body_json(second).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!(409));

    let count = harness.state.store.count_users_by_login("bob").await;
    assert_eq!(count.data, Some(1));
}

#[tokio::test]
async fn profile_failure_rolls_back_the_user() {
    let harness = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/profile/create"))
        .respond_with(envelope_fail(500, 500, "profile store offline"))
        .mount(&harness.profile)
        .await;

    let response = harness
        .app
        .clone()
        .oneshot(post_json("/api/authorization/register", register_body("carol")))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::INTERNAL_SERVER_ERROR);

    // Compensation: the half-created user must be gone.
    let count = harness.state.store.count_users_by_login("carol").await;
    assert_eq!(count.data, Some(0));
}

#[tokio::test]
async fn notification_failure_does_not_fail_registration() {
    let harness = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/profile/create"))
        .respond_with(envelope_ok(201))
        .mount(&harness.profile)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/notification/send"))
        .respond_with(envelope_fail(500, 500, "smtp down"))
        .mount(&harness.notification)
        .await;

    let response = harness
        .app
        .clone()
        .oneshot(post_json("/api/authorization/register", register_body("dave")))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("notification"), "message was: {message}");

    let count = harness.state.store.count_users_by_login("dave").await;
    assert_eq!(count.data, Some(1));
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let harness = spawn_app().await;
    seed_user(&harness.state, "erin", "password123").await;

    let response = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/login",
            json!({ "login": "erin", "password": "wrong-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let harness = spawn_app().await;
    seed_user(&harness.state, "frank", "password123").await;

    let login = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/login",
            json!({ "login": "frank", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), HttpStatus::OK);

    let refresh_value = extract_cookie(&login, "refresh_token").unwrap();
    let cookie = format!("refresh_token={refresh_value}");

    let first = harness
        .app
        .clone()
        .oneshot(post_with_cookie("/api/authorization/refresh", &cookie))
        .await
        .unwrap();
    assert_eq!(first.status(), HttpStatus::OK);

    let rotated = extract_cookie(&first, "refresh_token").unwrap();
    assert_ne!(rotated, refresh_value);

    // Same value again: the row was consumed by the rotation.
    let second = harness
        .app
        .clone()
        .oneshot(post_with_cookie("/api/authorization/refresh", &cookie))
        .await
        .unwrap();
    assert_eq!(second.status(), HttpStatus::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_and_purged() {
    let harness = spawn_app().await;
    let user_id = seed_user(&harness.state, "grace", "password123").await;

    let yesterday = (chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339();
    let inserted = harness
        .state
        .store
        .insert_token(&user_id, "stale-refresh-value", &yesterday)
        .await;
    assert!(inserted.success);

    let response = harness
        .app
        .clone()
        .oneshot(post_with_cookie(
            "/api/authorization/refresh",
            "refresh_token=stale-refresh-value",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), HttpStatus::UNAUTHORIZED);

    // The rejection also purged the row.
    let lookup = harness.state.store.get_token_by_value("stale-refresh-value").await;
    assert_eq!(lookup.status, StatusCode::NotFound);
}

#[tokio::test]
async fn permanent_ban_locks_the_account() {
    let harness = spawn_app().await;
    let user_id = seed_user(&harness.state, "heidi", "password123").await;

    harness.state.store.set_user_blocked(&user_id, true).await;
    let banned = harness
        .state
        .store
        .create_restriction(&user_id, "terms violation", "admin", None)
        .await;
    assert!(banned.success);

    let response = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/login",
            json!({ "login": "heidi", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::LOCKED);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!(423));
}

#[tokio::test]
async fn lapsed_ban_allows_login_and_heals_in_background() {
    let harness = spawn_app().await;
    let user_id = seed_user(&harness.state, "ivan", "password123").await;

    harness.state.store.set_user_blocked(&user_id, true).await;
    let lapsed = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    harness
        .state
        .store
        .create_restriction(&user_id, "old spat", "admin", Some(lapsed))
        .await;

    let response = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/login",
            json!({ "login": "ivan", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::OK);

    // The correction runs detached; poll for it rather than assuming order.
    let mut healed = false;
    for _ in 0..50 {
        let user = harness.state.store.get_user_by_id(&user_id).await;
        if user.data.is_some_and(|u| !u.is_blocked) {
            healed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(healed, "blocked flag was never cleared");

    let restriction = harness.state.store.active_restriction_for_user(&user_id).await;
    assert_eq!(restriction.status, StatusCode::NotFound);
}

#[tokio::test]
async fn deleted_account_surfaces_tombstone_reason() {
    let harness = spawn_app().await;
    let user_id = seed_user(&harness.state, "mallory", "password123").await;

    harness.state.store.mark_user_deleted(&user_id).await;
    let tombstone = harness
        .state
        .store
        .create_deletion(&user_id, "mallory", Some("account closed by owner".to_string()))
        .await;
    assert!(tombstone.success);

    let response = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/login",
            json!({ "login": "mallory", "password": "password123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("account closed by owner"));
}

#[tokio::test]
async fn logout_revokes_and_is_idempotent() {
    let harness = spawn_app().await;
    let user_id = seed_user(&harness.state, "judy", "password123").await;

    let login = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/login",
            json!({ "login": "judy", "password": "password123" }),
        ))
        .await
        .unwrap();
    let refresh_value = extract_cookie(&login, "refresh_token").unwrap();
    let cookie = format!("refresh_token={refresh_value}");

    let first = harness
        .app
        .clone()
        .oneshot(post_with_cookie("/api/authorization/logout", &cookie))
        .await
        .unwrap();
    assert_eq!(first.status(), HttpStatus::OK);

    let tokens = harness.state.store.count_tokens_for_user(&user_id).await;
    assert_eq!(tokens.data, Some(0));

    // Same cookie again: still a success.
    let second = harness
        .app
        .clone()
        .oneshot(post_with_cookie("/api/authorization/logout", &cookie))
        .await
        .unwrap();
    assert_eq!(second.status(), HttpStatus::OK);

    // No cookie at all: also a success.
    let third = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/authorization/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(third.status(), HttpStatus::OK);
}

#[tokio::test]
async fn register_rejects_mismatched_passwords() {
    let harness = spawn_app().await;

    let response = harness
        .app
        .clone()
        .oneshot(post_json(
            "/api/authorization/register",
            json!({
                "login": "kim",
                "password": "password123",
                "confirmPassword": "password456"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::BAD_REQUEST);

    let count = harness.state.store.count_users_by_login("kim").await;
    assert_eq!(count.data, Some(0));
}

#[tokio::test]
async fn health_endpoint_reports_database() {
    let harness = spawn_app().await;

    let response = harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), HttpStatus::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["database"], json!(true));
}
