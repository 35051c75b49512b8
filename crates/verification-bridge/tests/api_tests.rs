//! Integration tests for the verification bridge API.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use code_ledger::{ManualClock, VerificationLedger, DEFAULT_CODE_TTL};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telegram_client::TelegramClient;
use tempfile::TempDir;
use tower::ServiceExt;
use verification_bridge::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    DeliveryAddress, DispatchError, Dispatcher, HandleDirectory, LocalRegistrationBackend,
    Store, VerificationService,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Dispatcher that records what would have been sent, optionally failing.
#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<(DeliveryAddress, String)>>,
    fail: bool,
}

impl RecordingDispatcher {
    fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, text) = sent.last().expect("nothing sent");
        text.chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, address: DeliveryAddress, text: &str) -> Result<(), DispatchError> {
        self.sent.lock().unwrap().push((address, text.to_string()));
        if self.fail {
            return Err(DispatchError::Other("Forbidden: bot was blocked by the user".into()));
        }
        Ok(())
    }
}

struct TestApp {
    router: Router,
    service: Arc<VerificationService>,
    dispatcher: Arc<RecordingDispatcher>,
    clock: ManualClock,
}

/// Create a test app with memory-only storage and a recording dispatcher.
fn create_test_app() -> TestApp {
    create_test_app_with(RecordingDispatcher::default(), RateLimitState::permissive())
}

fn create_test_app_with(dispatcher: RecordingDispatcher, limits: RateLimitState) -> TestApp {
    let clock = ManualClock::default();
    let dispatcher = Arc::new(dispatcher);
    let service = Arc::new(VerificationService::new(
        Arc::new(HandleDirectory::new(Store::memory())),
        VerificationLedger::with_clock(DEFAULT_CODE_TTL, Arc::new(clock.clone())),
        dispatcher.clone(),
        Arc::new(LocalRegistrationBackend),
    ));
    let router = create_router_with_rate_limit(AppState::new(service.clone()), limits);

    TestApp {
        router,
        service,
        dispatcher,
        clock,
    }
}

async fn post_json(
    router: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    app.service.directory().register("student1", 42).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["handles"], 1);
    assert_eq!(json["pending_codes"], 0);
}

#[tokio::test]
async fn test_send_code_missing_handle() {
    let app = create_test_app();

    let (status, json) =
        post_json(&app.router, "/api/auth/send-verification-code", serde_json::json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "telegram is required");
}

#[tokio::test]
async fn test_send_code_unregistered_handle() {
    let app = create_test_app();

    let (status, json) = post_json(
        &app.router,
        "/api/auth/send-verification-code",
        serde_json::json!({"telegram": "student1"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_REGISTERED");
    assert_eq!(app.service.ledger().pending_count().await, 0);
    assert!(app.dispatcher.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_and_verify_code() {
    let app = create_test_app();
    app.service.directory().register("Student1", 42).await;

    let (status, json) = post_json(
        &app.router,
        "/api/auth/send-verification-code",
        serde_json::json!({"telegram": "student1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"success": true}));

    let code = app.dispatcher.last_code();
    assert_eq!(app.dispatcher.sent.lock().unwrap()[0].0, 42);

    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "STUDENT1", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_verify_wrong_then_right_code() {
    let app = create_test_app();
    app.service.directory().register("student1", 42).await;
    app.service.issue_code("student1").await.unwrap();
    let code = app.dispatcher.last_code();
    let wrong = if code == "100000" { "100001" } else { "100000" };

    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1", "code": wrong}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MISMATCH");

    let (status, _) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_expired_code() {
    let app = create_test_app();
    app.service.directory().register("student1", 42).await;
    app.service.issue_code("student1").await.unwrap();
    let code = app.dispatcher.last_code();

    app.clock.advance(DEFAULT_CODE_TTL + Duration::from_secs(1));

    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EXPIRED");
    assert_eq!(app.service.ledger().pending_count().await, 0);
}

#[tokio::test]
async fn test_verify_missing_code() {
    let app = create_test_app();

    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "code is required");
}

#[tokio::test]
async fn test_malformed_body() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/verify-code")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_missing_field() {
    let app = create_test_app();

    let (status, json) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "fullName": "Ali Valiyev",
            "studentId": "S-1",
            "phone": "+998901234567",
            "telegram": "ali_v",
            "login": "ali01",
            "password": "hunter2"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "email is required");
}

#[tokio::test]
async fn test_register_notifies_known_handle() {
    let app = create_test_app();
    app.service.directory().register("ali_v", 9).await;

    let (status, json) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "fullName": "Ali Valiyev",
            "studentId": "S-1",
            "email": "ali@example.com",
            "phone": "+998901234567",
            "telegram": "@Ali_V",
            "login": "ali01",
            "password": "hunter2"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(!json["userId"].as_str().unwrap().is_empty());

    let sent = app.dispatcher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 9);
    assert!(sent[0].1.contains("Congratulations, Ali Valiyev!"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/auth/verify-code")
                .header("origin", "https://register.example.edu")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "x-student-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_verify_attempts_limited_per_handle() {
    let app = create_test_app_with(RecordingDispatcher::default(), RateLimitState::new(10, 2));
    app.service.directory().register("student1", 42).await;
    app.service.issue_code("student1").await.unwrap();
    let code = app.dispatcher.last_code();
    let wrong = if code == "100000" { "100001" } else { "100000" };

    for _ in 0..2 {
        let (status, json) = post_json(
            &app.router,
            "/api/auth/verify-code",
            serde_json::json!({"telegram": "student1", "code": wrong}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MISMATCH");
    }

    // Budget spent: even the right code is refused for now.
    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "STUDENT1", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(app.service.ledger().pending_count().await, 1);

    // Other handles keep their own budget.
    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student2", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_send_code_limited_per_handle() {
    let app = create_test_app_with(RecordingDispatcher::default(), RateLimitState::new(1, 10));
    app.service.directory().register("student1", 42).await;

    let body = serde_json::json!({"telegram": "student1"});
    let (status, _) = post_json(&app.router, "/api/auth/send-verification-code", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = post_json(&app.router, "/api/auth/send-verification-code", body).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "Too many attempts for student1, try again later");
    assert_eq!(app.dispatcher.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_verify_accepts_numeric_code() {
    let app = create_test_app();
    app.service.directory().register("student1", 42).await;
    app.service.issue_code("student1").await.unwrap();
    let code: u32 = app.dispatcher.last_code().parse().unwrap();

    let (status, json) = post_json(
        &app.router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1", "code": code}),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_register_notice_failure_returns_500() {
    let failing = RecordingDispatcher {
        fail: true,
        ..Default::default()
    };
    let app = create_test_app_with(failing, RateLimitState::permissive());
    app.service.directory().register("ali_v", 9).await;

    let (status, json) = post_json(
        &app.router,
        "/api/register",
        serde_json::json!({
            "fullName": "Ali Valiyev",
            "studentId": "S-1",
            "email": "ali@example.com",
            "phone": "+998901234567",
            "telegram": "ali_v",
            "login": "ali01",
            "password": "hunter2"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "DISPATCH_FAILURE");
    assert!(json["error"].as_str().unwrap().contains("blocked"));
}

#[tokio::test]
async fn test_end_to_end_with_telegram_and_file_directory() {
    let telegram_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("data").join("chat_ids.json");

    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .and(body_partial_json(serde_json::json!({"chat_id": 42})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {
                "message_id": 1,
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "text": "code"
            }
        })))
        .expect(1)
        .mount(&telegram_server)
        .await;

    // First run: the user links their chat, then the process restarts.
    {
        let directory = HandleDirectory::load_all(Store::file(&file)).await;
        directory.register("Student1", 42).await;
    }

    let telegram =
        TelegramClient::new(telegram_server.uri(), "test-token", Duration::from_secs(5)).unwrap();
    let service = Arc::new(VerificationService::new(
        Arc::new(HandleDirectory::load_all(Store::file(&file)).await),
        VerificationLedger::new(DEFAULT_CODE_TTL),
        Arc::new(telegram),
        Arc::new(LocalRegistrationBackend),
    ));
    let router =
        create_router_with_rate_limit(AppState::new(service.clone()), RateLimitState::permissive());

    let (status, json) = post_json(
        &router,
        "/api/auth/send-verification-code",
        serde_json::json!({"telegram": "student1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", json);

    let requests = telegram_server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = sent["text"].as_str().unwrap();
    let code: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    assert!(text.contains("valid for 10 minutes"));

    let (status, _) = post_json(
        &router,
        "/api/auth/verify-code",
        serde_json::json!({"telegram": "student1", "code": code}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(service.ledger().pending_count().await, 0);
}

#[tokio::test]
async fn test_telegram_failure_returns_500_and_keeps_code() {
    let telegram_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&telegram_server)
        .await;

    let telegram =
        TelegramClient::new(telegram_server.uri(), "test-token", Duration::from_secs(5)).unwrap();
    let service = Arc::new(VerificationService::new(
        Arc::new(HandleDirectory::new(Store::memory())),
        VerificationLedger::new(DEFAULT_CODE_TTL),
        Arc::new(telegram),
        Arc::new(LocalRegistrationBackend),
    ));
    service.directory().register("student1", 42).await;
    let router =
        create_router_with_rate_limit(AppState::new(service.clone()), RateLimitState::permissive());

    let (status, json) = post_json(
        &router,
        "/api/auth/send-verification-code",
        serde_json::json!({"telegram": "student1"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("blocked"));
    assert_eq!(service.ledger().pending_count().await, 1);
}
