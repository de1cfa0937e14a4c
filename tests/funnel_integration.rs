//! Integration tests for the funnel HTTP surface.
//!
//! Each test spins up the full router on a random port with a stub verify
//! provider and two local webhook receivers, then drives it with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use lead_funnel::config::{DispatchConfig, ServerConfig};
use lead_funnel::dispatch::LeadDispatcher;
use lead_funnel::error::ProviderError;
use lead_funnel::otp::{
    HttpOtpClient, OtpGateway, OtpService, Verification, VerificationCheck, VerifyChannel,
    VerifyProvider,
};
use lead_funnel::quiz::{QuizEngine, SessionStore};
use lead_funnel::server::build_router;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts "123456" and nothing else. Rejects numbers ending in 0000.
struct StubVerify;

#[async_trait]
impl VerifyProvider for StubVerify {
    fn name(&self) -> &str {
        "stub"
    }

    async fn start_verification(
        &self,
        to: &str,
        _channel: VerifyChannel,
    ) -> Result<Verification, ProviderError> {
        if to.ends_with("0000") {
            return Err(ProviderError {
                code: Some(60200),
                http_status: Some(400),
                message: "Invalid parameter `To`".into(),
            });
        }
        Ok(Verification {
            status: "pending".into(),
            sid: Some("VE123".into()),
        })
    }

    async fn check_verification(
        &self,
        _to: &str,
        code: &str,
    ) -> Result<VerificationCheck, ProviderError> {
        let status = if code == "123456" { "approved" } else { "pending" };
        Ok(VerificationCheck {
            status: status.into(),
        })
    }
}

/// Bodies received by one webhook receiver.
type Hits = Arc<Mutex<Vec<Bytes>>>;

async fn record_hit(State(hits): State<Hits>, body: Bytes) -> &'static str {
    hits.lock().unwrap().push(body);
    "ok"
}

async fn spawn(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

struct TestServer {
    base: String,
    primary: Hits,
    backup: Hits,
}

/// Start the two webhook receivers and the funnel server.
async fn start_server() -> TestServer {
    let primary: Hits = Arc::default();
    let backup: Hits = Arc::default();
    let hooks = Router::new()
        .route("/primary", post(record_hit).with_state(Arc::clone(&primary)))
        .route("/backup", post(record_hit).with_state(Arc::clone(&backup)));
    let hook_port = spawn(hooks).await;

    let dispatch_config = DispatchConfig {
        primary_url: format!("http://127.0.0.1:{hook_port}/primary"),
        backup_url: Some(format!("http://127.0.0.1:{hook_port}/backup")),
    };
    let otp: Arc<dyn OtpService> = Arc::new(OtpGateway::new(Arc::new(StubVerify)));
    let engine = Arc::new(QuizEngine::new(
        SessionStore::new(Duration::from_secs(60)),
        Arc::clone(&otp),
        Arc::new(LeadDispatcher::from_config(&dispatch_config)),
    ));
    let app = build_router(otp, engine, &ServerConfig::default());
    let port = spawn(app).await;

    // Give the servers a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        primary,
        backup,
    }
}

async fn post_json(url: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn wait_for_hits(hits: &Hits, expected: usize) {
    for _ in 0..100 {
        if hits.lock().unwrap().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn full_quiz_submits_to_both_webhooks() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, session) = post_json(
            &format!("{}/api/quiz", server.base),
            json!({ "variant": "B" }),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(session["show_before_after_image"], true);
        let id = session["id"].as_str().unwrap().to_string();
        let quiz = format!("{}/api/quiz/{id}", server.base);

        for value in ["yes", "epoxy", "Dana", "Roanoke", "24011", "dana@example.com"] {
            let (status, _) = post_json(&format!("{quiz}/answer"), json!({ "value": value })).await;
            assert_eq!(status, 200, "answer {value}");
        }

        let (status, session) =
            post_json(&format!("{quiz}/send-code"), json!({ "phone": "(540) 123-4567" })).await;
        assert_eq!(status, 200);
        assert_eq!(session["progress"], 85);
        assert_eq!(session["phone_display"], "Code sent to: (540) 123-4567");

        let (status, body) =
            post_json(&format!("{quiz}/verify-code"), json!({ "code": "999999" })).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);

        let (status, session) =
            post_json(&format!("{quiz}/verify-code"), json!({ "code": "123456" })).await;
        assert_eq!(status, 200);
        assert_eq!(session["step"], "complete");
        assert_eq!(session["progress"], 100);

        wait_for_hits(&server.primary, 1).await;
        wait_for_hits(&server.backup, 1).await;

        let primary = server.primary.lock().unwrap().clone();
        assert_eq!(primary.len(), 1);
        let lead: Value = serde_json::from_slice(&primary[0]).unwrap();
        assert_eq!(lead["name"], "Dana");
        assert_eq!(lead["phone_verified"], "yes");
        assert_eq!(lead["ab_variant"], "B");

        let backup = server.backup.lock().unwrap().clone();
        assert_eq!(backup.len(), 1);
        let form = String::from_utf8_lossy(&backup[0]);
        assert!(form.contains("name=\"email\""));
        assert!(form.contains("dana@example.com"));

        // Completed sessions accept nothing further.
        let (status, _) =
            post_json(&format!("{quiz}/verify-code"), json!({ "code": "123456" })).await;
        assert_eq!(status, 409);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn otp_endpoints_gate_methods() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{}/api/send-otp", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 405);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Method not allowed");

        let resp = client
            .request(reqwest::Method::OPTIONS, format!("{}/api/verify-otp", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let (status, body) =
            post_json(&format!("{}/api/send-otp", server.base), json!({})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Phone number is required");

        let (status, body) = post_json(
            &format!("{}/api/send-otp", server.base),
            json!({ "phone": "5405550000" }),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(
            body["error"],
            "Invalid phone number. Please check and try again."
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn http_client_round_trip() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let client = HttpOtpClient::new(&server.base);

        let reply = client.send_otp("(540) 123-4567").await.unwrap();
        assert_eq!(reply.status.as_deref(), Some("pending"));

        let err = client.verify_otp("5401234567", "111111").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid code. Please try again.");

        client.verify_otp("5401234567", "123456").await.unwrap();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn bad_zip_is_unprocessable() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (_, session) = post_json(&format!("{}/api/quiz", server.base), json!({})).await;
        let id = session["id"].as_str().unwrap().to_string();
        let quiz = format!("{}/api/quiz/{id}", server.base);

        for value in ["yes", "epoxy", "Dana", "Roanoke"] {
            post_json(&format!("{quiz}/answer"), json!({ "value": value })).await;
        }

        let (status, body) = post_json(&format!("{quiz}/answer"), json!({ "value": "2401" })).await;
        assert_eq!(status, 422);
        assert_eq!(body["field"], "zip");
        assert_eq!(body["placeholder"], "Enter a valid 5-digit zip code");

        let session: Value = reqwest::get(&quiz).await.unwrap().json().await.unwrap();
        assert_eq!(session["step"], "zip");
        assert!(server.primary.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}
