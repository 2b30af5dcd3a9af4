//! Router tests against the offline mock provider

use crate::create_router;
use crate::state::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use docintel_common::{
    config::AppConfig, embeddings::MockEmbedder, llm::MockGenerator, AppError, Generator,
    ModelGateway,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    app: Router,
    state: AppState,
    docs: TempDir,
    _out: TempDir,
}

fn harness_with(configure: impl FnOnce(&mut AppConfig)) -> Harness {
    let docs = tempfile::tempdir().unwrap();
    std::fs::write(
        docs.path().join("services.txt"),
        "Payment is due within 30 days of invoice. Late payments accrue interest.",
    )
    .unwrap();
    std::fs::write(
        docs.path().join("supply.txt"),
        "Supplier liability is unlimited. The agreement renews automatically each year.",
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.llm.provider = "mock".to_string();
    config.documents.source_dir = docs.path().to_path_buf();
    config.documents.index_path = out.path().join("vector_index.json");
    config.rate_limit.enabled = false;
    configure(&mut config);

    let state = AppState::new(config, ModelGateway::mock());
    let app = create_router(state.clone(), None).unwrap();
    Harness { app, state, docs, _out: out }
}

fn harness() -> Harness {
    harness_with(|_| {})
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

#[tokio::test]
async fn test_health_and_dashboard_page() {
    let h = harness();

    let (status, body) = send(&h.app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, headers, bytes) = send_raw(&h.app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert!(String::from_utf8(bytes).unwrap().contains("DocIntel"));
}

#[tokio::test]
async fn test_not_ready_until_documents_processed() {
    let h = harness();

    let (status, body) = send(&h.app, "GET", "/api/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["index"]["status"], "down");

    let (status, _) = send(&h.app, "POST", "/api/documents/process", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&h.app, "GET", "/api/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_question_before_index_is_configuration_error() {
    let h = harness();

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/qa/ask",
        Some(json!({ "question": "What are the payment terms?" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_process_then_ask() {
    let h = harness();

    let (status, body) = send(&h.app, "POST", "/api/documents/process", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"], 2);
    assert_eq!(body["chunks"], 2);
    assert!(h.state.config.documents.index_path.exists());

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/qa/ask",
        Some(json!({ "question": "When is payment due after invoice?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sources: Vec<&str> = body["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(sources, vec!["services.txt", "supply.txt"]);
    assert!(body["answer"].as_str().unwrap().contains("services.txt"));
}

#[tokio::test]
async fn test_process_subfolder_of_source() {
    let h = harness();
    let nda = h.docs.path().join("nda");
    std::fs::create_dir(&nda).unwrap();
    std::fs::write(nda.join("nda.txt"), "Confidential information stays secret.").unwrap();

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/documents/process",
        Some(json!({ "source_dir": "nda" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"], 1);

    let (_, status_body) = send(&h.app, "GET", "/api/status", None).await;
    assert_eq!(status_body["sources"], json!(["nda.txt"]));
}

#[tokio::test]
async fn test_process_folder_outside_source_is_rejected() {
    let h = harness();
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("creds.txt"), "db_password=hunter2").unwrap();

    for requested in [json!(outside.path()), json!("../"), json!("")] {
        let (status, body) = send(
            &h.app,
            "POST",
            "/api/documents/process",
            Some(json!({ "source_dir": requested })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{requested}");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    let (_, status_body) = send(&h.app, "GET", "/api/status", None).await;
    assert_eq!(status_body["documents_loaded"], false);

    let (status, _) = send(
        &h.app,
        "POST",
        "/api/qa/ask",
        Some(json!({ "question": "db_password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_process_empty_folder_is_document_error() {
    let h = harness();
    std::fs::create_dir(h.docs.path().join("empty")).unwrap();

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/documents/process",
        Some(json!({ "source_dir": "empty" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "DOCUMENT_ERROR");
}

#[tokio::test]
async fn test_blank_question_is_rejected() {
    let h = harness();
    send(&h.app, "POST", "/api/documents/process", None).await;

    let (status, body) = send(&h.app, "POST", "/api/qa/ask", Some(json!({ "question": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_full_run_report_and_download() {
    let h = harness();
    send(&h.app, "POST", "/api/documents/process", None).await;

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/analysis/run",
        Some(json!({ "question": "Which contract carries the most risk?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["trace"],
        json!(["ANSWER_QUESTION", "SUMMARIZE", "ASSESS_RISK", "COMPOSE_REPORT"])
    );
    assert_eq!(body["agent_calls"], 4);
    assert_eq!(body["agents"][0], "RAG Agent");
    let report = body["report"].as_str().unwrap();
    assert!(report.starts_with("\n# DOCUMENT INTELLIGENCE REPORT"));
    assert!(report.contains("**Q:** Which contract carries the most risk?"));

    let (status, body) = send(&h.app, "GET", "/api/analysis/report", None).await;
    assert_eq!(status, StatusCode::OK);
    let high = body["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["kind"] == "item" && b["severity"] == "high");
    assert!(high);

    let (status, headers, bytes) =
        send_raw(&h.app, "GET", "/api/analysis/report/download", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/markdown"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("document_intelligence_report.md"));
    assert_eq!(String::from_utf8(bytes).unwrap(), report);

    let (_, status_body) = send(&h.app, "GET", "/api/status", None).await;
    assert_eq!(status_body["agent_calls"], 4);
    assert_eq!(status_body["has_report"], true);
}

#[tokio::test]
async fn test_run_without_question_skips_answer() {
    let h = harness();
    send(&h.app, "POST", "/api/documents/process", None).await;

    let (status, body) = send(&h.app, "POST", "/api/analysis/run", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trace"], json!(["SUMMARIZE", "ASSESS_RISK", "COMPOSE_REPORT"]));
    assert!(body["qa_answer"].is_null());
    assert!(body["report"].as_str().unwrap().contains("**A:** N/A"));
}

#[tokio::test]
async fn test_run_and_report_need_documents() {
    let h = harness();

    let (status, _) = send(&h.app, "POST", "/api/analysis/run", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&h.app, "GET", "/api/analysis/report", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _, _) = send_raw(&h.app, "GET", "/api/analysis/report/download", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_clears_session() {
    let h = harness();
    send(&h.app, "POST", "/api/documents/process", None).await;
    send(&h.app, "POST", "/api/analysis/run", None).await;

    let (status, _) = send(&h.app, "POST", "/api/documents/reset", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&h.app, "GET", "/api/status", None).await;
    assert_eq!(body["documents_loaded"], false);
    assert_eq!(body["agent_calls"], 0);
    assert_eq!(body["has_report"], false);
}

#[tokio::test]
async fn test_persisted_index_is_restored() {
    let h = harness();
    send(&h.app, "POST", "/api/documents/process", None).await;

    // Fresh state over the same configuration, as after a restart
    let restarted = AppState::new((*h.state.config).clone(), ModelGateway::mock());
    restarted.restore_index().await;

    let app = create_router(restarted, None).unwrap();
    let (_, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(body["documents_loaded"], true);
    assert_eq!(body["chunks"], 2);
    assert!(h.docs.path().exists());
}

#[tokio::test]
async fn test_model_routes_are_rate_limited() {
    let h = harness_with(|config| {
        config.rate_limit.enabled = true;
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
    });

    let question = json!({ "question": "What are the payment terms?" });
    let (first, _) = send(&h.app, "POST", "/api/qa/ask", Some(question.clone())).await;
    let (second, body) = send(&h.app, "POST", "/api/qa/ask", Some(question)).await;

    assert_ne!(first, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");

    // Status is not a model route
    let (status, _) = send(&h.app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
}

/// Mock generations, except the risk prompt which fails upstream
struct RiskOutage;

#[async_trait]
impl Generator for RiskOutage {
    async fn generate(&self, prompt: &str) -> docintel_common::Result<String> {
        if prompt.starts_with("List the top 3 risks") {
            return Err(AppError::provider("bedrock", "ThrottlingException"));
        }
        let canned = MockGenerator::new();
        canned.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        "risk-outage"
    }
}

#[tokio::test]
async fn test_run_aborted_by_provider_returns_partial_record() {
    let mut h = harness();
    let models = ModelGateway::new(
        "bedrock",
        Arc::new(RiskOutage),
        Arc::new(MockEmbedder::new(256)),
    );
    let state = AppState::new((*h.state.config).clone(), models);
    h.app = create_router(state, None).unwrap();
    send(&h.app, "POST", "/api/documents/process", None).await;

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/analysis/run",
        Some(json!({ "question": "When is payment due?" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "MODEL_PROVIDER_ERROR");
    assert!(body["error"]["message"].is_string());

    let partial = &body["error"]["details"]["partial_record"];
    assert_eq!(
        partial["trace"],
        json!(["ANSWER_QUESTION", "SUMMARIZE", "ASSESS_RISK"])
    );
    assert!(partial["qa_answer"].is_string());
    assert!(partial["summary"].is_string());
    assert!(partial["risk_findings"].is_null());
    assert!(partial["report"].is_null());

    let (status, _) = send(&h.app, "GET", "/api/analysis/report", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
