//! Runs `LlmProvider` against local fake servers speaking each wire
//! protocol, so the whole path from credential to request body is checked
//! offline.

use polyllm_core::credential::{self, ConfigSnapshot};
use polyllm_core::{ErrorKind, LlmProvider, LlmProviderBuilder, ModelMessage, ProviderKind};
use polyllm_test_model::http::{CannedResponse, FakeHttpServer};
use serde_json::Value;

const CHAT_COMPLETION: &str = r#"{
    "choices": [{ "message": { "content": "ok" }, "finish_reason": "stop" }]
}"#;

const GENERATE_CONTENT: &str = r#"{
    "candidates": [{ "content": { "parts": [{ "text": "ok" }] }, "finishReason": "STOP" }]
}"#;

fn body(server: &FakeHttpServer, index: usize) -> Value {
    serde_json::from_str(&server.received_requests()[index].body).unwrap()
}

#[tokio::test]
async fn test_clamped_budget_is_what_goes_on_the_wire() {
    let server = FakeHttpServer::start([
        CannedResponse::json(200, CHAT_COMPLETION),
        CannedResponse::json(200, CHAT_COMPLETION),
    ])
    .await
    .unwrap();
    let base_url = format!("{}/v1", server.base_url());

    let openai = LlmProvider::new("openai", "sk-test", &base_url, "gpt-4o").unwrap();
    let output = openai
        .call([ModelMessage::user("Write a long essay")], 65_000, None)
        .await
        .unwrap();
    assert_eq!(output.content, "ok");
    assert!(output.was_clamped());
    assert_eq!(output.max_completion_tokens, 16_384);
    assert_eq!(body(&server, 0)["max_completion_tokens"], 16_384);

    let groq =
        LlmProvider::new("groq", "gsk-test", &base_url, "openai/gpt-oss-120b").unwrap();
    let output = groq
        .call([ModelMessage::user("Write a long essay")], 65_000, None)
        .await
        .unwrap();
    assert!(!output.was_clamped());
    assert_eq!(body(&server, 1)["max_completion_tokens"], 65_000);
}

#[tokio::test]
async fn test_gemini_budget_is_clamped_per_model_family() {
    let server = FakeHttpServer::start([
        CannedResponse::json(200, GENERATE_CONTENT),
        CannedResponse::json(200, GENERATE_CONTENT),
    ])
    .await
    .unwrap();
    let base_url = format!("{}/v1beta", server.base_url());

    for model in ["gemini-2.0-flash", "gemini-2.5-flash"] {
        let provider = LlmProvider::new("gemini", "g-test", &base_url, model).unwrap();
        let output = provider
            .call([ModelMessage::user("Write a long essay")], 65_000, None)
            .await
            .unwrap();
        assert_eq!(output.content, "ok");
    }
    assert_eq!(body(&server, 0)["generationConfig"]["maxOutputTokens"], 8_192);
    assert_eq!(body(&server, 1)["generationConfig"]["maxOutputTokens"], 65_000);
}

#[tokio::test]
async fn test_secret_from_file_with_trailing_newline() {
    let server = FakeHttpServer::start([CannedResponse::json(200, CHAT_COMPLETION)])
        .await
        .unwrap();
    let config: ConfigSnapshot =
        [("OPENAI_API_KEY", "sk-abc\n")].into_iter().collect();
    let credential = credential::resolve_for(ProviderKind::OpenAI, &config).unwrap();

    let provider = LlmProviderBuilder::with_provider(ProviderKind::OpenAI)
        .with_credential(credential)
        .with_base_url(format!("{}/v1", server.base_url()))
        .build();
    assert!(provider.verify_connection().await.is_verified());
    assert_eq!(
        server.received_requests()[0].header("authorization"),
        Some("Bearer sk-abc")
    );
}

#[tokio::test]
async fn test_key_unusable_as_header_is_authentication() {
    let server = FakeHttpServer::start(Vec::new()).await.unwrap();
    for (tag, base_url) in [
        ("openai", format!("{}/v1", server.base_url())),
        ("gemini", format!("{}/v1beta", server.base_url())),
    ] {
        let provider = LlmProvider::new(tag, "key\nwith-newline", &base_url, "").unwrap();
        let err = provider
            .call([ModelMessage::user("Hi")], 10, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication, "{tag}");
    }
    assert!(server.received_requests().is_empty());
}

#[tokio::test]
async fn test_verify_connection_reports_backend_failure() {
    let server = FakeHttpServer::start([CannedResponse::json(
        401,
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    )])
    .await
    .unwrap();
    let provider = LlmProvider::new(
        "openai",
        "sk-revoked",
        &format!("{}/v1", server.base_url()),
        "gpt-4o-mini",
    )
    .unwrap();

    let check = provider.verify_connection().await;
    let err = check.error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.provider(), Some(ProviderKind::OpenAI));
    assert_eq!(body(&server, 0)["max_completion_tokens"], 1_024);
}
