//! HTTP client tests against a mock OpenAI-compatible server.

use std::sync::Arc;
use std::time::Duration;

use debate_agents::{check_endpoint, EndpointConfig, OpenAiCompatClient};
use debate_coordination::{
    DebateConfig, DebateController, DebateStatus, InferenceClient, InferenceError, SamplingParams,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn client_for(server: &MockServer) -> OpenAiCompatClient {
    OpenAiCompatClient::new(EndpointConfig::new(format!("{}/v1", server.uri()))).unwrap()
}

#[tokio::test]
async fn test_invoke_sends_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gemma2:2b",
            "max_tokens": 800,
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "Is solar worth it?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Yes, mostly.")))
        .expect(1)
        .mount(&server)
        .await;

    let params = SamplingParams::new("gemma2:2b", 0.6, 800).with_system("be brief");
    let text = client_for(&server)
        .invoke("Is solar worth it?", &params)
        .await
        .unwrap();
    assert_eq!(text, "Yes, mostly.");
}

#[tokio::test]
async fn test_invoke_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = EndpointConfig::new(format!("{}/v1", server.uri())).with_api_key("sk-test");
    let client = OpenAiCompatClient::new(endpoint).unwrap();
    let text = client
        .invoke("hi", &SamplingParams::new("m", 0.5, 10))
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn test_non_success_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .invoke("hi", &SamplingParams::new("m", 0.5, 10))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        InferenceError::Status {
            status: 503,
            body: "overloaded".to_string()
        }
    );
}

#[tokio::test]
async fn test_reasoning_content_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": null, "reasoning_content": "thought it through" }
            }]
        })))
        .mount(&server)
        .await;

    let text = client_for(&server)
        .invoke("hi", &SamplingParams::new("m", 0.5, 10))
        .await
        .unwrap();
    assert_eq!(text, "thought it through");
}

#[tokio::test]
async fn test_empty_choices_is_empty_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .invoke("hi", &SamplingParams::new("m", 0.5, 10))
        .await
        .unwrap_err();
    assert_eq!(err, InferenceError::Empty);
}

#[tokio::test]
async fn test_garbage_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .invoke("hi", &SamplingParams::new("m", 0.5, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Parse(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let endpoint = EndpointConfig::new(format!("{}/v1", server.uri()))
        .with_timeout(Duration::from_millis(200));
    let client = OpenAiCompatClient::new(endpoint).unwrap();
    let err = client
        .invoke("hi", &SamplingParams::new("m", 0.5, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Timeout(_)));
}

#[tokio::test]
async fn test_check_endpoint_probes_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    assert!(check_endpoint(&format!("{}/v1", server.uri()), None).await);
    assert!(!check_endpoint(&format!("{}/v2", server.uri()), None).await);
}

#[tokio::test]
async fn test_full_debate_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "Renewable energy lowers emissions and reduces long term costs for most households.",
        )))
        .mount(&server)
        .await;

    let controller = DebateController::new(DebateConfig::default(), Arc::new(client_for(&server)))
        .unwrap();
    let run = controller.conduct("Should cities invest in renewables?", None).await;

    assert_eq!(run.status, DebateStatus::ConsensusReached);
    assert_eq!(run.rounds.len(), 1);
    // Three debaters plus one summary call.
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_server_error_fails_debate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let controller = DebateController::new(DebateConfig::default(), Arc::new(client_for(&server)))
        .unwrap();
    let run = controller.conduct("q", None).await;

    assert_eq!(run.status, DebateStatus::Failed);
    let summary = run.final_summary.unwrap();
    assert!(summary.contains("Analytical_Debater"));
    assert!(summary.contains("500"));
}
