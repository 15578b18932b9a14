//! Live endpoint tests — require an OpenAI-compatible server (Ollama by
//! default, see DEBATE_BASE_URL) with the default debater models pulled.
//!
//! All tests are `#[ignore]` — run with `cargo test -p debate-agents -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use debate_agents::{check_endpoint, EndpointConfig, OpenAiCompatClient};
use debate_coordination::{
    DebateConfig, DebateController, DebateStatus, InferenceClient, SamplingParams,
};

#[tokio::test]
#[ignore]
async fn test_endpoint_reachable() {
    let endpoint = EndpointConfig::default();
    assert!(
        check_endpoint(&endpoint.base_url, endpoint.api_key.as_deref()).await,
        "{} is not reachable — start the inference server first",
        endpoint.base_url
    );
}

#[tokio::test]
#[ignore]
async fn test_single_completion() {
    let client = OpenAiCompatClient::new(EndpointConfig::default()).unwrap();
    let text = client
        .invoke(
            "Reply with the single word: ready",
            &SamplingParams::new("llama3.2:3b", 0.0, 16),
        )
        .await
        .unwrap();
    assert!(!text.trim().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_one_round_debate() {
    let client = OpenAiCompatClient::new(EndpointConfig::default()).unwrap();
    let controller = DebateController::new(DebateConfig::default(), Arc::new(client)).unwrap();

    let run = tokio::time::timeout(
        Duration::from_secs(600),
        controller.conduct("Is remote work good for productivity?", Some(1)),
    )
    .await
    .expect("debate finished within ten minutes");

    assert_ne!(run.status, DebateStatus::Failed, "{:?}", run.final_summary);
    assert_eq!(run.rounds.len(), 1);
    assert!(run.final_summary.is_some());
}
