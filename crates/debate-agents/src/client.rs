//! OpenAI-compatible chat-completions client.
//!
//! Works against Ollama, llama.cpp server and vLLM: all expose
//! `POST {base}/chat/completions` with the same request shape.

use async_trait::async_trait;
use debate_coordination::{InferenceClient, InferenceError, SamplingParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EndpointConfig;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
}

/// [`InferenceClient`] over an OpenAI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    endpoint: EndpointConfig,
}

impl OpenAiCompatClient {
    pub fn new(endpoint: EndpointConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(endpoint.request_timeout)
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.endpoint.request_timeout.as_secs())
        } else {
            InferenceError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl InferenceClient for OpenAiCompatClient {
    async fn invoke(&self, prompt: &str, params: &SamplingParams) -> Result<String, InferenceError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = params.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &params.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let mut builder = self
            .http
            .post(self.endpoint.chat_completions_url())
            .json(&request);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(e)
            } else {
                InferenceError::Parse(e.to_string())
            }
        })?;

        let choice = chat.choices.into_iter().next().ok_or(InferenceError::Empty)?;
        let text = match (choice.message.content, choice.message.reasoning_content) {
            (Some(content), _) if !content.trim().is_empty() => content,
            (_, Some(reasoning)) => reasoning,
            (Some(content), None) => content,
            (None, None) => return Err(InferenceError::Empty),
        };

        debug!(model = %params.model, chars = text.len(), "Completion received");
        Ok(text)
    }
}
