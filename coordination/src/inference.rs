//! Text-completion seam consumed by debaters and the orchestrator.
//!
//! The engine never talks to a model server directly. Anything that can turn
//! a prompt into text implements [`InferenceClient`]; the runtime crate ships
//! an OpenAI-compatible HTTP implementation and tests use scripted fakes.
//! Timeouts and retries are the implementation's business, not the engine's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by an [`InferenceClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// Transport-level failure (connection refused, DNS, reset).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend did not answer within the client's deadline.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered but the payload could not be decoded.
    #[error("unreadable response: {0}")]
    Parse(String),

    /// The backend answered with no completion choices.
    #[error("backend returned no completion")]
    Empty,
}

/// Sampling parameters for a single completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Model name as the backend knows it.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Optional system message sent ahead of the prompt.
    pub system: Option<String>,
}

impl SamplingParams {
    pub fn new(model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens,
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Anything that can complete a prompt.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Complete `prompt` with the given sampling parameters.
    async fn invoke(&self, prompt: &str, params: &SamplingParams)
        -> Result<String, InferenceError>;
}
