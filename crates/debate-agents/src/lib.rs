//! Runtime wiring for the debate engine: an OpenAI-compatible
//! [`InferenceClient`](debate_coordination::InferenceClient), endpoint
//! configuration and report rendering for the `debate-agents` binary.

pub mod client;
pub mod config;
pub mod report;

pub use client::OpenAiCompatClient;
pub use config::{check_endpoint, EndpointConfig};
