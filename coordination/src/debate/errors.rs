//! Error taxonomy for debate runs.
//!
//! | Variant         | Fatal | Raised by                                     |
//! |-----------------|-------|-----------------------------------------------|
//! | `Inference`     | yes*  | debater fan-out (fatal), orchestrator (recovered locally) |
//! | `Configuration` | yes   | config validation, bad `conduct` arguments    |
//! | `Content`       | no    | response length checks                        |
//! | `Workflow`      | yes   | illegal FSM transition, panicked agent task   |
//!
//! `conduct` never returns these to its caller: they end up as the diagnostic
//! summary of a `Failed` run.

use thiserror::Error;

use crate::inference::InferenceError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DebateError {
    /// The text-completion backend failed for a named participant.
    #[error("inference failure for {participant}: {source}")]
    Inference {
        participant: String,
        #[source]
        source: InferenceError,
    },

    /// Configuration or call arguments are invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A response was empty, too short or too long. Never aborts a run.
    #[error("content error from {agent}: {reason}")]
    Content { agent: String, reason: String },

    /// The state machine reached a state it should not be able to reach.
    #[error("workflow error: {0}")]
    Workflow(String),
}

impl DebateError {
    pub fn inference(participant: impl Into<String>, source: InferenceError) -> Self {
        Self::Inference {
            participant: participant.into(),
            source,
        }
    }

    pub fn content(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Content {
            agent: agent.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error ends the run when it escapes the fan-out.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Content { .. })
    }
}
