//! Debate Coordination Library
//!
//! Deterministic core of the multi-agent debate engine:
//! - Round state machine with a recorded transition history
//! - Consensus detection over pluggable text embeddings
//! - Cross-round shared context with single-writer discipline
//! - Debater and orchestrator roles behind the [`InferenceClient`] seam
//!
//! Nothing here opens a socket. The `debate-agents` crate supplies the
//! HTTP-backed client and the command-line front end.
//!
//! # Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use debate_coordination::{DebateConfig, DebateController, InferenceClient};
//! # async fn demo(client: Arc<dyn InferenceClient>) -> Result<(), debate_coordination::DebateError> {
//! let controller = DebateController::new(DebateConfig::default(), client)?;
//! let run = controller.conduct("Is nuclear power worth the cost?", None).await;
//! println!("{}", run.status_line());
//! # Ok(())
//! # }
//! ```

pub mod debate;
pub mod inference;

pub use debate::{
    AgentResponse, ConsensusAnalyzer, ConsensusResult, DebateConfig, DebateController,
    DebateError, DebatePhase, DebateRun, DebateStatus, DebaterProfile, OrchestratorProfile,
    RoundRecord, SharedContext, SimilarityMethod,
};
pub use inference::{InferenceClient, InferenceError, SamplingParams};
