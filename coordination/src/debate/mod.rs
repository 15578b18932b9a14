//! Debate Orchestration — Multi-Debater Consensus Loop
//!
//! Several debaters answer a question concurrently, an orchestrator scores
//! how far their answers agree, and the run either stops or goes another
//! round seeded with feedback and the shared context.
//!
//! # Debate Flow
//!
//! ```text
//! Init → CollectingInitial → Analyzing → [next_state?]
//!                               ▲            │
//!                               │            ├─ round ≥ max_rounds → FinalizingMaxRounds → Terminal
//!                               │            ├─ consensus          → FinalizingConsensus → Terminal
//!                               │            └─ otherwise          → Feedback
//!                               │                                      │
//!                               └──────── CollectingRebuttal ◄─────────┘
//!
//!   debater failure while collecting → Failed → Terminal
//! ```

pub mod agent;
pub mod concepts;
pub mod config;
pub mod consensus;
pub mod context;
pub mod controller;
pub mod embedding;
pub mod errors;
pub mod orchestrator;
pub mod prompts;
pub mod state;

pub use agent::{DebaterAgent, DebaterProfile, RebuttalInput, ResponseLimits};
pub use concepts::{ConceptExtractor, SignalPhraseExtractor};
pub use config::DebateConfig;
pub use consensus::{extract_key_points, normalize, ConsensusAnalyzer, ConsensusResult};
pub use context::{ContextView, SharedContext};
pub use controller::{DebateController, DebateControllerBuilder};
pub use embedding::{
    cosine_similarity, EmbeddingStrategy, HashedEmbedding, SimilarityMethod, TfIdfEmbedding,
};
#[cfg(feature = "local-embeddings")]
pub use embedding::LocalSemanticEmbedding;
pub use errors::DebateError;
pub use orchestrator::{Orchestrator, OrchestratorProfile, SummaryOutcome};
pub use state::{
    next_state, AgentResponse, DebatePhase, DebateRun, DebateStatus, DebateTransition,
    RoundRecord, TransitionError,
};
