//! Debate orchestrator — scores rounds, writes feedback and the final summary.
//!
//! Inference failures here never end a run: feedback and summary both fall
//! back to deterministic text built from the analysis.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::consensus::{extract_key_points, ConsensusAnalyzer, ConsensusResult};
use super::context::SharedContext;
use super::prompts::{self, SUMMARY_FACTS};
use super::state::AgentResponse;
use crate::inference::{InferenceClient, SamplingParams};

/// Persona and sampling settings of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorProfile {
    #[serde(default = "default_orchestrator_id")]
    pub id: String,
    pub model: String,
    #[serde(default = "default_orchestrator_temperature")]
    pub temperature: f32,
    #[serde(default = "default_orchestrator_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_orchestrator_prompt")]
    pub system_prompt: String,
}

fn default_orchestrator_id() -> String {
    "Orchestrator".to_string()
}

fn default_orchestrator_temperature() -> f32 {
    0.3
}

fn default_orchestrator_max_tokens() -> u32 {
    2000
}

fn default_orchestrator_prompt() -> String {
    "You are an expert debate orchestrator. Your role is to:\n\
     1. Analyze responses from the debaters\n\
     2. Determine if they have reached consensus\n\
     3. Provide feedback to help them converge\n\
     4. Synthesize final summaries when consensus is reached\n\
     Be objective, thorough, and focus on finding common ground."
        .to_string()
}

impl Default for OrchestratorProfile {
    fn default() -> Self {
        Self {
            id: default_orchestrator_id(),
            model: "llama3.2:3b".to_string(),
            temperature: default_orchestrator_temperature(),
            max_tokens: default_orchestrator_max_tokens(),
            system_prompt: default_orchestrator_prompt(),
        }
    }
}

impl OrchestratorProfile {
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams::new(&self.model, self.temperature, self.max_tokens)
            .with_system(&self.system_prompt)
    }
}

/// How the run is ending when the summary is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryOutcome {
    Consensus,
    MaxRounds { max_rounds: u32, last_similarity: f64 },
}

/// Scores rounds and talks to the debaters through feedback.
pub struct Orchestrator {
    profile: OrchestratorProfile,
    client: Arc<dyn InferenceClient>,
    analyzer: ConsensusAnalyzer,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("profile", &self.profile)
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        profile: OrchestratorProfile,
        client: Arc<dyn InferenceClient>,
        analyzer: ConsensusAnalyzer,
    ) -> Self {
        Self {
            profile,
            client,
            analyzer,
        }
    }

    pub fn analyzer(&self) -> &ConsensusAnalyzer {
        &self.analyzer
    }

    pub fn analyze(&self, responses: &[AgentResponse]) -> ConsensusResult {
        self.analyzer.analyze_responses(responses)
    }

    /// Fold an analysis into the context: key points become agreed facts on
    /// consensus, contradictions become disputed points otherwise.
    pub fn record_analysis(
        &self,
        responses: &[AgentResponse],
        analysis: &ConsensusResult,
        context: &mut SharedContext,
    ) {
        if analysis.consensus_reached {
            for resp in responses {
                for point in extract_key_points(&resp.text) {
                    context.add_agreed_fact(point);
                }
            }
        } else {
            for area in self.analyzer.identify_disagreement_areas(responses) {
                context.add_disputed_point(area);
            }
        }
    }

    /// Feedback for the next round. Falls back to a fixed message naming the
    /// current similarity when inference fails.
    pub async fn feedback(
        &self,
        question: &str,
        round: u32,
        responses: &[AgentResponse],
        analysis: &ConsensusResult,
    ) -> String {
        let strategies = self.analyzer.suggest_convergence_strategies(analysis);
        let prompt = prompts::feedback_prompt(
            question,
            round,
            responses,
            analysis,
            &strategies,
        );
        debug!(round, prompt_chars = prompt.len(), "Requesting orchestrator feedback");

        match self.client.invoke(&prompt, &self.profile.sampling()).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(round, error = %e, "Feedback generation failed, using fallback");
                fallback_feedback(analysis)
            }
        }
    }

    /// Analyze, update the context, then write feedback.
    /// Returns the feedback and whether another round is wanted.
    ///
    /// The controller runs these steps separately: `analyze` and
    /// `record_analysis` in its Analyzing phase, `feedback` only when the run
    /// continues. This is the single-call form for callers driving their own
    /// loop.
    pub async fn evaluate(
        &self,
        question: &str,
        responses: &[AgentResponse],
        round: u32,
        context: &mut SharedContext,
    ) -> (String, bool) {
        let analysis = self.analyze(responses);
        self.record_analysis(responses, &analysis, context);
        let feedback = self.feedback(question, round, responses, &analysis).await;
        (feedback, !analysis.consensus_reached)
    }

    /// Final answer for the run.
    pub async fn summarize(
        &self,
        question: &str,
        responses: &[&AgentResponse],
        context: &SharedContext,
        outcome: SummaryOutcome,
    ) -> String {
        let prompt = prompts::summary_prompt(
            question,
            responses,
            context.agreed_facts(),
            outcome == SummaryOutcome::Consensus,
        );
        debug!(prompt_chars = prompt.len(), "Requesting final summary");

        let mut summary = match self.client.invoke(&prompt, &self.profile.sampling()).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Summary generation failed, using fallback");
                fallback_summary(&e.to_string(), context.agreed_facts())
            }
        };

        if let SummaryOutcome::MaxRounds {
            max_rounds,
            last_similarity,
        } = outcome
        {
            summary.push_str(&max_rounds_note(max_rounds, last_similarity));
        }
        summary
    }
}

/// Feedback used when the orchestrator model cannot be reached.
pub fn fallback_feedback(analysis: &ConsensusResult) -> String {
    format!(
        "Continue refining your responses. Current similarity: {:.3}. Target: {}",
        analysis.average_similarity, analysis.threshold
    )
}

fn fallback_summary(cause: &str, agreed_facts: &[String]) -> String {
    let mut out = format!("Unable to generate summary due to technical error: {cause}.");
    if !agreed_facts.is_empty() {
        out.push_str("\n\nAgreed points:");
        for fact in agreed_facts.iter().take(SUMMARY_FACTS) {
            out.push_str("\n- ");
            out.push_str(fact);
        }
    }
    out
}

/// Appended to the summary when the round budget ran out.
pub fn max_rounds_note(max_rounds: u32, last_similarity: f64) -> String {
    format!(
        "\n\nNote: Consensus was not fully reached after {max_rounds} rounds. \
         Final similarity score: {last_similarity:.3}"
    )
}
