//! Debate controller — drives one run through the phase machine.
//!
//! ```text
//! Init → CollectingInitial → Analyzing ─┬─ round ≥ max      → FinalizingMaxRounds ─┐
//!            │                  ▲       ├─ consensus        → FinalizingConsensus ─┤
//!            │                  │       └─ otherwise → Feedback                    ├→ Terminal
//!            │        CollectingRebuttal ◄──────────────┘                          │
//!            └──────────┴─ agent failure → Failed ─────────────────────────────────┘
//! ```
//!
//! Each collecting phase fans every debater out on a [`JoinSet`] and waits for
//! all of them before moving on. The controller is the only writer of the
//! run's [`SharedContext`]; debaters see an `Arc<ContextView>` snapshot.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{error, info, warn, Instrument};

use super::agent::{DebaterAgent, RebuttalInput};
use super::concepts::ConceptExtractor;
use super::config::DebateConfig;
use super::context::{ContextView, SharedContext};
use super::consensus::ConsensusAnalyzer;
use super::embedding::EmbeddingStrategy;
use super::errors::DebateError;
use super::orchestrator::{Orchestrator, SummaryOutcome};
use super::state::{next_state, AgentResponse, DebatePhase, DebateRun, DebateStatus, RoundRecord};
use crate::inference::InferenceClient;

/// Builder for a [`DebateController`] with non-default collaborators.
pub struct DebateControllerBuilder {
    config: DebateConfig,
    client: Arc<dyn InferenceClient>,
    strategy: Option<Arc<dyn EmbeddingStrategy>>,
    concepts: Option<Arc<dyn ConceptExtractor>>,
}

impl DebateControllerBuilder {
    /// Use this embedding strategy instead of the configured similarity method.
    pub fn embedding_strategy(mut self, strategy: Arc<dyn EmbeddingStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn concept_extractor(mut self, extractor: Arc<dyn ConceptExtractor>) -> Self {
        self.concepts = Some(extractor);
        self
    }

    pub fn build(self) -> Result<DebateController, DebateError> {
        self.config.validate()?;

        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => Arc::from(self.config.similarity.build()?),
        };
        let analyzer = ConsensusAnalyzer::new(self.config.consensus_threshold, strategy);
        let orchestrator = Orchestrator::new(
            self.config.orchestrator.clone(),
            self.client.clone(),
            analyzer,
        );

        let limits = self.config.limits();
        let agents = self
            .config
            .debaters
            .iter()
            .map(|profile| {
                let agent = DebaterAgent::new(profile.clone(), self.client.clone(), limits);
                let agent = match &self.concepts {
                    Some(extractor) => agent.with_concept_extractor(extractor.clone()),
                    None => agent,
                };
                Arc::new(agent)
            })
            .collect();

        Ok(DebateController {
            config: self.config,
            agents,
            orchestrator,
        })
    }
}

/// Runs debates. Cheap to share: concurrent `conduct` calls only share the
/// immutable configuration and the inference client.
pub struct DebateController {
    config: DebateConfig,
    agents: Vec<Arc<DebaterAgent>>,
    orchestrator: Orchestrator,
}

impl std::fmt::Debug for DebateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateController")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl DebateController {
    /// Controller with the configured similarity method and the default
    /// concept extractor.
    pub fn new(config: DebateConfig, client: Arc<dyn InferenceClient>) -> Result<Self, DebateError> {
        Self::builder(config, client).build()
    }

    pub fn builder(config: DebateConfig, client: Arc<dyn InferenceClient>) -> DebateControllerBuilder {
        DebateControllerBuilder {
            config,
            client,
            strategy: None,
            concepts: None,
        }
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Debater ids in fan-out order.
    pub fn debater_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    /// Run one debate. Never fails: errors end up as a `Failed` run whose
    /// final summary names the cause.
    pub async fn conduct(&self, question: &str, max_rounds: Option<u32>) -> DebateRun {
        let max_rounds = max_rounds.unwrap_or(self.config.max_rounds);
        let mut run = DebateRun::new(question, max_rounds, self.config.consensus_threshold);
        let span = tracing::info_span!("debate", run_id = %run.id);

        async {
            info!(max_rounds, debaters = self.agents.len(), "Starting debate");
            let mut context = SharedContext::new();
            if let Err(e) = self.drive(&mut run, &mut context).await {
                fail(&mut run, e);
            }
            run.finish();
            info!(
                status = %run.status,
                rounds = run.current_round,
                duration_secs = run.duration_secs.unwrap_or_default(),
                "Debate finished"
            );
        }
        .instrument(span)
        .await;

        run
    }

    async fn drive(&self, run: &mut DebateRun, context: &mut SharedContext) -> Result<(), DebateError> {
        if run.question.trim().is_empty() {
            return Err(DebateError::Configuration("question must not be empty".into()));
        }
        if run.max_rounds == 0 {
            return Err(DebateError::Configuration("max_rounds must be at least 1".into()));
        }

        let question: Arc<str> = Arc::from(run.question.as_str());
        let mut rebuttal: Option<Arc<RebuttalInput>> = None;
        let mut collected: Option<Vec<AgentResponse>> = None;
        run.set_status(DebateStatus::InProgress);

        loop {
            match run.phase {
                DebatePhase::Init => {
                    advance(run, DebatePhase::CollectingInitial, "debate started")?;
                }

                DebatePhase::CollectingInitial | DebatePhase::CollectingRebuttal => {
                    let round = run.next_round_number();
                    let responses = self
                        .collect_round(&question, round, context.snapshot(), rebuttal.take())
                        .await?;
                    for (agent, response) in self.agents.iter().zip(&responses) {
                        agent.record(response, context);
                    }
                    collected = Some(responses);
                    advance(run, DebatePhase::Analyzing, "all debaters responded")?;
                }

                DebatePhase::Analyzing => {
                    let responses = collected.take().ok_or_else(|| {
                        DebateError::Workflow("analyzing without collected responses".into())
                    })?;
                    let round = run.next_round_number();
                    let analysis = self.orchestrator.analyze(&responses);
                    self.orchestrator
                        .record_analysis(&responses, &analysis, context);

                    info!(
                        round,
                        similarity = analysis.average_similarity,
                        reached = analysis.consensus_reached,
                        method = %analysis.method,
                        "Round analyzed"
                    );

                    let reached = analysis.consensus_reached;
                    run.record_round(RoundRecord {
                        round,
                        responses,
                        consensus: analysis,
                        feedback: None,
                        timestamp: Utc::now(),
                    });

                    let next = next_state(run.current_round, run.max_rounds, reached);
                    let reason = match next {
                        DebatePhase::FinalizingMaxRounds => "round budget exhausted",
                        DebatePhase::FinalizingConsensus => "consensus reached",
                        _ => "consensus not reached",
                    };
                    advance(run, next, reason)?;
                }

                DebatePhase::Feedback => {
                    let last = run.rounds.last_mut().ok_or_else(|| {
                        DebateError::Workflow("feedback requested before any round".into())
                    })?;
                    let feedback = self
                        .orchestrator
                        .feedback(&question, last.round, &last.responses, &last.consensus)
                        .await;
                    last.feedback = Some(feedback.clone());
                    rebuttal = Some(Arc::new(RebuttalInput {
                        previous_round: last.responses.clone(),
                        feedback,
                    }));
                    advance(run, DebatePhase::CollectingRebuttal, "feedback ready")?;
                }

                DebatePhase::FinalizingConsensus => {
                    let summary = self
                        .orchestrator
                        .summarize(&question, &run.all_responses(), context, SummaryOutcome::Consensus)
                        .await;
                    run.final_summary = Some(summary);
                    run.set_status(DebateStatus::ConsensusReached);
                    advance(run, DebatePhase::Terminal, "summary written")?;
                }

                DebatePhase::FinalizingMaxRounds => {
                    let outcome = SummaryOutcome::MaxRounds {
                        max_rounds: run.max_rounds,
                        last_similarity: run.last_similarity(),
                    };
                    let summary = self
                        .orchestrator
                        .summarize(&question, &run.all_responses(), context, outcome)
                        .await;
                    run.final_summary = Some(summary);
                    run.set_status(DebateStatus::MaxRoundsExceeded);
                    advance(run, DebatePhase::Terminal, "summary written")?;
                }

                DebatePhase::Failed => {
                    return Err(DebateError::Workflow("entered failed phase without an error".into()));
                }

                DebatePhase::Terminal => return Ok(()),
            }
        }
    }

    /// Fan out one round and wait for every debater.
    ///
    /// The first failure in debater order wins; a panicked task is reported
    /// as a workflow error naming the debater.
    async fn collect_round(
        &self,
        question: &Arc<str>,
        round: u32,
        view: Arc<ContextView>,
        rebuttal: Option<Arc<RebuttalInput>>,
    ) -> Result<Vec<AgentResponse>, DebateError> {
        let mut join_set: JoinSet<(usize, Result<AgentResponse, DebateError>)> = JoinSet::new();

        for (idx, agent) in self.agents.iter().enumerate() {
            let agent = agent.clone();
            let question = question.clone();
            let view = view.clone();
            let rebuttal = rebuttal.clone();

            join_set.spawn(async move {
                let result = agent
                    .respond(&question, round, &view, rebuttal.as_deref())
                    .await;
                (idx, result)
            });
        }

        let mut slots: Vec<Option<Result<AgentResponse, DebateError>>> =
            (0..self.agents.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => warn!(round, error = %e, "Debater task panicked"),
            }
        }

        let mut responses = Vec::with_capacity(slots.len());
        for (agent, slot) in self.agents.iter().zip(slots) {
            match slot {
                Some(Ok(response)) => responses.push(response),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(DebateError::Workflow(format!(
                        "debater {} task aborted in round {round}",
                        agent.id()
                    )))
                }
            }
        }
        Ok(responses)
    }
}

fn advance(run: &mut DebateRun, to: DebatePhase, reason: &str) -> Result<(), DebateError> {
    let from = run.phase;
    run.transition(to, reason)
        .map_err(|e| DebateError::Workflow(e.to_string()))?;
    info!(%from, %to, round = run.current_round, reason, "Phase transition");
    Ok(())
}

/// Convert an escaped error into the terminal `Failed` state.
fn fail(run: &mut DebateRun, err: DebateError) {
    error!(phase = %run.phase, round = run.current_round, error = %err, "Debate failed");

    let reason = err.to_string();
    if run.transition(DebatePhase::Failed, &reason).is_err() {
        // Failed is only reachable from collection phases; anything else is
        // a workflow fault and is forced.
        run.phase = DebatePhase::Failed;
    }
    if let Err(e) = run.transition(DebatePhase::Terminal, "run failed") {
        warn!(error = %e, "Could not close failed run");
    }

    run.final_summary = Some(format!("Debate failed due to error: {err}"));
    run.set_status(DebateStatus::Failed);
}
