//! Debater agents — persona, prompt assembly and response checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::concepts::{ConceptExtractor, SignalPhraseExtractor};
use super::context::{ContextView, SharedContext};
use super::errors::DebateError;
use super::prompts;
use super::state::AgentResponse;
use crate::inference::{InferenceClient, SamplingParams};

/// Persona and sampling settings of one debater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebaterProfile {
    /// Unique name, also used as the agent id.
    pub id: String,
    pub model: String,
    pub personality: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

impl DebaterProfile {
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        personality: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            personality: personality.into(),
            system_prompt: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn sampling(&self) -> SamplingParams {
        let params = SamplingParams::new(&self.model, self.temperature, self.max_tokens);
        if self.system_prompt.is_empty() {
            params
        } else {
            params.with_system(&self.system_prompt)
        }
    }

    /// The three stock personas: analytical, creative and practical.
    pub fn defaults() -> Vec<DebaterProfile> {
        vec![
            DebaterProfile::new("Analytical_Debater", "gemma2:2b", "analytical and fact-focused")
                .with_temperature(0.6)
                .with_system_prompt(
                    "You are an analytical debater who focuses on facts, data, and logical reasoning.\n\
                     Provide well-structured arguments based on evidence and clear reasoning.\n\
                     Be thorough but concise in your responses.",
                ),
            DebaterProfile::new("Creative_Debater", "phi3:mini", "creative and perspective-oriented")
                .with_temperature(0.8)
                .with_system_prompt(
                    "You are a creative debater who brings unique perspectives and innovative thinking.\n\
                     Explore different angles, consider alternative viewpoints, and think outside the box.\n\
                     Challenge assumptions while remaining constructive.",
                ),
            DebaterProfile::new("Practical_Debater", "tinyllama:1.1b", "practical and solution-focused")
                .with_temperature(0.7)
                .with_system_prompt(
                    "You are a practical debater focused on real-world applications and solutions.\n\
                     Emphasize actionable insights, practical implications, and concrete examples.\n\
                     Bridge theory with practice in your arguments.",
                ),
        ]
    }
}

/// Length bounds applied to every debater response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseLimits {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl ResponseLimits {
    /// Trim `raw` and apply the bounds.
    ///
    /// Empty and short texts are kept as-is; long texts are cut to
    /// `max_chars` characters and suffixed with `...`. Any violation is
    /// returned as a non-fatal content error.
    pub fn enforce(&self, agent: &str, raw: &str) -> (String, Option<DebateError>) {
        let text = raw.trim();
        let len = text.chars().count();

        if len == 0 {
            return (String::new(), Some(DebateError::content(agent, "empty response")));
        }
        if len < self.min_chars {
            return (
                text.to_string(),
                Some(DebateError::content(
                    agent,
                    format!("response too short ({len} < {} chars)", self.min_chars),
                )),
            );
        }
        if len > self.max_chars {
            let mut clipped: String = text.chars().take(self.max_chars).collect();
            clipped.push_str("...");
            return (
                clipped,
                Some(DebateError::content(
                    agent,
                    format!("response truncated ({len} > {} chars)", self.max_chars),
                )),
            );
        }
        (text.to_string(), None)
    }
}

impl Default for ResponseLimits {
    fn default() -> Self {
        Self {
            min_chars: 50,
            max_chars: 1000,
        }
    }
}

/// Material a debater needs for a rebuttal round.
#[derive(Debug, Clone)]
pub struct RebuttalInput {
    /// Every response of the previous round, the debater's own included.
    pub previous_round: Vec<AgentResponse>,
    /// Orchestrator feedback on that round.
    pub feedback: String,
}

/// One debater. Stateless between rounds: its own history comes from the
/// run's round records.
pub struct DebaterAgent {
    profile: DebaterProfile,
    client: Arc<dyn InferenceClient>,
    limits: ResponseLimits,
    concepts: Arc<dyn ConceptExtractor>,
}

impl std::fmt::Debug for DebaterAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebaterAgent")
            .field("profile", &self.profile)
            .field("limits", &self.limits)
            .finish()
    }
}

impl DebaterAgent {
    pub fn new(
        profile: DebaterProfile,
        client: Arc<dyn InferenceClient>,
        limits: ResponseLimits,
    ) -> Self {
        Self {
            profile,
            client,
            limits,
            concepts: Arc::new(SignalPhraseExtractor::default()),
        }
    }

    pub fn with_concept_extractor(mut self, extractor: Arc<dyn ConceptExtractor>) -> Self {
        self.concepts = extractor;
        self
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn profile(&self) -> &DebaterProfile {
        &self.profile
    }

    /// Build the prompt for `round`. Round 1 (or no rebuttal input) gets the
    /// opening prompt.
    pub fn build_prompt(
        &self,
        question: &str,
        view: &ContextView,
        rebuttal: Option<&RebuttalInput>,
    ) -> String {
        match rebuttal {
            None => prompts::initial_prompt(
                &self.profile,
                question,
                view,
                self.limits.min_chars,
                self.limits.max_chars,
            ),
            Some(input) => {
                let others: Vec<&AgentResponse> = input
                    .previous_round
                    .iter()
                    .filter(|r| r.agent_id != self.profile.id)
                    .collect();
                let previous = input
                    .previous_round
                    .iter()
                    .find(|r| r.agent_id == self.profile.id);
                prompts::rebuttal_prompt(
                    &self.profile,
                    question,
                    view,
                    &others,
                    previous,
                    &input.feedback,
                )
            }
        }
    }

    /// Produce this debater's response for `round`.
    pub async fn respond(
        &self,
        question: &str,
        round: u32,
        view: &ContextView,
        rebuttal: Option<&RebuttalInput>,
    ) -> Result<AgentResponse, DebateError> {
        let prompt = self.build_prompt(question, view, rebuttal);
        debug!(
            agent = %self.profile.id,
            round,
            prompt_chars = prompt.len(),
            context_version = view.version,
            "Requesting debater response"
        );

        let raw = self
            .client
            .invoke(&prompt, &self.profile.sampling())
            .await
            .map_err(|e| DebateError::inference(&self.profile.id, e))?;

        let (text, issue) = self.limits.enforce(&self.profile.id, &raw);
        if let Some(issue) = issue {
            warn!(agent = %self.profile.id, round, error = %issue, "Response content check");
        }

        Ok(AgentResponse::new(
            &self.profile.id,
            &self.profile.model,
            text,
            round,
        ))
    }

    /// Apply a response's side effects to the run context: log entry plus
    /// any new key concepts.
    pub fn record(&self, response: &AgentResponse, context: &mut SharedContext) {
        context.record_entry(format!("{}: {}", response.agent_id, response.text));
        for concept in self.concepts.extract(&response.text) {
            context.add_key_concept(concept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed reply and remembers the last prompt.
    struct Echo {
        reply: Result<String, InferenceError>,
        last_prompt: Mutex<Option<String>>,
    }

    impl Echo {
        fn new(reply: Result<String, InferenceError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl InferenceClient for Echo {
        async fn invoke(
            &self,
            prompt: &str,
            _params: &SamplingParams,
        ) -> Result<String, InferenceError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply.clone()
        }
    }

    fn agent(client: Arc<Echo>) -> DebaterAgent {
        DebaterAgent::new(
            DebaterProfile::defaults().remove(0),
            client,
            ResponseLimits::default(),
        )
    }

    #[test]
    fn test_default_personas() {
        let defaults = DebaterProfile::defaults();
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults[1].id, "Creative_Debater");
        assert_eq!(defaults[2].model, "tinyllama:1.1b");
        assert!(defaults.iter().all(|p| p.max_tokens == 800));
        assert!(defaults[0].sampling().system.is_some());
    }

    #[test]
    fn test_limits_short_and_empty_are_kept() {
        let limits = ResponseLimits::default();
        let (text, issue) = limits.enforce("A", "   too short  ");
        assert_eq!(text, "too short");
        assert!(matches!(issue, Some(DebateError::Content { .. })));

        let (text, issue) = limits.enforce("A", "   ");
        assert!(text.is_empty());
        assert!(issue.unwrap().to_string().contains("empty"));
    }

    #[test]
    fn test_limits_truncate_on_char_boundary() {
        let limits = ResponseLimits {
            min_chars: 1,
            max_chars: 4,
        };
        let (text, issue) = limits.enforce("A", "héllo wörld");
        assert_eq!(text, "héll...");
        assert!(issue.is_some());
    }

    #[test]
    fn test_limits_in_range_is_clean() {
        let limits = ResponseLimits {
            min_chars: 1,
            max_chars: 100,
        };
        let (text, issue) = limits.enforce("A", "fine answer");
        assert_eq!(text, "fine answer");
        assert!(issue.is_none());
    }

    #[tokio::test]
    async fn test_respond_wraps_text() {
        let client = Echo::new(Ok("  A measured answer about energy costs and storage.  ".into()));
        let agent = agent(client.clone());
        let resp = agent
            .respond("Is solar worth it?", 1, &ContextView::default(), None)
            .await
            .unwrap();
        assert_eq!(resp.agent_id, "Analytical_Debater");
        assert_eq!(resp.model, "gemma2:2b");
        assert_eq!(resp.round, 1);
        assert_eq!(resp.text, "A measured answer about energy costs and storage.");
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Question for debate: Is solar worth it?"));
    }

    #[tokio::test]
    async fn test_respond_maps_inference_failure() {
        let agent = agent(Echo::new(Err(InferenceError::Timeout(60))));
        let err = agent
            .respond("q", 1, &ContextView::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DebateError::Inference { ref participant, .. } if participant == "Analytical_Debater"
        ));
    }

    #[tokio::test]
    async fn test_rebuttal_prompt_splits_own_and_others() {
        let client = Echo::new(Ok("ok".into()));
        let agent = agent(client.clone());
        let input = RebuttalInput {
            previous_round: vec![
                AgentResponse::new("Analytical_Debater", "m", "my earlier view", 1),
                AgentResponse::new("Creative_Debater", "m", "their view", 1),
            ],
            feedback: "find common ground".into(),
        };
        agent
            .respond("q", 2, &ContextView::default(), Some(&input))
            .await
            .unwrap();
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Your Previous Response: my earlier view"));
        assert!(prompt.contains("Creative_Debater: their view"));
        assert!(!prompt.contains("Analytical_Debater: my earlier view"));
    }

    #[test]
    fn test_record_logs_and_extracts_concepts() {
        let agent = agent(Echo::new(Ok(String::new())));
        let mut ctx = SharedContext::new();
        let resp = AgentResponse::new(
            "Analytical_Debater",
            "m",
            "Price is a key factor. Nothing else.",
            1,
        );
        agent.record(&resp, &mut ctx);
        agent.record(&resp, &mut ctx);
        assert_eq!(ctx.conversation_history().len(), 2);
        assert_eq!(
            ctx.conversation_history()[0],
            "Analytical_Debater: Price is a key factor. Nothing else."
        );
        assert_eq!(ctx.key_concepts(), &["Price is a key factor".to_string()]);
    }
}
