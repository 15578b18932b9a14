//! Debate state machine — phases, transitions, and the run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::consensus::ConsensusResult;

/// Externally visible status of a debate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    /// Run created, no debater called yet.
    Initializing,
    /// Rounds are being collected.
    InProgress,
    /// Average similarity met the threshold.
    ConsensusReached,
    /// Round budget exhausted.
    MaxRoundsExceeded,
    /// Unrecoverable error; see the run's final summary.
    Failed,
}

impl DebateStatus {
    /// Whether this is a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ConsensusReached | Self::MaxRoundsExceeded | Self::Failed
        )
    }
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::InProgress => write!(f, "in_progress"),
            Self::ConsensusReached => write!(f, "consensus_reached"),
            Self::MaxRoundsExceeded => write!(f, "max_rounds_exceeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Internal phase of the controller's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    /// Run created.
    Init,
    /// Fan-out of the opening round.
    CollectingInitial,
    /// Scoring the latest round.
    Analyzing,
    /// Orchestrator is writing feedback for the next round.
    Feedback,
    /// Fan-out of a rebuttal round.
    CollectingRebuttal,
    /// Summarizing after consensus.
    FinalizingConsensus,
    /// Summarizing after the round budget ran out.
    FinalizingMaxRounds,
    /// Collection failed.
    Failed,
    /// Nothing left to do.
    Terminal,
}

impl DebatePhase {
    pub fn is_terminal(self) -> bool {
        self == Self::Terminal
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [DebatePhase] {
        match self {
            Self::Init => &[Self::CollectingInitial, Self::Failed],
            Self::CollectingInitial => &[Self::Analyzing, Self::Failed],
            Self::Analyzing => &[
                Self::Feedback,
                Self::FinalizingConsensus,
                Self::FinalizingMaxRounds,
            ],
            Self::Feedback => &[Self::CollectingRebuttal],
            Self::CollectingRebuttal => &[Self::Analyzing, Self::Failed],
            Self::FinalizingConsensus | Self::FinalizingMaxRounds | Self::Failed => {
                &[Self::Terminal]
            }
            Self::Terminal => &[],
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::CollectingInitial => write!(f, "collecting_initial"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Feedback => write!(f, "feedback"),
            Self::CollectingRebuttal => write!(f, "collecting_rebuttal"),
            Self::FinalizingConsensus => write!(f, "finalizing_consensus"),
            Self::FinalizingMaxRounds => write!(f, "finalizing_max_rounds"),
            Self::Failed => write!(f, "failed"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Branch taken after a round has been analyzed.
///
/// `round` is the number of completed rounds, so `max_rounds` caps completed
/// rounds rather than attempted ones. The budget check wins over consensus.
pub fn next_state(round: u32, max_rounds: u32, consensus_reached: bool) -> DebatePhase {
    if round >= max_rounds {
        DebatePhase::FinalizingMaxRounds
    } else if consensus_reached {
        DebatePhase::FinalizingConsensus
    } else {
        DebatePhase::Feedback
    }
}

/// One debater's answer for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: String,
    /// Model that produced the text.
    pub model: String,
    pub text: String,
    pub round: u32,
    pub created_at: DateTime<Utc>,
    /// Length of `text` in characters.
    pub length: usize,
}

impl AgentResponse {
    pub fn new(
        agent_id: impl Into<String>,
        model: impl Into<String>,
        text: impl Into<String>,
        round: u32,
    ) -> Self {
        let text = text.into();
        Self {
            agent_id: agent_id.into(),
            model: model.into(),
            length: text.chars().count(),
            text,
            round,
            created_at: Utc::now(),
        }
    }
}

/// Record of one completed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (1-indexed).
    pub round: u32,
    pub responses: Vec<AgentResponse>,
    pub consensus: ConsensusResult,
    /// Orchestrator feedback written after this round, if another round followed.
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A phase transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTransition {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for TransitionError {}

/// Full record of one `conduct` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRun {
    /// Unique run identifier.
    pub id: String,
    pub question: String,
    pub max_rounds: u32,
    pub threshold: f64,
    /// Number of completed rounds.
    pub current_round: u32,
    pub status: DebateStatus,
    /// Current FSM phase.
    pub phase: DebatePhase,
    pub rounds: Vec<RoundRecord>,
    pub final_summary: Option<String>,
    /// Average similarity of each completed round, in order.
    pub consensus_trajectory: Vec<f64>,
    pub consensus_reached: bool,
    pub transitions: Vec<DebateTransition>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in seconds, set by `finish`.
    pub duration_secs: Option<f64>,
}

impl DebateRun {
    pub fn new(question: &str, max_rounds: u32, threshold: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            question: question.to_string(),
            max_rounds,
            threshold,
            current_round: 0,
            status: DebateStatus::Initializing,
            phase: DebatePhase::Init,
            rounds: Vec::new(),
            final_summary: None,
            consensus_trajectory: Vec::new(),
            consensus_reached: false,
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            duration_secs: None,
        }
    }

    /// Move the FSM to `to`, recording why.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: format!(
                    "not a valid transition (allowed: {:?})",
                    self.phase.valid_transitions()
                ),
            });
        }

        self.transitions.push(DebateTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Append a completed round. Keeps `current_round`, `rounds` and the
    /// trajectory in lockstep.
    pub fn record_round(&mut self, record: RoundRecord) {
        self.consensus_trajectory
            .push(record.consensus.average_similarity);
        self.current_round = record.round;
        self.rounds.push(record);
    }

    /// Latest completed round.
    pub fn last_round(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    /// Number of the round that would be collected next.
    pub fn next_round_number(&self) -> u32 {
        self.current_round + 1
    }

    /// Last observed average similarity (0.0 before any round).
    pub fn last_similarity(&self) -> f64 {
        self.consensus_trajectory.last().copied().unwrap_or(0.0)
    }

    /// Set a terminal status. A status that is already terminal is kept.
    pub fn set_status(&mut self, status: DebateStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.consensus_reached = status == DebateStatus::ConsensusReached;
    }

    /// Stamp end time and duration.
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.duration_secs = Some((now - self.started_at).num_milliseconds() as f64 / 1000.0);
        self.ended_at = Some(now);
    }

    /// Every response of every round, in round order.
    pub fn all_responses(&self) -> Vec<&AgentResponse> {
        self.rounds.iter().flat_map(|r| r.responses.iter()).collect()
    }

    /// Compact status line.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | last similarity {:.3} (threshold {:.2}) | run={}",
            self.status,
            self.current_round,
            self.max_rounds,
            self.last_similarity(),
            self.threshold,
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::consensus::ConsensusResult;

    fn round(n: u32, avg: f64) -> RoundRecord {
        let mut consensus = ConsensusResult::insufficient(0.85);
        consensus.average_similarity = avg;
        RoundRecord {
            round: n,
            responses: vec![AgentResponse::new("a", "m", "text", n)],
            consensus,
            feedback: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_next_state_budget_wins_over_consensus() {
        assert_eq!(next_state(1, 1, true), DebatePhase::FinalizingMaxRounds);
        assert_eq!(next_state(3, 3, false), DebatePhase::FinalizingMaxRounds);
        assert_eq!(next_state(4, 3, false), DebatePhase::FinalizingMaxRounds);
    }

    #[test]
    fn test_next_state_consensus_and_continue() {
        assert_eq!(next_state(1, 3, true), DebatePhase::FinalizingConsensus);
        assert_eq!(next_state(1, 3, false), DebatePhase::Feedback);
        assert_eq!(next_state(2, 3, false), DebatePhase::Feedback);
    }

    #[test]
    fn test_new_run() {
        let run = DebateRun::new("Is Rust memory safe?", 3, 0.85);
        assert_eq!(run.status, DebateStatus::Initializing);
        assert_eq!(run.phase, DebatePhase::Init);
        assert_eq!(run.current_round, 0);
        assert_eq!(run.next_round_number(), 1);
        assert!(run.rounds.is_empty());
        assert!(!run.id.is_empty());
    }

    #[test]
    fn test_full_cycle_transitions() {
        let mut run = DebateRun::new("q", 3, 0.85);
        run.transition(DebatePhase::CollectingInitial, "start").unwrap();
        run.transition(DebatePhase::Analyzing, "collected").unwrap();
        run.transition(DebatePhase::Feedback, "no consensus").unwrap();
        run.transition(DebatePhase::CollectingRebuttal, "feedback ready")
            .unwrap();
        run.transition(DebatePhase::Analyzing, "collected").unwrap();
        run.transition(DebatePhase::FinalizingConsensus, "consensus")
            .unwrap();
        run.transition(DebatePhase::Terminal, "done").unwrap();
        assert!(run.phase.is_terminal());
        assert_eq!(run.transitions.len(), 7);
        assert_eq!(run.transitions[0].from, DebatePhase::Init);
    }

    #[test]
    fn test_invalid_transition() {
        let mut run = DebateRun::new("q", 3, 0.85);
        let err = run
            .transition(DebatePhase::FinalizingConsensus, "skip")
            .unwrap_err();
        assert_eq!(err.from, DebatePhase::Init);
        assert_eq!(err.to, DebatePhase::FinalizingConsensus);
        assert_eq!(run.phase, DebatePhase::Init);
        assert!(run.transitions.is_empty());
    }

    #[test]
    fn test_terminal_has_no_transitions() {
        assert!(DebatePhase::Terminal.valid_transitions().is_empty());
        assert_eq!(
            DebatePhase::Failed.valid_transitions(),
            &[DebatePhase::Terminal]
        );
    }

    #[test]
    fn test_record_round_keeps_invariants() {
        let mut run = DebateRun::new("q", 3, 0.85);
        run.record_round(round(1, 0.4));
        run.record_round(round(2, 0.7));
        assert_eq!(run.current_round, 2);
        assert_eq!(run.rounds.len(), run.current_round as usize);
        assert_eq!(run.consensus_trajectory, vec![0.4, 0.7]);
        assert!((run.last_similarity() - 0.7).abs() < f64::EPSILON);
        assert_eq!(run.all_responses().len(), 2);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let mut run = DebateRun::new("q", 3, 0.85);
        run.set_status(DebateStatus::InProgress);
        run.set_status(DebateStatus::ConsensusReached);
        assert!(run.consensus_reached);
        run.set_status(DebateStatus::Failed);
        assert_eq!(run.status, DebateStatus::ConsensusReached);
    }

    #[test]
    fn test_finish_sets_duration() {
        let mut run = DebateRun::new("q", 3, 0.85);
        run.finish();
        assert!(run.ended_at.is_some());
        assert!(run.duration_secs.unwrap() >= 0.0);
    }

    #[test]
    fn test_agent_response_length_counts_chars() {
        let resp = AgentResponse::new("a", "m", "héllo", 1);
        assert_eq!(resp.length, 5);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DebateStatus::ConsensusReached.to_string(), "consensus_reached");
        assert_eq!(DebateStatus::MaxRoundsExceeded.to_string(), "max_rounds_exceeded");
        assert_eq!(DebatePhase::CollectingRebuttal.to_string(), "collecting_rebuttal");
        assert!(DebateStatus::Failed.is_terminal());
        assert!(!DebateStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_status_line() {
        let mut run = DebateRun::new("q", 3, 0.85);
        run.record_round(round(1, 0.5));
        let line = run.status_line();
        assert!(line.contains("round 1/3"));
        assert!(line.contains("0.500"));
    }
}
