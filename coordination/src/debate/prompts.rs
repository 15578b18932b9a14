//! Prompt templates for debaters and the orchestrator.

use std::fmt::Write as _;

use super::agent::DebaterProfile;
use super::consensus::ConsensusResult;
use super::context::ContextView;
use super::state::AgentResponse;

/// Characters of each response quoted in the summary prompt.
pub const SUMMARY_EXCERPT_CHARS: usize = 200;

/// Agreed facts quoted in the summary prompt.
pub const SUMMARY_FACTS: usize = 5;

fn context_block(view: &ContextView) -> String {
    let mut out = String::new();
    if !view.agreed_facts.is_empty() {
        let _ = writeln!(out, "Agreed Facts: {}", view.agreed_facts.join("; "));
    }
    if !view.disputed_points.is_empty() {
        let _ = writeln!(out, "Disputed Points: {}", view.disputed_points.join("; "));
    }
    if !view.knowledge.is_empty() {
        let entries: Vec<String> = view
            .knowledge
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let _ = writeln!(out, "Shared Knowledge: {}", entries.join(", "));
    }
    out
}

/// Opening-round prompt.
pub fn initial_prompt(
    profile: &DebaterProfile,
    question: &str,
    view: &ContextView,
    min_chars: usize,
    max_chars: usize,
) -> String {
    format!(
        "{context}\nQuestion for debate: {question}\n\n\
         Please provide your perspective on this question. Consider your unique viewpoint as a {personality} debater.\n\n\
         Be thorough but concise (aim for {min_chars}-{max_chars} characters).\n\
         Structure your response clearly with key points and supporting reasoning.\n\n\
         Your response:\n",
        context = context_block(view),
        personality = profile.personality,
    )
}

/// Rebuttal-round prompt. `others` must already exclude the debater itself.
pub fn rebuttal_prompt(
    profile: &DebaterProfile,
    question: &str,
    view: &ContextView,
    others: &[&AgentResponse],
    previous: Option<&AgentResponse>,
    feedback: &str,
) -> String {
    let mut others_text = String::new();
    for resp in others {
        let _ = writeln!(others_text, "\n{}: {}", resp.agent_id, resp.text);
    }

    format!(
        "Original Question: {question}\n\n{context}\n\
         Other Debaters' Responses:\n{others_text}\n\
         Orchestrator Feedback: {feedback}\n\n\
         Your Previous Response: {previous}\n\n\
         Based on the other responses and feedback, please refine your position. You should:\n\
         1. Address any valid points raised by other debaters\n\
         2. Clarify or strengthen your arguments where needed\n\
         3. Find common ground where possible\n\
         4. Maintain your unique {personality} perspective\n\n\
         Aim for convergence while preserving the strength of your arguments.\n\n\
         Your refined response:\n",
        context = context_block(view),
        previous = previous.map(|r| r.text.as_str()).unwrap_or("None"),
        personality = profile.personality,
    )
}

/// Orchestrator feedback prompt for one analyzed round.
pub fn feedback_prompt(
    question: &str,
    round: u32,
    responses: &[AgentResponse],
    analysis: &ConsensusResult,
    strategies: &[String],
) -> String {
    let mut responses_text = String::new();
    for resp in responses {
        let _ = writeln!(
            responses_text,
            "\n{} ({}): {}",
            resp.agent_id, resp.model, resp.text
        );
    }
    let strategies_text = strategies
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Round {round} Analysis:\n\nOriginal Question: {question}\n\n\
         Debater Responses:\n{responses_text}\n\
         Consensus Analysis:\n\
         - Average Similarity: {avg:.3}\n\
         - Consensus Reached: {reached}\n\
         - Method: {method}\n\
         - Details: {details}\n\n\
         Suggested Convergence Strategies:\n{strategies_text}\n\n\
         Please provide constructive feedback to help the debaters converge on a consensus. Focus on:\n\n\
         1. Identifying common ground and shared principles\n\
         2. Highlighting areas where perspectives can be reconciled\n\
         3. Suggesting specific ways to address remaining disagreements\n\
         4. Encouraging integration of different viewpoints\n\n\
         Keep your feedback concise but actionable (200-400 words).\n\n\
         Feedback:\n",
        avg = analysis.average_similarity,
        reached = analysis.consensus_reached,
        method = analysis.method,
        details = analysis.details,
    )
}

fn excerpt(text: &str) -> String {
    let clipped: String = text.chars().take(SUMMARY_EXCERPT_CHARS).collect();
    format!("{clipped}...")
}

/// Final-summary prompt. Responses are grouped by round in the order given.
pub fn summary_prompt(
    question: &str,
    responses: &[&AgentResponse],
    agreed_facts: &[String],
    consensus_reached: bool,
) -> String {
    let mut rounds_text = String::new();
    let mut current = None;
    for resp in responses {
        if current != Some(resp.round) {
            let _ = writeln!(rounds_text, "\nRound {}:", resp.round);
            current = Some(resp.round);
        }
        let _ = writeln!(rounds_text, "- {}: {}", resp.agent_id, excerpt(&resp.text));
    }

    let facts: Vec<&str> = agreed_facts
        .iter()
        .take(SUMMARY_FACTS)
        .map(String::as_str)
        .collect();
    let facts_text = if facts.is_empty() {
        String::new()
    } else {
        format!("Key Agreed Points: {}\n", facts.join("; "))
    };

    let outcome = if consensus_reached {
        "The debaters have reached consensus."
    } else {
        "The debate has ended without full consensus."
    };

    format!(
        "Original Question: {question}\n\nDebate Evolution:\n{rounds_text}\n{facts_text}\n\
         {outcome} Please provide a comprehensive summary that:\n\n\
         1. Clearly answers the original question\n\
         2. Integrates the key insights from all debaters\n\
         3. Highlights the main points of agreement\n\
         4. Provides a balanced and nuanced perspective\n\
         5. Acknowledges any remaining complexities or nuances\n\n\
         Keep the summary focused and well-structured (aim for 300-800 words).\n\n\
         Final Summary:\n"
    )
}
