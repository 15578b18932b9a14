//! Human-readable rendering of a finished run.

use std::fmt::Write as _;

use debate_coordination::DebateRun;

/// Characters of each response shown per round.
const PREVIEW_CHARS: usize = 240;

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

/// Plain-text report: outcome line, trajectory, per-round excerpts, summary.
pub fn render_text(run: &DebateRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Question: {}", run.question);
    let _ = writeln!(
        out,
        "Outcome:  {} after {} round(s) (threshold {:.2}, {:.1}s, run {})",
        run.status,
        run.current_round,
        run.threshold,
        run.duration_secs.unwrap_or_default(),
        run.id
    );

    if !run.consensus_trajectory.is_empty() {
        let trajectory: Vec<String> = run
            .consensus_trajectory
            .iter()
            .map(|s| format!("{s:.3}"))
            .collect();
        let _ = writeln!(out, "Trajectory: {}", trajectory.join(" → "));
    }

    for round in &run.rounds {
        let _ = writeln!(
            out,
            "\n── Round {} (similarity {:.3}, {}) ──",
            round.round, round.consensus.average_similarity, round.consensus.method
        );
        for resp in &round.responses {
            let _ = writeln!(out, "[{}] {}", resp.agent_id, preview(&resp.text));
        }
        if let Some(feedback) = &round.feedback {
            let _ = writeln!(out, "Feedback: {}", preview(feedback));
        }
    }

    if let Some(summary) = &run.final_summary {
        let _ = writeln!(out, "\n── Final summary ──\n{summary}");
    }
    out
}
