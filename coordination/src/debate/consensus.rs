//! Consensus detection — pairwise similarity over a round's responses.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::embedding::{cosine_similarity, EmbeddingStrategy, TfIdfEmbedding};
use super::state::AgentResponse;

/// Method name reported when there is nothing to compare.
pub const INSUFFICIENT_DATA: &str = "insufficient_data";

/// Maximum number of key points kept per response.
pub const MAX_KEY_POINTS: usize = 5;

/// Verdict of one consensus analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Pair id (`"{a}_vs_{b}"`) → cosine similarity.
    pub similarity_scores: BTreeMap<String, f64>,
    pub average_similarity: f64,
    pub consensus_reached: bool,
    pub threshold: f64,
    /// Embedding method that produced the scores.
    pub method: String,
    /// Human-readable breakdown, `" | "`-separated.
    pub details: String,
}

impl ConsensusResult {
    /// Result for fewer than two responses.
    pub fn insufficient(threshold: f64) -> Self {
        Self {
            similarity_scores: BTreeMap::new(),
            average_similarity: 0.0,
            consensus_reached: false,
            threshold,
            method: INSUFFICIENT_DATA.to_string(),
            details: String::new(),
        }
    }

    /// Highest-scoring pair.
    pub fn most_similar(&self) -> Option<(&str, f64)> {
        self.similarity_scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Lowest-scoring pair.
    pub fn least_similar(&self) -> Option<(&str, f64)> {
        self.similarity_scores
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, v)| (k.as_str(), *v))
    }
}

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static NON_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?;:]").expect("valid strip regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]").expect("valid sentence regex"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-•*]\s*([^.!?]*)").expect("valid bullet regex"));

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Antonym groups used to spot contradicting positions.
const CONTRADICTION_GROUPS: &[(&[&str], &[&str])] = &[
    (&["agree", "support", "favor"], &["disagree", "oppose", "against"]),
    (&["yes", "correct", "true"], &["no", "incorrect", "false"]),
    (&["beneficial", "positive", "good"], &["harmful", "negative", "bad"]),
    (&["increase", "more", "higher"], &["decrease", "less", "lower"]),
];

/// Collapse whitespace, strip symbols other than basic punctuation, lowercase.
pub fn normalize(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    NON_TEXT.replace_all(&collapsed, "").to_lowercase()
}

/// Up to five salient sentences or bullet items from `text`.
///
/// Sentences (split on `.`, `!`, `?`) longer than 20 chars come first, then
/// bullet items longer than 10 chars.
pub fn extract_key_points(text: &str) -> Vec<String> {
    let sentences = SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > 20)
        .map(str::to_string);

    let bullets = BULLET
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| s.chars().count() > 10)
        .map(str::to_string);

    sentences.chain(bullets).take(MAX_KEY_POINTS).collect()
}

/// Scores agreement between texts with a pluggable embedding strategy.
#[derive(Clone)]
pub struct ConsensusAnalyzer {
    threshold: f64,
    strategy: Arc<dyn EmbeddingStrategy>,
    fallback: TfIdfEmbedding,
}

impl std::fmt::Debug for ConsensusAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusAnalyzer")
            .field("threshold", &self.threshold)
            .field("method", &self.strategy.method())
            .finish()
    }
}

impl ConsensusAnalyzer {
    pub fn new(threshold: f64, strategy: Arc<dyn EmbeddingStrategy>) -> Self {
        Self {
            threshold,
            strategy,
            fallback: TfIdfEmbedding::default(),
        }
    }

    /// Analyzer using TF-IDF keyword vectors.
    pub fn keyword(threshold: f64) -> Self {
        Self::new(threshold, Arc::new(TfIdfEmbedding::default()))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn method(&self) -> &'static str {
        self.strategy.method()
    }

    /// Analyze raw texts; pairs are labelled `response_{i}`.
    pub fn analyze(&self, texts: &[String]) -> ConsensusResult {
        let labels: Vec<String> = (0..texts.len()).map(|i| format!("response_{i}")).collect();
        let labeled: Vec<(&str, &str)> = labels
            .iter()
            .zip(texts)
            .map(|(l, t)| (l.as_str(), t.as_str()))
            .collect();
        self.analyze_labeled(&labeled)
    }

    /// Analyze a round; pairs are labelled by agent id.
    pub fn analyze_responses(&self, responses: &[AgentResponse]) -> ConsensusResult {
        let labeled: Vec<(&str, &str)> = responses
            .iter()
            .map(|r| (r.agent_id.as_str(), r.text.as_str()))
            .collect();
        self.analyze_labeled(&labeled)
    }

    fn analyze_labeled(&self, labeled: &[(&str, &str)]) -> ConsensusResult {
        if labeled.len() < 2 {
            return ConsensusResult::insufficient(self.threshold);
        }

        let normalized: Vec<String> = labeled.iter().map(|(_, t)| normalize(t)).collect();
        let (vectors, method) = self.embed(&normalized);

        let mut scores = BTreeMap::new();
        for i in 0..labeled.len() {
            for j in (i + 1)..labeled.len() {
                // Identical texts agree even when they embed to zero vectors.
                let sim = if normalized[i] == normalized[j] {
                    1.0
                } else {
                    cosine_similarity(&vectors[i], &vectors[j])
                };
                scores.insert(format!("{}_vs_{}", labeled[i].0, labeled[j].0), sim);
            }
        }

        let average = scores.values().sum::<f64>() / scores.len() as f64;
        let mut result = ConsensusResult {
            similarity_scores: scores,
            average_similarity: average,
            consensus_reached: average >= self.threshold,
            threshold: self.threshold,
            method: method.to_string(),
            details: String::new(),
        };
        result.details = self.details(&result, labeled);
        result
    }

    fn embed(&self, texts: &[String]) -> (Vec<Vec<f32>>, &'static str) {
        match self.strategy.embed(texts) {
            Ok(vectors) if vectors.len() == texts.len() => return (vectors, self.strategy.method()),
            Ok(vectors) => warn!(
                method = self.strategy.method(),
                expected = texts.len(),
                got = vectors.len(),
                "Embedding strategy returned wrong vector count, falling back to TF-IDF"
            ),
            Err(e) => warn!(
                method = self.strategy.method(),
                error = %e,
                "Embedding strategy failed, falling back to TF-IDF"
            ),
        }

        match self.fallback.embed(texts) {
            Ok(vectors) => (vectors, self.fallback.method()),
            Err(_) => (vec![Vec::new(); texts.len()], self.fallback.method()),
        }
    }

    fn details(&self, result: &ConsensusResult, labeled: &[(&str, &str)]) -> String {
        let mut parts = vec![
            format!("Average similarity: {:.3}", result.average_similarity),
            format!("Consensus threshold: {}", self.threshold),
        ];

        if let (Some(most), Some(least)) = (result.most_similar(), result.least_similar()) {
            parts.push(format!("Similarity range: {:.3} - {:.3}", least.1, most.1));
            parts.push(format!("Most similar: {} ({:.3})", most.0, most.1));
            parts.push(format!("Least similar: {} ({:.3})", least.0, least.1));
        }

        let lengths: Vec<String> = labeled
            .iter()
            .map(|(_, t)| t.chars().count().to_string())
            .collect();
        parts.push(format!("Response lengths: [{}]", lengths.join(", ")));

        for (label, text) in labeled {
            parts.push(format!(
                "{label} key points: {}",
                extract_key_points(text).len()
            ));
        }

        parts.join(" | ")
    }

    /// Contradictions between agents, one line per antonym group that splits them.
    ///
    /// Words match whole-word against the lowercased key points of each agent.
    pub fn identify_disagreement_areas(&self, responses: &[AgentResponse]) -> Vec<String> {
        let vocab: Vec<(&str, HashSet<String>)> = responses
            .iter()
            .map(|r| {
                let joined = extract_key_points(&r.text).join(" ").to_lowercase();
                let words = WORD
                    .find_iter(&joined)
                    .map(|m| m.as_str().to_string())
                    .collect();
                (r.agent_id.as_str(), words)
            })
            .collect();

        let mut disagreements = Vec::new();
        for (positive, negative) in CONTRADICTION_GROUPS {
            let pos = agents_using(&vocab, positive);
            let neg = agents_using(&vocab, negative);
            if !pos.is_empty() && !neg.is_empty() {
                disagreements.push(format!(
                    "Contradiction on {}: [{}] vs [{}]",
                    positive[0],
                    pos.join(", "),
                    neg.join(", ")
                ));
            }
        }
        disagreements
    }

    /// Guidance for the orchestrator, banded by average similarity.
    pub fn suggest_convergence_strategies(&self, result: &ConsensusResult) -> Vec<String> {
        let strategies: [&str; 2] = if result.average_similarity < 0.3 {
            [
                "Focus on finding common ground and shared principles",
                "Define key terms to ensure everyone is discussing the same concepts",
            ]
        } else if result.average_similarity < 0.6 {
            [
                "Identify specific points of disagreement and address them systematically",
                "Look for compromise positions that incorporate elements from different perspectives",
            ]
        } else {
            [
                "Refine the details and nuances of your shared understanding",
                "Work on integrating your similar viewpoints into a cohesive conclusion",
            ]
        };
        strategies.iter().map(|s| s.to_string()).collect()
    }
}

fn agents_using<'a>(vocab: &[(&'a str, HashSet<String>)], words: &[&str]) -> Vec<&'a str> {
    vocab
        .iter()
        .filter(|(_, set)| words.iter().any(|w| set.contains(*w)))
        .map(|(id, _)| *id)
        .collect()
}
