//! Text → vector strategies used by the consensus analyzer.
//!
//! Strategies embed a whole batch at once because TF-IDF needs the corpus to
//! fit its vocabulary. Every strategy returns one vector per input, in input
//! order.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::DebateError;

/// Turns a batch of normalized texts into vectors.
pub trait EmbeddingStrategy: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DebateError>;

    /// Name reported as `ConsensusResult::method`.
    fn method(&self) -> &'static str;
}

/// Configured similarity method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    /// TF-IDF keyword vectors.
    #[default]
    Keyword,
    /// Feature-hashed bag of words.
    Hashed,
    /// Local sentence-embedding model (`local-embeddings` feature).
    Semantic,
}

impl SimilarityMethod {
    /// Build the strategy for this method.
    pub fn build(self) -> Result<Box<dyn EmbeddingStrategy>, DebateError> {
        match self {
            Self::Keyword => Ok(Box::new(TfIdfEmbedding::default())),
            Self::Hashed => Ok(Box::new(HashedEmbedding::default())),
            #[cfg(feature = "local-embeddings")]
            Self::Semantic => Ok(Box::new(LocalSemanticEmbedding::new()?)),
            #[cfg(not(feature = "local-embeddings"))]
            Self::Semantic => Err(DebateError::Configuration(
                "similarity method `semantic` requires the `local-embeddings` feature".into(),
            )),
        }
    }
}

impl std::fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Hashed => write!(f, "hashed"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

impl std::str::FromStr for SimilarityMethod {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "tfidf" => Ok(Self::Keyword),
            "hashed" => Ok(Self::Hashed),
            "semantic" => Ok(Self::Semantic),
            other => Err(DebateError::Configuration(format!(
                "unknown similarity method `{other}` (expected keyword, hashed or semantic)"
            ))),
        }
    }
}

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "else", "etc", "even", "ever", "every", "few", "for", "from", "further", "had", "has", "have",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "however",
    "i", "if", "in", "into", "is", "it", "its", "itself", "just", "may", "me", "might", "more",
    "most", "much", "must", "my", "myself", "neither", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shall", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "thus",
    "to", "too", "under", "until", "up", "upon", "us", "very", "was", "we", "were", "what",
    "when", "where", "whether", "which", "while", "who", "whom", "whose", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Corpus-fit TF-IDF vectors with English stop words removed.
#[derive(Debug, Clone)]
pub struct TfIdfEmbedding {
    max_features: usize,
}

impl TfIdfEmbedding {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Vocabulary: the `max_features` most frequent terms, ties alphabetical,
    /// then sorted alphabetically to fix column order.
    fn vocabulary(&self, docs: &[Vec<String>]) -> Vec<String> {
        let mut freq: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in docs {
            for term in doc {
                *freq.entry(term.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocab: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocab.sort();
        vocab
    }
}

impl Default for TfIdfEmbedding {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl EmbeddingStrategy for TfIdfEmbedding {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DebateError> {
        let docs: Vec<Vec<String>> = texts
            .iter()
            .map(|t| {
                tokenize(t)
                    .into_iter()
                    .filter(|w| !STOP_SET.contains(w.as_str()))
                    .collect()
            })
            .collect();

        let vocab = self.vocabulary(&docs);
        let index: HashMap<&str, usize> = vocab
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut df = vec![0usize; vocab.len()];
        for doc in &docs {
            let seen: HashSet<usize> = doc
                .iter()
                .filter_map(|t| index.get(t.as_str()).copied())
                .collect();
            for i in seen {
                df[i] += 1;
            }
        }

        let n = docs.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        Ok(docs
            .iter()
            .map(|doc| {
                let mut v = vec![0.0f64; vocab.len()];
                for term in doc {
                    if let Some(&i) = index.get(term.as_str()) {
                        v[i] += 1.0;
                    }
                }
                for (x, w) in v.iter_mut().zip(&idf) {
                    *x *= w;
                }
                l2_normalize(v)
            })
            .collect())
    }

    fn method(&self) -> &'static str {
        "tfidf_keywords"
    }
}

/// Feature-hashed bag of words in a fixed dimension.
#[derive(Debug, Clone)]
pub struct HashedEmbedding {
    dimension: usize,
}

impl HashedEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f64; self.dimension];
        for word in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();
            let idx = (hash % self.dimension as u64) as usize;
            // High bit picks the sign so collisions tend to cancel.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        l2_normalize(v)
    }
}

impl Default for HashedEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingStrategy for HashedEmbedding {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DebateError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn method(&self) -> &'static str {
        "hashed_bag_of_words"
    }
}

/// Sentence embeddings from a local ONNX model (all-MiniLM-L6-v2).
#[cfg(feature = "local-embeddings")]
pub struct LocalSemanticEmbedding {
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "local-embeddings")]
impl LocalSemanticEmbedding {
    pub fn new() -> Result<Self, DebateError> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| DebateError::Configuration(format!("loading embedding model: {e}")))?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "local-embeddings")]
impl EmbeddingStrategy for LocalSemanticEmbedding {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DebateError> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| DebateError::Workflow("embedding model lock poisoned".into()))?;
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        model
            .embed(refs, None)
            .map_err(|e| DebateError::Workflow(format!("embedding failed: {e}")))
    }

    fn method(&self) -> &'static str {
        "semantic_embeddings"
    }
}

fn l2_normalize(v: Vec<f64>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 {
        return v.into_iter().map(|x| x as f32).collect();
    }
    v.into_iter().map(|x| (x / norm) as f32).collect()
}

/// Cosine similarity computed in f64. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
