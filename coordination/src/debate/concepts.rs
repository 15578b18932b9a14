//! Key-concept extraction from debater responses.

/// Pulls concept sentences out of a response.
pub trait ConceptExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Phrases that mark a sentence as carrying a key concept.
pub const SIGNAL_PHRASES: &[&str] = &[
    "the main point is",
    "key factor",
    "important aspect",
    "crucial element",
    "significant",
    "primary reason",
    "fundamental",
    "essential",
];

/// Keeps every `.`-delimited sentence containing a signal phrase
/// (case-insensitive). Phrases are scanned in order, so a sentence matching
/// several phrases is returned once per phrase; callers dedup on insert.
#[derive(Debug, Clone)]
pub struct SignalPhraseExtractor {
    phrases: Vec<String>,
}

impl SignalPhraseExtractor {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }
}

impl Default for SignalPhraseExtractor {
    fn default() -> Self {
        Self::new(SIGNAL_PHRASES.iter().copied())
    }
}

impl ConceptExtractor for SignalPhraseExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let sentences: Vec<(&str, String)> = text
            .split('.')
            .map(|s| (s.trim(), s.to_lowercase()))
            .filter(|(s, _)| !s.is_empty())
            .collect();

        let mut concepts = Vec::new();
        for phrase in &self.phrases {
            for (sentence, lower) in &sentences {
                if lower.contains(phrase.as_str()) {
                    concepts.push(sentence.to_string());
                }
            }
        }
        concepts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_signal_sentences() {
        let text = "Cost is a Key Factor here. Weather varies. Storage is essential for grids.";
        let concepts = SignalPhraseExtractor::default().extract(text);
        assert_eq!(
            concepts,
            vec![
                "Cost is a Key Factor here".to_string(),
                "Storage is essential for grids".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_signal_no_concepts() {
        assert!(SignalPhraseExtractor::default()
            .extract("Nothing stands out in this answer.")
            .is_empty());
    }

    #[test]
    fn test_custom_phrases() {
        let extractor = SignalPhraseExtractor::new(["Trade-Off"]);
        let concepts = extractor.extract("There is a trade-off. Nothing else");
        assert_eq!(concepts, vec!["There is a trade-off".to_string()]);
    }
}
