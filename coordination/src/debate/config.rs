//! Debate configuration: defaults, TOML file, environment overrides.
//!
//! Precedence (lowest to highest): built-in defaults, TOML file,
//! `DEBATE_*` environment variables, then whatever the caller sets on the
//! struct (the CLI applies its flags last).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::agent::{DebaterProfile, ResponseLimits};
use super::embedding::SimilarityMethod;
use super::errors::DebateError;
use super::orchestrator::OrchestratorProfile;

pub const ENV_MAX_ROUNDS: &str = "DEBATE_MAX_ROUNDS";
pub const ENV_CONSENSUS_THRESHOLD: &str = "DEBATE_CONSENSUS_THRESHOLD";
pub const ENV_SIMILARITY: &str = "DEBATE_SIMILARITY";

/// Settings for one debate controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Maximum number of completed rounds.
    pub max_rounds: u32,
    /// Average similarity at or above which consensus is declared.
    pub consensus_threshold: f64,
    pub min_response_chars: usize,
    pub max_response_chars: usize,
    pub similarity: SimilarityMethod,
    pub debaters: Vec<DebaterProfile>,
    pub orchestrator: OrchestratorProfile,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            consensus_threshold: 0.85,
            min_response_chars: 50,
            max_response_chars: 1000,
            similarity: SimilarityMethod::Keyword,
            debaters: DebaterProfile::defaults(),
            orchestrator: OrchestratorProfile::default(),
        }
    }
}

impl DebateConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, DebateError> {
        toml::from_str(raw).map_err(|e| DebateError::Configuration(format!("invalid TOML: {e}")))
    }

    /// Load and validate a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, DebateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DebateError::Configuration(format!("reading {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DEBATE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Unparsable values are
    /// logged and ignored.
    pub fn apply_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_MAX_ROUNDS) {
            match raw.trim().parse() {
                Ok(v) => self.max_rounds = v,
                Err(_) => warn!(var = ENV_MAX_ROUNDS, value = %raw, "Ignoring unparsable override"),
            }
        }
        if let Some(raw) = lookup(ENV_CONSENSUS_THRESHOLD) {
            match raw.trim().parse() {
                Ok(v) => self.consensus_threshold = v,
                Err(_) => {
                    warn!(var = ENV_CONSENSUS_THRESHOLD, value = %raw, "Ignoring unparsable override")
                }
            }
        }
        if let Some(raw) = lookup(ENV_SIMILARITY) {
            match raw.parse() {
                Ok(v) => self.similarity = v,
                Err(_) => warn!(var = ENV_SIMILARITY, value = %raw, "Ignoring unparsable override"),
            }
        }
    }

    pub fn limits(&self) -> ResponseLimits {
        ResponseLimits {
            min_chars: self.min_response_chars,
            max_chars: self.max_response_chars,
        }
    }

    pub fn validate(&self) -> Result<(), DebateError> {
        if self.max_rounds == 0 {
            return Err(DebateError::Configuration(
                "max_rounds must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.consensus_threshold) {
            return Err(DebateError::Configuration(format!(
                "consensus_threshold must be within [0, 1], got {}",
                self.consensus_threshold
            )));
        }
        if self.min_response_chars > self.max_response_chars {
            return Err(DebateError::Configuration(format!(
                "min_response_chars ({}) exceeds max_response_chars ({})",
                self.min_response_chars, self.max_response_chars
            )));
        }
        if self.debaters.len() < 2 {
            return Err(DebateError::Configuration(format!(
                "at least 2 debaters are required, got {}",
                self.debaters.len()
            )));
        }

        let mut seen = HashSet::new();
        for debater in &self.debaters {
            if debater.id.trim().is_empty() {
                return Err(DebateError::Configuration("debater id must not be empty".into()));
            }
            if debater.model.trim().is_empty() {
                return Err(DebateError::Configuration(format!(
                    "debater {} has no model",
                    debater.id
                )));
            }
            if !seen.insert(debater.id.as_str()) {
                return Err(DebateError::Configuration(format!(
                    "duplicate debater id {}",
                    debater.id
                )));
            }
        }
        if self.orchestrator.model.trim().is_empty() {
            return Err(DebateError::Configuration("orchestrator has no model".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = DebateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_rounds, 3);
        assert!((config.consensus_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.debaters.len(), 3);
        assert_eq!(config.similarity, SimilarityMethod::Keyword);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DebateConfig::from_toml_str(
            r#"
max_rounds = 5
similarity = "hashed"
"#,
        )
        .unwrap();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.similarity, SimilarityMethod::Hashed);
        assert_eq!(config.debaters.len(), 3);
        assert_eq!(config.orchestrator.model, "llama3.2:3b");
    }

    #[test]
    fn test_toml_debaters_and_orchestrator() {
        let config = DebateConfig::from_toml_str(
            r#"
[orchestrator]
model = "qwen2.5:7b"

[[debaters]]
id = "Pro"
model = "m1"
personality = "optimistic"

[[debaters]]
id = "Con"
model = "m2"
personality = "skeptical"
temperature = 0.2
"#,
        )
        .unwrap();
        assert_eq!(config.debaters.len(), 2);
        assert_eq!(config.debaters[0].max_tokens, 800);
        assert!((config.debaters[1].temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.orchestrator.model, "qwen2.5:7b");
        assert_eq!(config.orchestrator.max_tokens, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_MAX_ROUNDS, "7"),
            (ENV_CONSENSUS_THRESHOLD, "0.5"),
            (ENV_SIMILARITY, "hashed"),
        ]
        .into_iter()
        .collect();
        let mut config = DebateConfig::default();
        config.apply_overrides_with(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.max_rounds, 7);
        assert!((config.consensus_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.similarity, SimilarityMethod::Hashed);
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = DebateConfig::default();
        config.apply_overrides_with(|k| (k == ENV_MAX_ROUNDS).then(|| "many".to_string()));
        assert_eq!(config.max_rounds, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DebateConfig::default();
        config.consensus_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = DebateConfig::default();
        config.max_rounds = 0;
        assert!(config.validate().is_err());

        let mut config = DebateConfig::default();
        config.min_response_chars = 2000;
        assert!(config.validate().is_err());

        let mut config = DebateConfig::default();
        config.debaters.truncate(1);
        assert!(config.validate().is_err());

        let mut config = DebateConfig::default();
        config.debaters[1].id = config.debaters[0].id.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = DebateConfig::from_toml_str("max_rounds = \"three\"").unwrap_err();
        assert!(matches!(err, DebateError::Configuration(_)));
    }
}
