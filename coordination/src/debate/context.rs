//! Cross-round shared context.
//!
//! The controller owns the only mutable [`SharedContext`] of a run. Debaters
//! read a frozen [`ContextView`] taken with [`SharedContext::snapshot`] before
//! each fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Accumulated state of one debate run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedContext {
    agreed_facts: Vec<String>,
    disputed_points: Vec<String>,
    key_concepts: Vec<String>,
    conversation_history: Vec<String>,
    knowledge: BTreeMap<String, String>,
    /// Bumped on every effective mutation.
    version: u64,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agreed fact unless the exact text is already present.
    pub fn add_agreed_fact(&mut self, fact: impl Into<String>) -> bool {
        insert_unique(&mut self.agreed_facts, fact.into(), &mut self.version)
    }

    /// Add a disputed point unless the exact text is already present.
    pub fn add_disputed_point(&mut self, point: impl Into<String>) -> bool {
        insert_unique(&mut self.disputed_points, point.into(), &mut self.version)
    }

    pub fn add_key_concept(&mut self, concept: impl Into<String>) -> bool {
        insert_unique(&mut self.key_concepts, concept.into(), &mut self.version)
    }

    /// Append to the conversation log. Never deduplicated.
    pub fn record_entry(&mut self, entry: impl Into<String>) {
        self.conversation_history.push(entry.into());
        self.version += 1;
    }

    /// Insert or overwrite a knowledge-map entry.
    pub fn update_knowledge(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.knowledge.insert(key.into(), value.into());
        self.version += 1;
    }

    pub fn agreed_facts(&self) -> &[String] {
        &self.agreed_facts
    }

    pub fn disputed_points(&self) -> &[String] {
        &self.disputed_points
    }

    pub fn key_concepts(&self) -> &[String] {
        &self.key_concepts
    }

    pub fn conversation_history(&self) -> &[String] {
        &self.conversation_history
    }

    pub fn knowledge(&self) -> &BTreeMap<String, String> {
        &self.knowledge
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read-only copy for concurrent prompt building.
    pub fn snapshot(&self) -> Arc<ContextView> {
        Arc::new(ContextView {
            agreed_facts: self.agreed_facts.clone(),
            disputed_points: self.disputed_points.clone(),
            key_concepts: self.key_concepts.clone(),
            knowledge: self.knowledge.clone(),
            version: self.version,
        })
    }
}

fn insert_unique(items: &mut Vec<String>, item: String, version: &mut u64) -> bool {
    if items.contains(&item) {
        return false;
    }
    items.push(item);
    *version += 1;
    true
}

/// Frozen view of a [`SharedContext`] handed to debaters.
///
/// The conversation log is left out; prompts never include it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextView {
    pub agreed_facts: Vec<String>,
    pub disputed_points: Vec<String>,
    pub key_concepts: Vec<String>,
    pub knowledge: BTreeMap<String, String>,
    /// Version of the context this view was taken from.
    pub version: u64,
}

impl ContextView {
    pub fn is_empty(&self) -> bool {
        self.agreed_facts.is_empty() && self.disputed_points.is_empty() && self.knowledge.is_empty()
    }
}
