//! Per-element memory: descriptive properties and an interaction history.

use std::collections::BTreeMap;

use glam::Vec2;
use serde_json::Value;

/// Number of history entries returned when callers do not ask for a count.
pub const DEFAULT_RECENT_INTERACTIONS: usize = 5;

/// Descriptive metadata and append-only history attached to every element.
///
/// History entries are stamped with the world's logical clock, so two entries
/// recorded during the same round share a prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionContext {
    display_name: String,
    description: String,
    created_at: u64,
    initial_position: Vec2,
    properties: BTreeMap<String, Value>,
    history: Vec<String>,
}

impl InteractionContext {
    /// Creates an empty context for an element spawned at `initial_position`.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        description: impl Into<String>,
        created_at: u64,
        initial_position: Vec2,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            description: description.into(),
            created_at,
            initial_position,
            properties: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Name used when describing the element.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Free-form description of the element.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Logical tick at which the element was created.
    #[must_use]
    pub const fn created_at(&self) -> u64 {
        self.created_at
    }

    /// World position the element was created at.
    #[must_use]
    pub const fn initial_position(&self) -> Vec2 {
        self.initial_position
    }

    pub(crate) fn set_initial_position(&mut self, position: Vec2) {
        self.initial_position = position;
    }

    /// Stores or replaces a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let _ = self.properties.insert(key.into(), value.into());
    }

    /// Reads a property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Reports whether a property is present.
    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Removes a property, returning its previous value.
    pub fn remove_property(&mut self, key: &str) -> Option<Value> {
        self.properties.remove(key)
    }

    /// All properties ordered by key.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Appends a history entry stamped with the provided logical tick.
    pub fn record(&mut self, tick: u64, interaction: impl AsRef<str>) {
        self.history
            .push(format!("[t={tick}] {}", interaction.as_ref()));
    }

    /// Full history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Up to `count` most recent entries, oldest first.
    #[must_use]
    pub fn recent_interactions(&self, count: usize) -> &[String] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.history.len()
    }

    /// Forgets every recorded entry.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
