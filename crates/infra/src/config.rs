//! Configuration loading and representation.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use stockroom_inventory::{SuggestionRules, UndoPolicy};

/// Tunables for the removal service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    pub undo_policy: UndoPolicy,
    /// Prefix of the note sent with each removal; the caller's note is appended.
    pub removal_note_prefix: String,
    /// Note sent with each undo insertion.
    pub restore_note: String,
    pub suggestion_limit: usize,
    pub min_part_input: usize,
    pub min_other_input: usize,
    /// Entries kept per user by the in-memory transaction history.
    pub history_capacity: usize,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        let rules = SuggestionRules::default();
        Self {
            undo_policy: UndoPolicy::default(),
            removal_note_prefix: "Removed via removal service".to_string(),
            restore_note: "Restored via undo".to_string(),
            suggestion_limit: rules.limit,
            min_part_input: rules.min_part_input,
            min_other_input: rules.min_other_input,
            history_capacity: 10,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value for {name}: `{raw}`")),
        _ => Ok(None),
    }
}

impl RemovalConfig {
    /// Load from `STOCKROOM_*` environment variables, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(policy) = parse_var::<UndoPolicy, _>(&lookup, "STOCKROOM_UNDO_POLICY")? {
            config.undo_policy = policy;
        }
        if let Some(limit) = parse_var::<usize, _>(&lookup, "STOCKROOM_SUGGESTION_LIMIT")? {
            config.suggestion_limit = limit;
        }
        if let Some(min) = parse_var::<usize, _>(&lookup, "STOCKROOM_MIN_PART_INPUT")? {
            config.min_part_input = min;
        }
        if let Some(min) = parse_var::<usize, _>(&lookup, "STOCKROOM_MIN_OTHER_INPUT")? {
            config.min_other_input = min;
        }
        if let Some(capacity) = parse_var::<usize, _>(&lookup, "STOCKROOM_HISTORY_CAPACITY")? {
            config.history_capacity = capacity;
        }
        if let Some(prefix) =
            lookup("STOCKROOM_REMOVAL_NOTE_PREFIX").filter(|v| !v.trim().is_empty())
        {
            config.removal_note_prefix = prefix;
        }
        if let Some(note) = lookup("STOCKROOM_RESTORE_NOTE").filter(|v| !v.trim().is_empty()) {
            config.restore_note = note;
        }

        if config.suggestion_limit == 0 {
            tracing::warn!("STOCKROOM_SUGGESTION_LIMIT=0 disables suggestions");
        }

        Ok(config)
    }

    pub fn suggestion_rules(&self) -> SuggestionRules {
        SuggestionRules {
            limit: self.suggestion_limit,
            min_part_input: self.min_part_input,
            min_other_input: self.min_other_input,
        }
    }

    /// Note sent with a removal: the configured prefix plus the caller's note.
    pub fn removal_note(&self, note: Option<&str>) -> String {
        format!("{} - {}", self.removal_note_prefix, note.unwrap_or("").trim())
    }
}
