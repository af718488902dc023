//! Autocomplete matching over reference data.

use serde::{Deserialize, Serialize};

/// Reference-data set a suggestion is drawn from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    Part,
    Operation,
    Location,
    User,
}

impl ReferenceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceCategory::Part => "part",
            ReferenceCategory::Operation => "operation",
            ReferenceCategory::Location => "location",
            ReferenceCategory::User => "user",
        }
    }
}

impl core::fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input-length and result-count limits for suggestions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRules {
    pub limit: usize,
    /// Part numbers are long and numerous; one character matches too much.
    pub min_part_input: usize,
    pub min_other_input: usize,
}

impl Default for SuggestionRules {
    fn default() -> Self {
        Self {
            limit: 10,
            min_part_input: 2,
            min_other_input: 1,
        }
    }
}

impl SuggestionRules {
    pub fn min_input(&self, category: ReferenceCategory) -> usize {
        match category {
            ReferenceCategory::Part => self.min_part_input,
            _ => self.min_other_input,
        }
    }

    /// Whether `input` is long enough to query `category` at all.
    pub fn accepts(&self, input: &str, category: ReferenceCategory) -> bool {
        let input = input.trim();
        !input.is_empty() && input.chars().count() >= self.min_input(category).max(1)
    }

    /// Case-insensitive substring matches, in provider order, capped at `limit`.
    pub fn select<'a, I>(&self, values: I, input: &str) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let needle = input.trim().to_lowercase();
        values
            .into_iter()
            .filter(|value| value.to_lowercase().contains(&needle))
            .take(self.limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn part_requires_two_characters_others_one() {
        let rules = SuggestionRules::default();
        assert!(!rules.accepts("P", ReferenceCategory::Part));
        assert!(rules.accepts("PN", ReferenceCategory::Part));
        assert!(rules.accepts("9", ReferenceCategory::Operation));
        assert!(!rules.accepts("", ReferenceCategory::Location));
        assert!(!rules.accepts("   ", ReferenceCategory::User));
    }

    #[test]
    fn select_matches_substrings_ignoring_case() {
        let rules = SuggestionRules::default();
        let parts = values(&["PN-1001", "pn-2002", "XX-9", "APN-3"]);
        assert_eq!(rules.select(&parts, "pn"), values(&["PN-1001", "pn-2002", "APN-3"]));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let rules = SuggestionRules::default();
        assert!(!rules.accepts(" P", ReferenceCategory::Part));
        assert!(!rules.accepts("P  ", ReferenceCategory::Part));
        assert!(rules.accepts(" PN ", ReferenceCategory::Part));

        let parts = values(&["PN-1001", "APN-3", "XX-9"]);
        assert_eq!(rules.select(&parts, " pn "), values(&["PN-1001", "APN-3"]));
    }

    #[test]
    fn select_caps_at_limit_in_provider_order() {
        let rules = SuggestionRules::default();
        let parts: Vec<String> = (0..25).map(|i| format!("WC{i:02}")).collect();
        let picked = rules.select(&parts, "wc");
        assert_eq!(picked.len(), 10);
        assert_eq!(picked[0], "WC00");
        assert_eq!(picked[9], "WC09");
    }

    proptest! {
        /// Property: every suggestion contains the input and there are never more than `limit`.
        #[test]
        fn suggestions_are_bounded_matches(
            pool in prop::collection::vec("[a-zA-Z0-9]{1,8}", 0..60),
            input in "[a-zA-Z0-9]{1,3}",
        ) {
            let rules = SuggestionRules::default();
            let picked = rules.select(&pool, &input);
            prop_assert!(picked.len() <= rules.limit);
            for p in &picked {
                prop_assert!(p.to_lowercase().contains(&input.to_lowercase()));
            }
        }
    }
}
