//! Search criteria and the lookup they translate to.

use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

/// Optional filter fields for an inventory search.
///
/// Blank strings are treated the same as absent fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub part_id: Option<String>,
    pub operation: Option<String>,
    pub location: Option<String>,
    pub user: Option<String>,
}

/// The indexed lookup chosen for a set of criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    ByPartAndOperation { part_id: String, operation: String },
    ByPart { part_id: String },
    ByUser { user: String },
    /// No indexed field was supplied; the search returns nothing rather than
    /// scanning the whole store.
    Unindexed,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, part_id: impl Into<String>) -> Self {
        self.part_id = Some(part_id.into());
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Pick the lookup: part+operation, then part, then user.
    pub fn plan(&self) -> SearchPlan {
        match (present(&self.part_id), present(&self.operation), present(&self.user)) {
            (Some(part_id), Some(operation), _) => SearchPlan::ByPartAndOperation {
                part_id: part_id.to_string(),
                operation: operation.to_string(),
            },
            (Some(part_id), None, _) => SearchPlan::ByPart {
                part_id: part_id.to_string(),
            },
            (None, _, Some(user)) => SearchPlan::ByUser {
                user: user.to_string(),
            },
            (None, _, None) => SearchPlan::Unindexed,
        }
    }

    /// In-memory location/user constraint: case-insensitive exact match.
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let location_ok = present(&self.location)
            .map_or(true, |location| item.location.eq_ignore_ascii_case(location));
        let user_ok = present(&self.user).map_or(true, |user| item.user.eq_ignore_ascii_case(user));
        location_ok && user_ok
    }

    /// Keep only items satisfying the post-filter, preserving order.
    pub fn post_filter(&self, items: Vec<InventoryItem>) -> Vec<InventoryItem> {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

impl core::fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let any = |v: &Option<String>| present(v).unwrap_or("Any").to_string();
        write!(
            f,
            "part={} operation={} location={} user={}",
            any(&self.part_id),
            any(&self.operation),
            any(&self.location),
            any(&self.user)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::InventoryRow;
    use chrono::Utc;

    fn item(location: &str, user: &str) -> InventoryItem {
        InventoryItem::from_row(
            InventoryRow {
                part_id: Some("PN-1".to_string()),
                location: Some(location.to_string()),
                user: Some(user.to_string()),
                quantity: Some(1),
                ..InventoryRow::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn part_and_operation_take_precedence() {
        let plan = SearchCriteria::new().part("PN-1").operation("90").user("jdoe").plan();
        assert_eq!(
            plan,
            SearchPlan::ByPartAndOperation {
                part_id: "PN-1".to_string(),
                operation: "90".to_string()
            }
        );
    }

    #[test]
    fn part_alone_and_user_alone() {
        assert_eq!(
            SearchCriteria::new().part("PN-1").user("jdoe").plan(),
            SearchPlan::ByPart { part_id: "PN-1".to_string() }
        );
        assert_eq!(
            SearchCriteria::new().operation("90").user("jdoe").plan(),
            SearchPlan::ByUser { user: "jdoe".to_string() }
        );
    }

    #[test]
    fn location_only_or_blank_is_unindexed() {
        assert_eq!(SearchCriteria::new().location("WC01").plan(), SearchPlan::Unindexed);
        assert_eq!(SearchCriteria::new().part("  ").operation("90").plan(), SearchPlan::Unindexed);
        assert_eq!(SearchCriteria::default().plan(), SearchPlan::Unindexed);
    }

    #[test]
    fn post_filter_is_case_insensitive_exact() {
        let criteria = SearchCriteria::new().part("PN-1").location("wc01").user("JDOE");
        let kept = criteria.post_filter(vec![
            item("WC01", "jdoe"),
            item("WC011", "jdoe"),
            item("WC01", "other"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].location, "WC01");
    }

    #[test]
    fn display_marks_absent_fields_as_any() {
        let criteria = SearchCriteria::new().part("PN-1");
        assert_eq!(criteria.to_string(), "part=PN-1 operation=Any location=Any user=Any");
    }
}
