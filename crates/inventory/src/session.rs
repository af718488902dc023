//! Process-local undo buffer for removed items.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

/// How a new removal batch interacts with items already held for undo.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoPolicy {
    /// Each batch's successes are appended; undo covers every batch since the last clear.
    #[default]
    Accumulate,
    /// Each batch's successes replace whatever was held before.
    Replace,
}

impl core::str::FromStr for UndoPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" => Ok(UndoPolicy::Accumulate),
            "replace" => Ok(UndoPolicy::Replace),
            other => Err(format!("unknown undo policy `{other}` (expected accumulate|replace)")),
        }
    }
}

/// Remove one occurrence of `item`, returning whether one was found.
///
/// An exact value match is preferred; otherwise the first item with the same
/// store identity is taken, which covers partial quantities and rows re-read
/// by a later search. Moves are one occurrence at a time so duplicate rows are
/// tracked individually.
pub fn remove_first_match(items: &mut Vec<InventoryItem>, item: &InventoryItem) -> bool {
    let found = items
        .iter()
        .position(|candidate| candidate == item)
        .or_else(|| items.iter().position(|candidate| candidate.same_identity(item)));
    match found {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

/// Items removed by recent batches and still eligible for restoration.
///
/// The lock is only ever held for list manipulation; callers snapshot the
/// contents and release the lock before talking to the record store.
#[derive(Debug, Default)]
pub struct UndoSession {
    policy: UndoPolicy,
    items: Mutex<Vec<InventoryItem>>,
}

impl UndoSession {
    pub fn new(policy: UndoPolicy) -> Self {
        Self {
            policy,
            items: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InventoryItem>> {
        // The list holds plain values; a panic mid-update cannot leave it half-written.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a batch's successes according to the session policy.
    pub fn record(&self, removed: &[InventoryItem]) {
        if removed.is_empty() {
            return;
        }
        let mut items = self.lock();
        if self.policy == UndoPolicy::Replace {
            items.clear();
        }
        items.extend_from_slice(removed);
    }

    /// Copy of the current contents, in removal order.
    pub fn snapshot(&self) -> Vec<InventoryItem> {
        self.lock().clone()
    }

    /// Drop exactly the restored items (one occurrence each); returns how many were found.
    pub fn remove_restored(&self, restored: &[InventoryItem]) -> usize {
        let mut items = self.lock();
        restored
            .iter()
            .filter(|item| remove_first_match(&mut items, item))
            .count()
    }

    /// Empty the session, returning how many items were discarded.
    pub fn clear(&self) -> usize {
        let mut items = self.lock();
        let discarded = items.len();
        items.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether the session holds the same store record as `item`.
    pub fn contains(&self, item: &InventoryItem) -> bool {
        self.lock().iter().any(|held| held.same_identity(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::InventoryRow;
    use chrono::Utc;

    fn item(id: i64, part: &str) -> InventoryItem {
        InventoryItem::from_row(
            InventoryRow {
                id: Some(id),
                part_id: Some(part.to_string()),
                location: Some("WC01".to_string()),
                quantity: Some(1),
                ..InventoryRow::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn accumulate_appends_across_batches() {
        let session = UndoSession::new(UndoPolicy::Accumulate);
        session.record(&[item(1, "A")]);
        session.record(&[item(2, "B"), item(3, "C")]);

        let parts: Vec<_> = session.snapshot().into_iter().map(|i| i.part_id).collect();
        assert_eq!(parts, vec!["A", "B", "C"]);
    }

    #[test]
    fn replace_keeps_only_latest_batch() {
        let session = UndoSession::new(UndoPolicy::Replace);
        session.record(&[item(1, "A")]);
        session.record(&[item(2, "B")]);

        assert_eq!(session.len(), 1);
        assert!(session.contains(&item(2, "B")));
        assert!(!session.contains(&item(1, "A")));
    }

    #[test]
    fn empty_batch_does_not_wipe_replace_session() {
        let session = UndoSession::new(UndoPolicy::Replace);
        session.record(&[item(1, "A")]);
        session.record(&[]);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn remove_restored_drops_only_matching_occurrences() {
        let session = UndoSession::default();
        let dup = item(7, "DUP");
        session.record(&[dup.clone(), dup.clone(), item(8, "KEEP")]);

        let removed = session.remove_restored(&[dup.clone(), item(99, "MISSING")]);

        assert_eq!(removed, 1);
        assert_eq!(session.len(), 2);
        assert!(session.contains(&dup));
    }

    #[test]
    fn partial_quantity_matches_its_record() {
        let mut results = vec![item(1, "A"), item(2, "B")];
        let partial = InventoryItem {
            quantity: 4,
            ..item(2, "B")
        };

        assert!(remove_first_match(&mut results, &partial));
        assert_eq!(results, vec![item(1, "A")]);
        assert!(!remove_first_match(&mut results, &partial));
    }

    #[test]
    fn exact_copy_wins_over_same_record() {
        let whole = item(5, "A");
        let partial = InventoryItem {
            quantity: 3,
            ..whole.clone()
        };
        let mut held = vec![whole.clone(), partial.clone()];

        assert!(remove_first_match(&mut held, &partial));
        assert_eq!(held, vec![whole]);
    }

    #[test]
    fn clear_reports_discarded_count() {
        let session = UndoSession::default();
        session.record(&[item(1, "A"), item(2, "B")]);
        assert_eq!(session.clear(), 2);
        assert!(session.is_empty());
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Replace".parse::<UndoPolicy>().unwrap(), UndoPolicy::Replace);
        assert_eq!(" accumulate ".parse::<UndoPolicy>().unwrap(), UndoPolicy::Accumulate);
        assert!("forever".parse::<UndoPolicy>().is_err());
    }
}
