//! Per-item accounting for removal and restore batches.

use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

/// Triage classification of a per-item failure.
///
/// Used by callers to group failures for display; it never drives control flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The item failed a local precondition; the store was never called.
    Validation,
    /// The store answered with a negative status.
    Store,
    /// The store call itself faulted.
    Unexpected,
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            FailureKind::Validation => "validation",
            FailureKind::Store => "store",
            FailureKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

/// One item that could not be removed or restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: InventoryItem,
    pub error: String,
    pub kind: FailureKind,
}

pub type RemovalFailure = ItemFailure;
pub type RestoreFailure = ItemFailure;

/// Aggregate result of a removal or restore batch.
///
/// Built only through [`OutcomeTally`], so `success_count + failure_count`
/// always equals `total_processed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    succeeded: Vec<InventoryItem>,
    failures: Vec<ItemFailure>,
    total_processed: usize,
    success_count: usize,
    failure_count: usize,
}

pub type RemovalOutcome = BatchOutcome;
pub type RestoreOutcome = BatchOutcome;

impl BatchOutcome {
    /// Items that succeeded, in submission order.
    pub fn succeeded(&self) -> &[InventoryItem] {
        &self.succeeded
    }

    /// Failures, in submission order.
    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn total_processed(&self) -> usize {
        self.total_processed
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }

    pub fn has_successes(&self) -> bool {
        self.success_count > 0
    }

    /// Sum of the quantities of every successful item.
    pub fn total_quantity(&self) -> i64 {
        self.succeeded.iter().map(|item| item.quantity).sum()
    }

    /// Failures of one classification.
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ItemFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// Human-readable summary, e.g. "Processed 3 items: 2 successful, 1 failed".
    pub fn summary(&self) -> String {
        format!(
            "Processed {} items: {} successful, {} failed",
            self.total_processed, self.success_count, self.failure_count
        )
    }
}

/// Running per-item tally for a batch in progress.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    succeeded: Vec<InventoryItem>,
    failures: Vec<ItemFailure>,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, item: InventoryItem) {
        self.succeeded.push(item);
    }

    pub fn failure(&mut self, item: InventoryItem, error: impl Into<String>, kind: FailureKind) {
        self.failures.push(ItemFailure {
            item,
            error: error.into(),
            kind,
        });
    }

    pub fn finish(self) -> BatchOutcome {
        let success_count = self.succeeded.len();
        let failure_count = self.failures.len();
        BatchOutcome {
            succeeded: self.succeeded,
            failures: self.failures,
            total_processed: success_count + failure_count,
            success_count,
            failure_count,
        }
    }
}
