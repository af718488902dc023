//! Removal orchestration: search, batch removal, undo and suggestions.
//!
//! `RemovalService` composes the record store, reference data and transaction
//! history ports, and owns the per-instance state (current result set, undo
//! session, busy flag). Notifications go out on an `EventBus<RemovalEvent>`.

mod loading;
mod service;

pub use loading::LoadingGuard;
pub use service::RemovalService;

use stockroom_inventory::InventoryItem;

use crate::record_store::RecordStoreError;
use crate::reference_data::ReferenceDataError;

/// Aggregate-level failures. Per-item failures are reported in the outcome instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemovalError {
    #[error("no items were provided for removal")]
    EmptyBatch,
    #[error("there are no removed items to restore")]
    NothingToUndo,
    #[error(transparent)]
    Store(#[from] RecordStoreError),
    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),
}

/// Result of `RemovalService::refresh_inventory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No search had been run; the result set was emptied.
    Cleared,
    /// The last search was re-run and produced these items.
    Reloaded(Vec<InventoryItem>),
}
