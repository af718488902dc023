//! Inventory removal domain.
//!
//! This crate contains the business rules for removing and restoring inventory
//! quantities, implemented purely as deterministic domain logic (no IO, no
//! storage, no async). The orchestration that talks to the record store lives
//! in `stockroom-infra`.

pub mod event;
pub mod item;
pub mod outcome;
pub mod search;
pub mod session;
pub mod suggest;

pub use event::{ItemsRemoved, ItemsRestored, RemovalEvent};
pub use item::{DEFAULT_ITEM_TYPE, InventoryItem, InventoryRow, ItemId};
pub use outcome::{
    BatchOutcome, FailureKind, ItemFailure, OutcomeTally, RemovalFailure, RemovalOutcome,
    RestoreFailure, RestoreOutcome,
};
pub use search::{SearchCriteria, SearchPlan};
pub use session::{UndoPolicy, UndoSession, remove_first_match};
pub use suggest::{ReferenceCategory, SuggestionRules};
