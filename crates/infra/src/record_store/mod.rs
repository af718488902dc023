//! Record store boundary.
//!
//! The record store owns persisted inventory quantities. The removal service
//! only needs three indexed lookups and two commands, each command answering
//! with a status/message pair in the style of a stored procedure.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryRecordStore, StockMovement};
pub use postgres::PostgresRecordStore;

use std::sync::Arc;

use stockroom_inventory::{InventoryItem, InventoryRow};

/// Fields sent with a removal or insertion command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCommand {
    pub part_id: String,
    pub location: String,
    /// Empty when the item has no operation.
    pub operation: String,
    pub quantity: i64,
    pub item_type: String,
    pub user: String,
    /// Empty when the item has no batch number.
    pub batch_number: String,
    pub notes: String,
}

impl StockCommand {
    /// Build a command from an item's original fields and the acting user.
    pub fn for_item(item: &InventoryItem, user: &str, notes: impl Into<String>) -> Self {
        Self {
            part_id: item.part_id.clone(),
            location: item.location.clone(),
            operation: item.operation_or_empty().to_string(),
            quantity: item.quantity,
            item_type: item.item_type.clone(),
            user: user.to_string(),
            batch_number: item.batch_number_or_empty().to_string(),
            notes: notes.into(),
        }
    }
}

/// Status/message pair returned by a store command.
///
/// `status >= 0` is success; negative statuses are business rejections
/// (insufficient quantity, no matching record, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReply {
    pub status: i32,
    pub message: String,
}

impl StoreReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            status: -1,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status >= 0
    }
}

/// Faults raised while talking to the store (as opposed to negative statuses).
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecordStoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store query failed: {0}")]
    Query(String),
    #[error("failed to decode inventory row: {0}")]
    Decode(String),
}

/// Record store abstraction.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn lookup_by_part_and_operation(
        &self,
        part_id: &str,
        operation: &str,
    ) -> Result<Vec<InventoryRow>, RecordStoreError>;

    async fn lookup_by_part(&self, part_id: &str) -> Result<Vec<InventoryRow>, RecordStoreError>;

    async fn lookup_by_user(&self, user: &str) -> Result<Vec<InventoryRow>, RecordStoreError>;

    /// Remove `quantity` of a part from a location/operation.
    async fn remove(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError>;

    /// Insert a quantity of a part at a location/operation.
    async fn insert(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError>;
}

#[async_trait::async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn lookup_by_part_and_operation(
        &self,
        part_id: &str,
        operation: &str,
    ) -> Result<Vec<InventoryRow>, RecordStoreError> {
        (**self).lookup_by_part_and_operation(part_id, operation).await
    }

    async fn lookup_by_part(&self, part_id: &str) -> Result<Vec<InventoryRow>, RecordStoreError> {
        (**self).lookup_by_part(part_id).await
    }

    async fn lookup_by_user(&self, user: &str) -> Result<Vec<InventoryRow>, RecordStoreError> {
        (**self).lookup_by_user(user).await
    }

    async fn remove(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError> {
        (**self).remove(command).await
    }

    async fn insert(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError> {
        (**self).insert(command).await
    }
}
