//! In-memory record store for tests/dev.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use stockroom_inventory::{InventoryItem, InventoryRow, ItemId};

use super::{RecordStore, RecordStoreError, StockCommand, StoreReply};
use crate::history::TransactionKind;

/// One quantity movement applied by the store (IN for inserts, OUT for removals).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub kind: TransactionKind,
    pub item_id: ItemId,
    pub part_id: String,
    pub location: String,
    pub operation: String,
    pub quantity: i64,
    pub user: String,
    pub notes: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<i64, InventoryItem>,
    next_id: i64,
    movements: Vec<StockMovement>,
}

/// In-memory store with stored-procedure-like semantics.
///
/// - Removal needs a record with the same part, location, operation (and
///   batch number when one is given) holding at least the requested quantity;
///   the record is decremented, or deleted when it reaches zero.
/// - Insertion creates a new record.
/// - Every command is counted so tests can assert which calls were made.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Inner>,
    lookup_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

fn poisoned() -> RecordStoreError {
    RecordStoreError::Unavailable("in-memory store lock poisoned".to_string())
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed a record, assigning an identity when the item has none.
    pub fn seed(&self, mut item: InventoryItem) -> Result<InventoryItem, RecordStoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if item.id.value() == 0 {
            inner.next_id += 1;
            item.id = ItemId(inner.next_id);
        } else {
            inner.next_id = inner.next_id.max(item.id.value());
        }
        inner.records.insert(item.id.value(), item.clone());
        Ok(item)
    }

    /// Current records, ordered by identity.
    pub fn records(&self) -> Vec<InventoryItem> {
        self.inner
            .read()
            .map(|inner| inner.records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Movements applied so far, oldest first.
    pub fn movements(&self) -> Vec<StockMovement> {
        self.inner
            .read()
            .map(|inner| inner.movements.clone())
            .unwrap_or_default()
    }

    /// Total quantity of a part held at a location.
    pub fn quantity_at(&self, part_id: &str, location: &str) -> i64 {
        self.records()
            .iter()
            .filter(|r| r.part_id == part_id && r.location == location)
            .map(|r| r.quantity)
            .sum()
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Remove and insert calls combined.
    pub fn command_calls(&self) -> usize {
        self.remove_calls() + self.insert_calls()
    }

    fn lookup<F>(&self, predicate: F) -> Result<Vec<InventoryRow>, RecordStoreError>
    where
        F: Fn(&InventoryItem) -> bool,
    {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .records
            .values()
            .filter(|record| predicate(record))
            .map(InventoryRow::from)
            .collect())
    }
}

fn matches_command(record: &InventoryItem, command: &StockCommand) -> bool {
    record.part_id == command.part_id
        && record.location == command.location
        && record.operation_or_empty() == command.operation
        && (command.batch_number.is_empty()
            || record.batch_number_or_empty() == command.batch_number)
}

fn movement(
    kind: TransactionKind,
    item_id: ItemId,
    command: &StockCommand,
    at: DateTime<Utc>,
) -> StockMovement {
    StockMovement {
        kind,
        item_id,
        part_id: command.part_id.clone(),
        location: command.location.clone(),
        operation: command.operation.clone(),
        quantity: command.quantity,
        user: command.user.clone(),
        notes: command.notes.clone(),
        at,
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn lookup_by_part_and_operation(
        &self,
        part_id: &str,
        operation: &str,
    ) -> Result<Vec<InventoryRow>, RecordStoreError> {
        self.lookup(|r| r.part_id == part_id && r.operation_or_empty() == operation)
    }

    async fn lookup_by_part(&self, part_id: &str) -> Result<Vec<InventoryRow>, RecordStoreError> {
        self.lookup(|r| r.part_id == part_id)
    }

    async fn lookup_by_user(&self, user: &str) -> Result<Vec<InventoryRow>, RecordStoreError> {
        self.lookup(|r| r.user.eq_ignore_ascii_case(user))
    }

    async fn remove(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        let candidate = inner
            .records
            .values()
            .filter(|r| matches_command(r, command))
            .find(|r| r.quantity >= command.quantity)
            .map(|r| r.id);

        let Some(id) = candidate else {
            let any_match = inner.records.values().any(|r| matches_command(r, command));
            return Ok(StoreReply::rejected(if any_match {
                format!("Insufficient quantity of {} at {}", command.part_id, command.location)
            } else {
                format!("No matching inventory for {} at {}", command.part_id, command.location)
            }));
        };

        let now = Utc::now();
        let emptied = match inner.records.get_mut(&id.value()) {
            Some(record) => {
                record.quantity -= command.quantity;
                record.last_updated_at = now;
                record.last_updated_by = command.user.clone();
                record.quantity == 0
            }
            None => false,
        };
        if emptied {
            inner.records.remove(&id.value());
        }
        inner.movements.push(movement(TransactionKind::Out, id, command, now));

        Ok(StoreReply::ok(format!("Removed {} of {}", command.quantity, command.part_id)))
    }

    async fn insert(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        if command.part_id.trim().is_empty() {
            return Ok(StoreReply::rejected("PartID cannot be null or empty"));
        }
        if command.user.trim().is_empty() {
            return Ok(StoreReply::rejected("User cannot be null or empty"));
        }
        if command.quantity <= 0 {
            return Ok(StoreReply::rejected("Quantity must be greater than 0"));
        }

        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.next_id += 1;
        let id = ItemId(inner.next_id);
        let now = Utc::now();
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());

        inner.records.insert(
            id.value(),
            InventoryItem {
                id,
                part_id: command.part_id.clone(),
                location: command.location.clone(),
                operation: non_empty(&command.operation),
                quantity: command.quantity,
                item_type: command.item_type.clone(),
                batch_number: non_empty(&command.batch_number),
                notes: non_empty(&command.notes),
                user: command.user.clone(),
                last_updated_by: command.user.clone(),
                received_at: now,
                last_updated_at: now,
            },
        );
        inner.movements.push(movement(TransactionKind::In, id, command, now));

        Ok(StoreReply {
            status: 1,
            message: format!("Added {} of {}", command.quantity, command.part_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(part: &str, location: &str, op: &str, qty: i64) -> InventoryItem {
        InventoryItem::from_row(
            InventoryRow {
                part_id: Some(part.to_string()),
                location: Some(location.to_string()),
                operation: Some(op.to_string()),
                quantity: Some(qty),
                user: Some("jdoe".to_string()),
                ..InventoryRow::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn seeded_records_are_found_by_each_lookup() {
        let store = InMemoryRecordStore::new();
        store.seed(item("PN-1", "WC01", "90", 5)).unwrap();
        store.seed(item("PN-1", "WC02", "100", 5)).unwrap();
        store.seed(item("PN-2", "WC01", "90", 5)).unwrap();

        assert_eq!(store.lookup_by_part("PN-1").await.unwrap().len(), 2);
        assert_eq!(store.lookup_by_part_and_operation("PN-1", "100").await.unwrap().len(), 1);
        assert_eq!(store.lookup_by_user("JDOE").await.unwrap().len(), 3);
        assert_eq!(store.lookup_calls(), 3);
    }

    #[tokio::test]
    async fn partial_removal_decrements_and_full_removal_deletes() {
        let store = InMemoryRecordStore::new();
        let seeded = store.seed(item("PN-1", "WC01", "90", 5)).unwrap();

        let mut cmd = StockCommand::for_item(&seeded, "jdoe", "test");
        cmd.quantity = 2;
        assert!(store.remove(&cmd).await.unwrap().is_success());
        assert_eq!(store.quantity_at("PN-1", "WC01"), 3);

        cmd.quantity = 3;
        assert!(store.remove(&cmd).await.unwrap().is_success());
        assert!(store.records().is_empty());
        assert_eq!(store.movements().len(), 2);
    }

    #[tokio::test]
    async fn removal_without_match_or_quantity_is_rejected() {
        let store = InMemoryRecordStore::new();
        let seeded = store.seed(item("PN-1", "WC01", "90", 5)).unwrap();

        let mut too_much = StockCommand::for_item(&seeded, "jdoe", "");
        too_much.quantity = 6;
        let reply = store.remove(&too_much).await.unwrap();
        assert_eq!(reply.status, -1);
        assert!(reply.message.contains("Insufficient"));

        let ghost = StockCommand::for_item(&item("PN-9", "WC01", "90", 1), "jdoe", "");
        let reply = store.remove(&ghost).await.unwrap();
        assert!(!reply.is_success());
        assert!(reply.message.contains("No matching"));
        assert_eq!(store.quantity_at("PN-1", "WC01"), 5);
    }

    #[tokio::test]
    async fn insert_validates_and_creates_record() {
        let store = InMemoryRecordStore::new();
        let source = item("PN-1", "WC01", "90", 4);

        let reply = store.insert(&StockCommand::for_item(&source, "", "restore")).await.unwrap();
        assert!(!reply.is_success());

        let command = StockCommand::for_item(&source, "jdoe", "restore");
        let reply = store.insert(&command).await.unwrap();
        assert!(reply.is_success());
        assert_eq!(store.quantity_at("PN-1", "WC01"), 4);
        assert_eq!(store.insert_calls(), 2);
        assert_eq!(store.movements()[0].kind, TransactionKind::In);
    }
}
