use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::BatchId;
use stockroom_events::Event;

use crate::item::InventoryItem;

/// Event: ItemsRemoved (one per batch with at least one success).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsRemoved {
    pub batch_id: BatchId,
    pub items: Vec<InventoryItem>,
    pub removed_at: DateTime<Utc>,
    pub total_quantity: i64,
    pub user: String,
    /// Location of the first removed item; a display summary only.
    pub location: String,
}

impl ItemsRemoved {
    pub fn new(
        batch_id: BatchId,
        items: Vec<InventoryItem>,
        user: impl Into<String>,
        removed_at: DateTime<Utc>,
    ) -> Self {
        let total_quantity = items.iter().map(|item| item.quantity).sum();
        let location = items.first().map(|item| item.location.clone()).unwrap_or_default();
        Self {
            batch_id,
            items,
            removed_at,
            total_quantity,
            user: user.into(),
            location,
        }
    }
}

/// Event: ItemsRestored (one per undo with at least one item restored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsRestored {
    pub batch_id: BatchId,
    pub items: Vec<InventoryItem>,
    pub restored_at: DateTime<Utc>,
    pub user: String,
}

/// Notifications emitted by the removal service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemovalEvent {
    ItemsRemoved(ItemsRemoved),
    ItemsRestored(ItemsRestored),
    UndoSessionCleared {
        discarded: usize,
        cleared_at: DateTime<Utc>,
    },
    LoadingStateChanged {
        loading: bool,
        changed_at: DateTime<Utc>,
    },
}

impl Event for RemovalEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RemovalEvent::ItemsRemoved(_) => "inventory.items.removed",
            RemovalEvent::ItemsRestored(_) => "inventory.items.restored",
            RemovalEvent::UndoSessionCleared { .. } => "inventory.undo_session.cleared",
            RemovalEvent::LoadingStateChanged { .. } => "inventory.loading_state.changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RemovalEvent::ItemsRemoved(e) => e.removed_at,
            RemovalEvent::ItemsRestored(e) => e.restored_at,
            RemovalEvent::UndoSessionCleared { cleared_at, .. } => *cleared_at,
            RemovalEvent::LoadingStateChanged { changed_at, .. } => *changed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::InventoryRow;

    fn item(location: &str, qty: i64) -> InventoryItem {
        InventoryItem::from_row(
            InventoryRow {
                part_id: Some("PN-1".to_string()),
                location: Some(location.to_string()),
                quantity: Some(qty),
                ..InventoryRow::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn items_removed_summarizes_quantity_and_first_location() {
        let now = Utc::now();
        let items = vec![item("WC02", 3), item("WC01", 4)];
        let event = ItemsRemoved::new(BatchId::new(), items, "jdoe", now);

        assert_eq!(event.total_quantity, 7);
        assert_eq!(event.location, "WC02");
        assert_eq!(RemovalEvent::ItemsRemoved(event).occurred_at(), now);
    }

    #[test]
    fn event_types_are_stable() {
        let ev = RemovalEvent::LoadingStateChanged {
            loading: true,
            changed_at: Utc::now(),
        };
        assert_eq!(ev.event_type(), "inventory.loading_state.changed");
        assert_eq!(ev.version(), 1);
    }

    #[test]
    fn serializes_with_type_tag() {
        let ev = RemovalEvent::UndoSessionCleared {
            discarded: 2,
            cleared_at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "undo_session_cleared");
        assert_eq!(json["discarded"], 2);
    }
}
