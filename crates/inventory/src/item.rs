use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity};

/// Item type assumed when the store has no classification for a row.
pub const DEFAULT_ITEM_TYPE: &str = "WIP";

/// Store-assigned inventory record identifier (0 when the store did not report one).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A quantity of a part at a location/operation, as read from the record store.
///
/// Items are values: the removal flows move clones between the current result
/// set and the undo session and never edit them in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub part_id: String,
    pub location: String,
    pub operation: Option<String>,
    pub quantity: i64,
    pub item_type: String,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    pub user: String,
    pub last_updated_by: String,
    pub received_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// One row as returned by a record store lookup.
///
/// Every column is optional; stores differ in which columns they project.
/// `InventoryItem::from_row` turns a row into an item with explicit defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub id: Option<i64>,
    pub part_id: Option<String>,
    pub location: Option<String>,
    pub operation: Option<String>,
    pub quantity: Option<i64>,
    pub item_type: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    pub user: Option<String>,
    pub last_updated_by: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl InventoryItem {
    /// Decode a store row, filling absent columns with defaults.
    ///
    /// Missing timestamps fall back to `now`; a missing `last_updated_by`
    /// falls back to the owning user.
    pub fn from_row(row: InventoryRow, now: DateTime<Utc>) -> Self {
        let user = row.user.unwrap_or_default();
        let last_updated_by = non_blank(row.last_updated_by).unwrap_or_else(|| user.clone());

        Self {
            id: ItemId(row.id.unwrap_or(0)),
            part_id: row.part_id.unwrap_or_default(),
            location: row.location.unwrap_or_default(),
            operation: non_blank(row.operation),
            quantity: row.quantity.unwrap_or(0),
            item_type: non_blank(row.item_type).unwrap_or_else(|| DEFAULT_ITEM_TYPE.to_string()),
            batch_number: non_blank(row.batch_number),
            notes: non_blank(row.notes),
            user,
            last_updated_by,
            received_at: row.received_at.unwrap_or(now),
            last_updated_at: row.last_updated_at.unwrap_or(now),
        }
    }

    /// Local preconditions checked before any store call is made.
    pub fn validate_for_removal(&self) -> DomainResult<()> {
        if self.part_id.trim().is_empty() {
            return Err(DomainError::validation("Part ID is required"));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation("Quantity must be greater than 0"));
        }
        if self.location.trim().is_empty() {
            return Err(DomainError::validation("Location is required"));
        }
        Ok(())
    }

    /// Operation as sent to the store (empty when the item has none).
    pub fn operation_or_empty(&self) -> &str {
        self.operation.as_deref().unwrap_or("")
    }

    /// Batch number as sent to the store (empty when the item has none).
    pub fn batch_number_or_empty(&self) -> &str {
        self.batch_number.as_deref().unwrap_or("")
    }

    /// Whether two items denote the same store record.
    ///
    /// Items carrying a store-assigned id match on the id alone, whatever
    /// their quantity or timestamps; unidentified items (id 0) match only on
    /// their full value.
    pub fn same_identity(&self, other: &InventoryItem) -> bool {
        if self.id.value() != 0 && other.id.value() != 0 {
            self.id == other.id
        } else {
            self == other
        }
    }

    pub fn short_description(&self) -> String {
        format!("{} ({})", self.part_id, self.quantity)
    }

    pub fn full_description(&self) -> String {
        format!(
            "{} - {} - Op: {} - Qty: {}",
            self.part_id,
            self.location,
            self.operation_or_empty(),
            self.quantity
        )
    }
}

impl From<&InventoryItem> for InventoryRow {
    fn from(item: &InventoryItem) -> Self {
        Self {
            id: Some(item.id.0),
            part_id: Some(item.part_id.clone()),
            location: Some(item.location.clone()),
            operation: item.operation.clone(),
            quantity: Some(item.quantity),
            item_type: Some(item.item_type.clone()),
            batch_number: item.batch_number.clone(),
            notes: item.notes.clone(),
            user: Some(item.user.clone()),
            last_updated_by: Some(item.last_updated_by.clone()),
            received_at: Some(item.received_at),
            last_updated_at: Some(item.last_updated_at),
        }
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
    }

    fn full_row() -> InventoryRow {
        InventoryRow {
            id: Some(42),
            part_id: Some("PN-1001".to_string()),
            location: Some("WC01".to_string()),
            operation: Some("90".to_string()),
            quantity: Some(12),
            item_type: Some("FG".to_string()),
            batch_number: Some("0000123".to_string()),
            notes: Some("first shift".to_string()),
            user: Some("jdoe".to_string()),
            last_updated_by: Some("asmith".to_string()),
            received_at: Some(test_time()),
            last_updated_at: Some(test_time()),
        }
    }

    #[test]
    fn from_row_keeps_every_present_column() {
        let item = InventoryItem::from_row(full_row(), Utc::now());

        assert_eq!(item.id, ItemId(42));
        assert_eq!(item.part_id, "PN-1001");
        assert_eq!(item.operation.as_deref(), Some("90"));
        assert_eq!(item.item_type, "FG");
        assert_eq!(item.batch_number.as_deref(), Some("0000123"));
        assert_eq!(item.last_updated_by, "asmith");
        assert_eq!(item.received_at, test_time());
    }

    #[test]
    fn from_row_applies_defaults_for_missing_columns() {
        let now = test_time();
        let row = InventoryRow {
            part_id: Some("PN-2".to_string()),
            user: Some("jdoe".to_string()),
            item_type: Some("  ".to_string()),
            ..InventoryRow::default()
        };

        let item = InventoryItem::from_row(row, now);

        assert_eq!(item.id, ItemId(0));
        assert_eq!(item.location, "");
        assert_eq!(item.operation, None);
        assert_eq!(item.quantity, 0);
        assert_eq!(item.item_type, DEFAULT_ITEM_TYPE);
        assert_eq!(item.batch_number, None);
        assert_eq!(item.notes, None);
        assert_eq!(item.last_updated_by, "jdoe");
        assert_eq!(item.received_at, now);
        assert_eq!(item.last_updated_at, now);
    }

    #[test]
    fn row_conversion_is_lossless_for_decoded_items() {
        let item = InventoryItem::from_row(full_row(), Utc::now());
        let again = InventoryItem::from_row(InventoryRow::from(&item), Utc::now());
        assert_eq!(again, item);
    }

    #[test]
    fn identity_follows_store_id_when_present() {
        let item = InventoryItem::from_row(full_row(), test_time());
        let partial = InventoryItem {
            quantity: 4,
            last_updated_at: Utc::now(),
            ..item.clone()
        };
        let other_record = InventoryItem {
            id: ItemId(43),
            ..item.clone()
        };

        assert!(item.same_identity(&partial));
        assert!(!item.same_identity(&other_record));
    }

    #[test]
    fn unidentified_items_compare_by_value() {
        let row = InventoryRow {
            id: None,
            ..full_row()
        };
        let item = InventoryItem::from_row(row, test_time());
        let fewer = InventoryItem {
            quantity: 1,
            ..item.clone()
        };

        assert!(item.same_identity(&item.clone()));
        assert!(!item.same_identity(&fewer));
    }

    #[test]
    fn validation_rejects_blank_part() {
        let mut item = InventoryItem::from_row(full_row(), test_time());
        item.part_id = "   ".to_string();

        let err = item.validate_for_removal().unwrap_err();
        assert_eq!(err, DomainError::validation("Part ID is required"));
    }

    #[test]
    fn validation_rejects_non_positive_quantity() {
        let mut item = InventoryItem::from_row(full_row(), test_time());
        for qty in [0, -5] {
            item.quantity = qty;
            match item.validate_for_removal() {
                Err(DomainError::Validation(msg)) => assert!(msg.contains("greater than 0")),
                other => panic!("expected validation failure, got {other:?}"),
            }
        }
    }

    #[test]
    fn validation_rejects_blank_location() {
        let mut item = InventoryItem::from_row(full_row(), test_time());
        item.location = String::new();
        assert!(item.validate_for_removal().is_err());
    }

    #[test]
    fn valid_item_passes_and_describes_itself() {
        let item = InventoryItem::from_row(full_row(), test_time());
        assert!(item.validate_for_removal().is_ok());
        assert_eq!(item.short_description(), "PN-1001 (12)");
        assert_eq!(item.full_description(), "PN-1001 - WC01 - Op: 90 - Qty: 12");
        assert_eq!(*Entity::id(&item), ItemId(42));
    }
}
