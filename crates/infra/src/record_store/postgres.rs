//! Postgres-backed record store.
//!
//! Quantities live in `inventory`; every successful command also appends a row
//! to `inventory_transactions` inside the same SQL transaction, so the two
//! tables never disagree.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use stockroom_inventory::InventoryRow;

use super::{RecordStore, RecordStoreError, StockCommand, StoreReply};
use crate::history::TransactionKind;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS inventory (
        id              BIGSERIAL PRIMARY KEY,
        part_id         TEXT NOT NULL,
        location        TEXT NOT NULL,
        operation       TEXT NOT NULL DEFAULT '',
        quantity        BIGINT NOT NULL CHECK (quantity >= 0),
        item_type       TEXT NOT NULL DEFAULT 'WIP',
        batch_number    TEXT NULL,
        notes           TEXT NULL,
        user_name       TEXT NOT NULL,
        last_updated_by TEXT NULL,
        received_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        last_updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS inventory_part_operation_idx ON inventory (part_id, operation)",
    "CREATE INDEX IF NOT EXISTS inventory_user_idx ON inventory (lower(user_name))",
    r#"
    CREATE TABLE IF NOT EXISTS inventory_transactions (
        id           BIGSERIAL PRIMARY KEY,
        kind         TEXT NOT NULL,
        inventory_id BIGINT NULL,
        part_id      TEXT NOT NULL,
        location     TEXT NOT NULL,
        operation    TEXT NOT NULL,
        quantity     BIGINT NOT NULL,
        item_type    TEXT NOT NULL,
        user_name    TEXT NOT NULL,
        batch_number TEXT NULL,
        notes        TEXT NULL,
        occurred_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

const SELECT_COLUMNS: &str = r#"
    SELECT id, part_id, location, operation, quantity, item_type, batch_number,
           notes, user_name, last_updated_by, received_at, last_updated_at
    FROM inventory
"#;

/// Postgres-backed record store.
///
/// Uses a SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RecordStoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RecordStoreError::Unavailable(format!("{operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_) => {
            RecordStoreError::Decode(format!("{operation}: {err}"))
        }
        other => RecordStoreError::Query(format!("{operation}: {other}")),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

fn decode_row(row: &PgRow) -> Result<InventoryRow, sqlx::Error> {
    Ok(InventoryRow {
        id: row.try_get::<Option<i64>, _>("id")?,
        part_id: row.try_get::<Option<String>, _>("part_id")?,
        location: row.try_get::<Option<String>, _>("location")?,
        operation: row.try_get::<Option<String>, _>("operation")?,
        quantity: row.try_get::<Option<i64>, _>("quantity")?,
        item_type: row.try_get::<Option<String>, _>("item_type")?,
        batch_number: row.try_get::<Option<String>, _>("batch_number")?,
        notes: row.try_get::<Option<String>, _>("notes")?,
        user: row.try_get::<Option<String>, _>("user_name")?,
        last_updated_by: row.try_get::<Option<String>, _>("last_updated_by")?,
        received_at: row.try_get::<Option<DateTime<Utc>>, _>("received_at")?,
        last_updated_at: row.try_get::<Option<DateTime<Utc>>, _>("last_updated_at")?,
    })
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("failed to create Postgres pool for record store")?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Connect using `DATABASE_URL`.
    pub async fn connect_from_env() -> anyhow::Result<Self> {
        let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        Self::connect(&url).await
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to create record store schema")?;
        }
        Ok(())
    }

    async fn fetch(
        &self,
        operation: &str,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<InventoryRow>, RecordStoreError> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        rows.iter()
            .map(|row| decode_row(row).map_err(|e| map_sqlx_error(operation, e)))
            .collect()
    }

    async fn record_transaction(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        kind: TransactionKind,
        inventory_id: i64,
        command: &StockCommand,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO inventory_transactions
                (kind, inventory_id, part_id, location, operation, quantity,
                 item_type, user_name, batch_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(kind.as_str())
        .bind(inventory_id)
        .bind(&command.part_id)
        .bind(&command.location)
        .bind(&command.operation)
        .bind(command.quantity)
        .bind(&command.item_type)
        .bind(&command.user)
        .bind(non_empty(&command.batch_number))
        .bind(non_empty(&command.notes))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for PostgresRecordStore {
    async fn lookup_by_part_and_operation(
        &self,
        part_id: &str,
        operation: &str,
    ) -> Result<Vec<InventoryRow>, RecordStoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE part_id = $1 AND operation = $2 ORDER BY id");
        self.fetch("lookup_by_part_and_operation", sqlx::query(&sql).bind(part_id).bind(operation))
            .await
    }

    async fn lookup_by_part(&self, part_id: &str) -> Result<Vec<InventoryRow>, RecordStoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE part_id = $1 ORDER BY id");
        self.fetch("lookup_by_part", sqlx::query(&sql).bind(part_id)).await
    }

    async fn lookup_by_user(&self, user: &str) -> Result<Vec<InventoryRow>, RecordStoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE lower(user_name) = lower($1) ORDER BY id");
        self.fetch("lookup_by_user", sqlx::query(&sql).bind(user)).await
    }

    async fn remove(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError> {
        let op = "remove";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let found = sqlx::query(
            r#"
            SELECT id, quantity
            FROM inventory
            WHERE part_id = $1
              AND location = $2
              AND operation = $3
              AND ($4 = '' OR COALESCE(batch_number, '') = $4)
              AND quantity >= $5
            ORDER BY id
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(&command.part_id)
        .bind(&command.location)
        .bind(&command.operation)
        .bind(&command.batch_number)
        .bind(command.quantity)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;

        let Some(row) = found else {
            tx.rollback().await.map_err(|e| map_sqlx_error(op, e))?;
            return Ok(StoreReply::rejected(format!(
                "No inventory of {} at {} with at least {} available",
                command.part_id, command.location, command.quantity
            )));
        };

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error(op, e))?;
        let on_hand: i64 = row.try_get("quantity").map_err(|e| map_sqlx_error(op, e))?;

        if on_hand == command.quantity {
            sqlx::query("DELETE FROM inventory WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        } else {
            sqlx::query(
                r#"
                UPDATE inventory
                SET quantity = quantity - $2, last_updated_by = $3, last_updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(command.quantity)
            .bind(&command.user)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        }

        Self::record_transaction(&mut tx, TransactionKind::Out, id, command)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        Ok(StoreReply::ok(format!("Removed {} of {}", command.quantity, command.part_id)))
    }

    async fn insert(&self, command: &StockCommand) -> Result<StoreReply, RecordStoreError> {
        if command.part_id.trim().is_empty() {
            return Ok(StoreReply::rejected("PartID cannot be null or empty"));
        }
        if command.user.trim().is_empty() {
            return Ok(StoreReply::rejected("User cannot be null or empty"));
        }
        if command.quantity <= 0 {
            return Ok(StoreReply::rejected("Quantity must be greater than 0"));
        }

        let op = "insert";
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO inventory
                (part_id, location, operation, quantity, item_type, batch_number, notes,
                 user_name, last_updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(&command.part_id)
        .bind(&command.location)
        .bind(&command.operation)
        .bind(command.quantity)
        .bind(&command.item_type)
        .bind(non_empty(&command.batch_number))
        .bind(non_empty(&command.notes))
        .bind(&command.user)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;

        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error(op, e))?;

        Self::record_transaction(&mut tx, TransactionKind::In, id, command)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        Ok(StoreReply {
            status: 1,
            message: format!("Added {} of {}", command.quantity, command.part_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_inventory::InventoryItem;

    fn command(part: &str, qty: i64) -> StockCommand {
        let item = InventoryItem::from_row(
            InventoryRow {
                part_id: Some(part.to_string()),
                location: Some("WC01".to_string()),
                operation: Some("90".to_string()),
                quantity: Some(qty),
                ..InventoryRow::default()
            },
            Utc::now(),
        );
        StockCommand::for_item(&item, "jdoe", "postgres test")
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable Postgres database"]
    async fn insert_then_remove_round_trips_quantity() {
        let store = PostgresRecordStore::connect_from_env().await.unwrap();
        let part = format!("PG-{}", stockroom_core::BatchId::new());

        assert!(store.insert(&command(&part, 5)).await.unwrap().is_success());
        assert_eq!(store.lookup_by_part(&part).await.unwrap().len(), 1);

        assert!(store.remove(&command(&part, 2)).await.unwrap().is_success());
        let rows = store.lookup_by_part_and_operation(&part, "90").await.unwrap();
        assert_eq!(rows[0].quantity, Some(3));

        let reply = store.remove(&command(&part, 10)).await.unwrap();
        assert_eq!(reply.status, -1);

        assert!(store.remove(&command(&part, 3)).await.unwrap().is_success());
        assert!(store.lookup_by_part(&part).await.unwrap().is_empty());
    }

    #[test]
    fn non_empty_treats_blank_as_absent() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty("B-1"), Some("B-1"));
    }
}
