//! Recent transaction history (the "last 10" activity list shown to users).
//!
//! The removal service notifies the history after each successful removal.
//! Notification is fire-and-forget: failures are logged by the caller and
//! never change the outcome of the removal.

pub mod in_memory;

pub use in_memory::{InMemoryTransactionHistory, NoopTransactionHistory};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Direction of a quantity movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::In => "IN",
            TransactionKind::Out => "OUT",
        }
    }
}

/// One entry in a user's recent-activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub user: String,
    pub part_id: String,
    pub operation: String,
    pub quantity: i64,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryError {
    #[error("transaction history unavailable: {0}")]
    Unavailable(String),
    #[error("transaction history rejected entry: {0}")]
    Rejected(String),
}

/// Transaction history notifier abstraction.
#[async_trait::async_trait]
pub trait TransactionHistory: Send + Sync {
    async fn record(&self, entry: TransactionEntry) -> Result<(), HistoryError>;
}

#[async_trait::async_trait]
impl<H> TransactionHistory for Arc<H>
where
    H: TransactionHistory + ?Sized,
{
    async fn record(&self, entry: TransactionEntry) -> Result<(), HistoryError> {
        (**self).record(entry).await
    }
}
