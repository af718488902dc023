use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use super::{HistoryError, TransactionEntry, TransactionHistory};

/// In-memory recent-activity history: the newest `capacity` entries per user.
#[derive(Debug)]
pub struct InMemoryTransactionHistory {
    capacity: usize,
    by_user: RwLock<HashMap<String, VecDeque<TransactionEntry>>>,
}

impl InMemoryTransactionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            by_user: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc(capacity: usize) -> Arc<Self> {
        Arc::new(Self::new(capacity))
    }

    /// Entries for a user, newest first (user names compare case-insensitively).
    pub fn recent(&self, user: &str) -> Vec<TransactionEntry> {
        let key = user.to_lowercase();
        self.by_user
            .read()
            .ok()
            .and_then(|map| map.get(&key).map(|entries| entries.iter().cloned().collect()))
            .unwrap_or_default()
    }
}

impl Default for InMemoryTransactionHistory {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait::async_trait]
impl TransactionHistory for InMemoryTransactionHistory {
    async fn record(&self, entry: TransactionEntry) -> Result<(), HistoryError> {
        if entry.user.trim().is_empty() {
            return Err(HistoryError::Rejected("user is required".to_string()));
        }

        let mut map = self
            .by_user
            .write()
            .map_err(|_| HistoryError::Unavailable("history lock poisoned".to_string()))?;
        let entries = map.entry(entry.user.to_lowercase()).or_default();
        entries.push_front(entry);
        entries.truncate(self.capacity);
        Ok(())
    }
}

/// History that discards every entry (hosts without a recent-activity view).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransactionHistory;

#[async_trait::async_trait]
impl TransactionHistory for NoopTransactionHistory {
    async fn record(&self, _entry: TransactionEntry) -> Result<(), HistoryError> {
        Ok(())
    }
}
