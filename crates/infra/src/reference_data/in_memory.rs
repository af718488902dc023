use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use stockroom_inventory::ReferenceCategory;

use super::{ReferenceData, ReferenceDataError};

/// In-memory reference data for tests/dev.
///
/// Each set is kept sorted case-insensitively with case-insensitive duplicates
/// removed, so suggestion order is stable.
#[derive(Debug, Default)]
pub struct InMemoryReferenceData {
    sets: RwLock<HashMap<ReferenceCategory, Vec<String>>>,
    refreshes: AtomicUsize,
}

fn normalize(mut values: Vec<String>) -> Vec<String> {
    values.retain(|v| !v.trim().is_empty());
    values.sort_by_key(|v| v.to_lowercase());
    values.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    values
}

impl InMemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn with_values<I, S>(self, category: ReferenceCategory, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values(category, values);
        self
    }

    /// Replace one set.
    pub fn set_values<I, S>(&self, category: ReferenceCategory, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = normalize(values.into_iter().map(Into::into).collect());
        if let Ok(mut sets) = self.sets.write() {
            sets.insert(category, values);
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReferenceData for InMemoryReferenceData {
    async fn refresh(&self) -> Result<(), ReferenceDataError> {
        // Nothing upstream to reload; re-normalize in case sets were edited.
        let mut sets = self
            .sets
            .write()
            .map_err(|_| {
                ReferenceDataError::Unavailable("reference data lock poisoned".to_string())
            })?;
        for values in sets.values_mut() {
            *values = normalize(std::mem::take(values));
        }
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn values(&self, category: ReferenceCategory) -> Result<Vec<String>, ReferenceDataError> {
        let sets = self
            .sets
            .read()
            .map_err(|_| {
                ReferenceDataError::Unavailable("reference data lock poisoned".to_string())
            })?;
        sets.get(&category)
            .cloned()
            .ok_or(ReferenceDataError::NotLoaded(category))
    }
}
