//! Reference data boundary (valid parts, operations, locations and users).

pub mod in_memory;

pub use in_memory::InMemoryReferenceData;

use std::sync::Arc;

use stockroom_inventory::ReferenceCategory;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("reference data unavailable: {0}")]
    Unavailable(String),
    #[error("reference data for {0} is not loaded")]
    NotLoaded(ReferenceCategory),
}

/// Reference data provider abstraction.
#[async_trait::async_trait]
pub trait ReferenceData: Send + Sync {
    /// Reload every set from the source of truth.
    async fn refresh(&self) -> Result<(), ReferenceDataError>;

    /// The ordered values of one set.
    async fn values(&self, category: ReferenceCategory) -> Result<Vec<String>, ReferenceDataError>;
}

#[async_trait::async_trait]
impl<R> ReferenceData for Arc<R>
where
    R: ReferenceData + ?Sized,
{
    async fn refresh(&self) -> Result<(), ReferenceDataError> {
        (**self).refresh().await
    }

    async fn values(&self, category: ReferenceCategory) -> Result<Vec<String>, ReferenceDataError> {
        (**self).values(category).await
    }
}
