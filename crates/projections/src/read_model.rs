//! Read model trait for query-side views.

use async_trait::async_trait;

/// A read model providing query access to denormalized data.
///
/// Read models are updated by projections and optimized for fast reads.
#[async_trait]
pub trait ReadModel: Send + Sync {
    /// Returns the name of this read model.
    fn name(&self) -> &'static str;

    /// Returns the number of entries in this read model.
    ///
    /// Waits for a projection update in progress, so the count is never a
    /// half-applied event.
    async fn count(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.count().await == 0
    }
}
