use crate::types::{PersistedState, TrackingKey, UpsertReceipt, UpsertRequest};

#[derive(Debug, thiserror::Error)]
pub enum TrackingStoreError {
    #[error("resource not found: {resource} ({id})")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl TrackingStoreError {
    /// Conflicts and malformed requests fail the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Serialization(_))
    }
}

pub type TrackingStoreResult<T> = Result<T, TrackingStoreError>;

#[async_trait::async_trait]
pub trait TrackingStore: Send + Sync {
    /// Merges `request.snapshot` into the state stored for `request.key`.
    ///
    /// Applying the same (key, session, sequence) twice is a no-op that still
    /// succeeds; a sequence older than the last one applied for that session
    /// is a conflict.
    async fn upsert(&self, request: UpsertRequest) -> TrackingStoreResult<UpsertReceipt>;

    async fn load(&self, key: &TrackingKey) -> TrackingStoreResult<Option<PersistedState>>;
}

#[async_trait::async_trait]
impl<T: TrackingStore + ?Sized> TrackingStore for std::sync::Arc<T> {
    async fn upsert(&self, request: UpsertRequest) -> TrackingStoreResult<UpsertReceipt> {
        (**self).upsert(request).await
    }

    async fn load(&self, key: &TrackingKey) -> TrackingStoreResult<Option<PersistedState>> {
        (**self).load(key).await
    }
}
