//! Durable tracking-state collaborator for the SCORM run-time adapter.
//!
//! The adapter only ever calls two operations: an idempotent `upsert` of a
//! commit snapshot keyed by (enrollment, content item), and `load` of the
//! merged state for hydration.

pub mod fs;
pub mod memory;
pub mod store;
pub mod testing;
pub mod types;

pub use fs::FsTrackingStore;
pub use memory::MemoryTrackingStore;
pub use store::{TrackingStore, TrackingStoreError, TrackingStoreResult};
pub use testing::FlakyTrackingStore;
pub use types::{
    CommitAction, ElementSnapshot, PersistedState, SessionId, TrackingKey, UpsertReceipt,
    UpsertRequest, commit_idempotency_key, snapshot_hash,
};
