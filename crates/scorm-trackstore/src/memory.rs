use crate::store::{TrackingStore, TrackingStoreError, TrackingStoreResult};
use crate::types::{
    CommitAction, PersistedState, TrackingKey, UpsertReceipt, UpsertRequest, snapshot_hash,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct MemoryState {
    pub records: BTreeMap<String, PersistedState>,
    /// idempotency key → snapshot hash of the applied record
    pub applied: BTreeMap<String, String>,
    /// storage key + session id → highest applied sequence number
    pub session_heads: BTreeMap<String, u64>,
}

impl MemoryState {
    fn session_head_key(key: &TrackingKey, session_id: &str) -> String {
        format!("{}|{}:{}", key.storage_key(), session_id.len(), session_id)
    }

    pub(crate) fn apply(&mut self, request: UpsertRequest) -> TrackingStoreResult<UpsertReceipt> {
        if request.key.enrollment_id.is_empty() || request.key.content_item_id.is_empty() {
            return Err(TrackingStoreError::InvalidInput(
                "enrollment id and content item id must be non-empty".to_string(),
            ));
        }
        if request.session_id.is_empty() {
            return Err(TrackingStoreError::InvalidInput(
                "session id must be non-empty".to_string(),
            ));
        }

        let idempotency_key = request.idempotency_key();
        let hash = snapshot_hash(&request.snapshot);
        if let Some(existing_hash) = self.applied.get(&idempotency_key) {
            if *existing_hash != hash {
                return Err(TrackingStoreError::Conflict(format!(
                    "record {} for {} was already applied with different content",
                    request.sequence_no, request.key
                )));
            }
            return Ok(UpsertReceipt {
                key: request.key,
                session_id: request.session_id,
                sequence_no: request.sequence_no,
                applied: false,
                snapshot_hash: hash,
            });
        }

        let head_key = Self::session_head_key(&request.key, &request.session_id);
        if let Some(head) = self.session_heads.get(&head_key) {
            if request.sequence_no <= *head {
                return Err(TrackingStoreError::Conflict(format!(
                    "stale record {} for {}: sequence {} already applied",
                    request.sequence_no, request.key, head
                )));
            }
        }

        let record = self
            .records
            .entry(request.key.storage_key())
            .or_insert_with(|| PersistedState::empty(request.key.clone()));
        record
            .elements
            .extend(request.snapshot.iter().map(|(k, v)| (k.clone(), v.clone())));
        record.last_session_id = Some(request.session_id.clone());
        record.last_sequence_no = request.sequence_no;
        record.last_action = Some(request.action);
        record.commit_count += 1;
        record.terminated = request.action == CommitAction::Terminate;

        self.session_heads.insert(head_key, request.sequence_no);
        self.applied.insert(idempotency_key, hash.clone());

        Ok(UpsertReceipt {
            key: request.key,
            session_id: request.session_id,
            sequence_no: request.sequence_no,
            applied: true,
            snapshot_hash: hash,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryTrackingStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: MemoryState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) fn snapshot(&self) -> TrackingStoreResult<MemoryState> {
        self.inner
            .lock()
            .map(|state| state.clone())
            .map_err(|_| TrackingStoreError::Backend("memory trackstore mutex poisoned".to_string()))
    }

    /// Applies `request` to a copy of the state and only swaps it in once
    /// `commit` accepted the copy.
    pub(crate) fn apply_durably<F>(
        &self,
        request: UpsertRequest,
        commit: F,
    ) -> TrackingStoreResult<UpsertReceipt>
    where
        F: FnOnce(&MemoryState) -> TrackingStoreResult<()>,
    {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| TrackingStoreError::Backend("memory trackstore mutex poisoned".to_string()))?;
        let mut next = state.clone();
        let receipt = next.apply(request)?;
        if receipt.applied {
            commit(&next)?;
            *state = next;
        }
        Ok(receipt)
    }

    pub fn keys(&self) -> TrackingStoreResult<Vec<TrackingKey>> {
        let state = self.snapshot()?;
        Ok(state.records.values().map(|record| record.key.clone()).collect())
    }
}

#[async_trait::async_trait]
impl TrackingStore for MemoryTrackingStore {
    async fn upsert(&self, request: UpsertRequest) -> TrackingStoreResult<UpsertReceipt> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| TrackingStoreError::Backend("memory trackstore mutex poisoned".to_string()))?;
        state.apply(request)
    }

    async fn load(&self, key: &TrackingKey) -> TrackingStoreResult<Option<PersistedState>> {
        let state = self
            .inner
            .lock()
            .map_err(|_| TrackingStoreError::Backend("memory trackstore mutex poisoned".to_string()))?;
        Ok(state.records.get(&key.storage_key()).cloned())
    }
}
