use crate::memory::{MemoryState, MemoryTrackingStore};
use crate::store::{TrackingStore, TrackingStoreError, TrackingStoreResult};
use crate::types::{PersistedState, TrackingKey, UpsertReceipt, UpsertRequest};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_FILE_NAME: &str = "trackstore-state.json";

#[derive(Clone, Debug)]
pub struct FsTrackingStore {
    state_file: PathBuf,
    inner: MemoryTrackingStore,
}

impl FsTrackingStore {
    pub fn new<P: AsRef<Path>>(root: P) -> TrackingStoreResult<Self> {
        fs::create_dir_all(root.as_ref()).map_err(|err| {
            TrackingStoreError::Backend(format!("create fs store root failed: {err}"))
        })?;
        let state_file = root.as_ref().join(STATE_FILE_NAME);
        let state = if state_file.exists() {
            let raw = fs::read(&state_file).map_err(|err| {
                TrackingStoreError::Backend(format!("read state file failed: {err}"))
            })?;
            serde_json::from_slice::<MemoryState>(&raw)
                .map_err(|err| TrackingStoreError::Serialization(err.to_string()))?
        } else {
            MemoryState::default()
        };

        Ok(Self {
            state_file,
            inner: MemoryTrackingStore::from_state(state),
        })
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    pub fn keys(&self) -> TrackingStoreResult<Vec<TrackingKey>> {
        self.inner.keys()
    }

    fn persist(state_file: &Path, state: &MemoryState) -> TrackingStoreResult<()> {
        let raw = serde_json::to_vec_pretty(state)
            .map_err(|err| TrackingStoreError::Serialization(err.to_string()))?;
        let tmp = state_file.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|err| {
            TrackingStoreError::Backend(format!("write state file failed: {err}"))
        })?;
        fs::rename(&tmp, state_file).map_err(|err| {
            TrackingStoreError::Backend(format!("rename state file failed: {err}"))
        })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TrackingStore for FsTrackingStore {
    async fn upsert(&self, request: UpsertRequest) -> TrackingStoreResult<UpsertReceipt> {
        let state_file = self.state_file.clone();
        self.inner
            .apply_durably(request, |next| Self::persist(&state_file, next))
    }

    async fn load(&self, key: &TrackingKey) -> TrackingStoreResult<Option<PersistedState>> {
        self.inner.load(key).await
    }
}
