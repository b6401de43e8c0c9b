use crate::store::{TrackingStore, TrackingStoreError, TrackingStoreResult};
use crate::types::{PersistedState, TrackingKey, UpsertReceipt, UpsertRequest};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Wraps another store and injects failures and latency, for exercising the
/// adapter's retry and timeout paths.
#[derive(Clone)]
pub struct FlakyTrackingStore {
    inner: Arc<dyn TrackingStore>,
    state: Arc<Mutex<FlakyState>>,
}

#[derive(Debug, Default)]
struct FlakyState {
    fail_next_upserts: u32,
    fail_next_loads: u32,
    upsert_delay: Option<Duration>,
    upsert_attempts: u64,
    delivered: Vec<UpsertRequest>,
}

impl FlakyTrackingStore {
    pub fn new<S: TrackingStore + 'static>(inner: S) -> Self {
        Self::wrap(Arc::new(inner))
    }

    pub fn wrap(inner: Arc<dyn TrackingStore>) -> Self {
        Self {
            inner,
            state: Arc::new(Mutex::new(FlakyState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, FlakyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_next_upserts(&self, count: u32) {
        self.state().fail_next_upserts = count;
    }

    pub fn fail_next_loads(&self, count: u32) {
        self.state().fail_next_loads = count;
    }

    /// Every upsert sleeps for `delay` before reaching the wrapped store.
    pub fn delay_upserts(&self, delay: Option<Duration>) {
        self.state().upsert_delay = delay;
    }

    pub fn upsert_attempts(&self) -> u64 {
        self.state().upsert_attempts
    }

    /// Requests the wrapped store actually applied, in application order.
    pub fn delivered(&self) -> Vec<UpsertRequest> {
        self.state().delivered.clone()
    }
}

#[async_trait::async_trait]
impl TrackingStore for FlakyTrackingStore {
    async fn upsert(&self, request: UpsertRequest) -> TrackingStoreResult<UpsertReceipt> {
        let (inject_failure, delay) = {
            let mut state = self.state();
            state.upsert_attempts += 1;
            let inject_failure = state.fail_next_upserts > 0;
            if inject_failure {
                state.fail_next_upserts -= 1;
            }
            (inject_failure, state.upsert_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if inject_failure {
            return Err(TrackingStoreError::Backend(format!(
                "injected upsert failure for {} sequence {}",
                request.key, request.sequence_no
            )));
        }

        let receipt = self.inner.upsert(request.clone()).await?;
        if receipt.applied {
            self.state().delivered.push(request);
        }
        Ok(receipt)
    }

    async fn load(&self, key: &TrackingKey) -> TrackingStoreResult<Option<PersistedState>> {
        let inject_failure = {
            let mut state = self.state();
            let inject_failure = state.fail_next_loads > 0;
            if inject_failure {
                state.fail_next_loads -= 1;
            }
            inject_failure
        };
        if inject_failure {
            return Err(TrackingStoreError::Backend(format!(
                "injected load failure for {key}"
            )));
        }
        self.inner.load(key).await
    }
}
