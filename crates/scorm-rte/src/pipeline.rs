use crate::errors::DeliveryError;
use crate::registry::InFlightGuard;
use crate::retry::{DeliveryPolicy, delay_for_attempt_ms, should_retry};
use scorm_trackstore::{
    CommitAction, ElementSnapshot, PersistedState, SessionId, TrackingKey, TrackingStore,
    TrackingStoreResult, UpsertReceipt, UpsertRequest,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered { attempts: u32, applied: bool },
    Failed { attempts: u32, reason: String },
}

/// An immutable snapshot of dirty elements queued for delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub key: TrackingKey,
    pub session_id: SessionId,
    pub sequence_no: u64,
    pub action: CommitAction,
    pub snapshot: ElementSnapshot,
    pub status: DeliveryStatus,
}

impl CommitRecord {
    pub fn new(
        key: TrackingKey,
        session_id: SessionId,
        sequence_no: u64,
        action: CommitAction,
        snapshot: ElementSnapshot,
    ) -> Self {
        Self {
            key,
            session_id,
            sequence_no,
            action,
            snapshot,
            status: DeliveryStatus::Pending,
        }
    }

    pub fn upsert_request(&self) -> UpsertRequest {
        UpsertRequest {
            key: self.key.clone(),
            session_id: self.session_id.clone(),
            sequence_no: self.sequence_no,
            action: self.action,
            snapshot: self.snapshot.clone(),
        }
    }
}

#[derive(Debug)]
pub struct DeliveryReport {
    pub attempts: u32,
    pub result: Result<UpsertReceipt, DeliveryError>,
}

/// Delivers commit records and loads persisted state with bounded retry.
#[derive(Clone)]
pub struct CommitPipeline {
    store: Arc<dyn TrackingStore>,
    policy: DeliveryPolicy,
}

impl CommitPipeline {
    pub fn new(store: Arc<dyn TrackingStore>, policy: DeliveryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Blocks until `record` is delivered or the policy gives up. `guard`
    /// is released when the delivery settles, even if the caller has
    /// stopped waiting for it.
    pub fn deliver_blocking(&self, record: &CommitRecord, guard: InFlightGuard) -> DeliveryReport {
        let store = Arc::clone(&self.store);
        let policy = self.policy.clone();
        let request = record.upsert_request();
        let sequence_no = record.sequence_no;

        let outcome = block_on_worker("deliver", async move {
            let _guard = guard;
            let (attempts, result) = with_retry(&policy, sequence_no, || {
                let store = Arc::clone(&store);
                let request = request.clone();
                async move { store.upsert(request).await }
            })
            .await;
            Ok((attempts, result))
        });

        match outcome {
            Ok((attempts, result)) => DeliveryReport { attempts, result },
            Err(error) => DeliveryReport {
                attempts: 0,
                result: Err(error),
            },
        }
    }

    pub fn load_blocking(&self, key: &TrackingKey) -> Result<Option<PersistedState>, DeliveryError> {
        let store = Arc::clone(&self.store);
        let policy = self.policy.clone();
        let key = key.clone();
        block_on_worker("load", async move {
            let (_, result) = with_retry(&policy, 0, || {
                let store = Arc::clone(&store);
                let key = key.clone();
                async move { store.load(&key).await }
            })
            .await;
            result
        })
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy runs out of attempts. Returns the number of attempts made.
pub async fn with_retry<T, F, Fut>(
    policy: &DeliveryPolicy,
    jitter_seed: u64,
    mut operation: F,
) -> (u32, Result<T, DeliveryError>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TrackingStoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let timeout = Duration::from_millis(policy.attempt_timeout_ms);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => return (attempt, Ok(value)),
            Ok(Err(error)) => DeliveryError::Store(error),
            Err(_) => DeliveryError::Timeout {
                timeout_ms: policy.attempt_timeout_ms,
            },
        };

        if !should_retry(&error) {
            return (attempt, Err(error));
        }
        tracing::warn!(attempt, max_attempts, %error, "store attempt failed");
        if attempt >= max_attempts {
            return (
                attempt,
                Err(DeliveryError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                }),
            );
        }
        let delay_ms = delay_for_attempt_ms(attempt, &policy.backoff, jitter_seed);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Runs `future` to completion on a worker thread with its own
/// current-thread runtime. Content calls are synchronous, so this is where
/// they wait on store I/O; it also works when the caller sits inside a
/// host runtime.
pub fn block_on_worker<F, T>(operation: &'static str, future: F) -> Result<T, DeliveryError>
where
    F: Future<Output = Result<T, DeliveryError>> + Send + 'static,
    T: Send + 'static,
{
    let worker = std::thread::Builder::new()
        .name(format!("scorm-rte-{operation}"))
        .spawn(move || {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|error| {
                    DeliveryError::Runtime(format!("{operation} worker runtime: {error}"))
                })?
                .block_on(future)
        })
        .map_err(|error| DeliveryError::Runtime(format!("{operation} worker spawn: {error}")))?;
    worker.join().unwrap_or_else(|_| {
        Err(DeliveryError::Runtime(format!(
            "{operation} worker panicked"
        )))
    })
}
