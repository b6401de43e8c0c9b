use crate::datamodel::{CmiStore, LaunchContext};
use crate::errors::{DeliveryError, RteFault};
use crate::events::{EventEmitter, EventKind, emit_event, event_data};
use crate::lifecycle::{ApiCall, LifecycleState};
use crate::pipeline::{CommitPipeline, CommitRecord, DeliveryStatus};
use crate::registry::{InFlightGuard, SessionRegistry};
use crate::reporter::ErrorReporter;
use crate::version::ScormVersion;
use scorm_trackstore::{CommitAction, PersistedState, SessionId, TrackingKey};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Collaborators a session needs besides its own identity.
#[derive(Clone)]
pub struct SessionContext {
    pub pipeline: CommitPipeline,
    pub registry: Arc<SessionRegistry>,
    pub emitter: Arc<dyn EventEmitter>,
    pub hydrate_timeout: Duration,
}

/// Result of flushing dirty elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was dirty; nothing was delivered.
    Empty,
    Delivered { sequence_no: u64, attempts: u32 },
    /// The session was torn down while delivering; the outcome was dropped.
    Discarded { sequence_no: u64 },
}

struct SessionCore {
    state: LifecycleState,
    store: CmiStore,
    reporter: ErrorReporter,
    next_sequence_no: u64,
    journal: Vec<CommitRecord>,
    initializing: bool,
    delivering: bool,
    torn_down: bool,
    api_calls: u64,
    started_at: Option<Instant>,
}

impl SessionCore {
    fn begin_call(&mut self) {
        self.api_calls += 1;
        self.reporter.clear();
    }

    fn admit(&self, call: ApiCall) -> Result<(), RteFault> {
        if call == ApiCall::Initialize && self.initializing {
            return Err(RteFault::AlreadyInitialized);
        }
        self.state.admit(call)
    }

    fn transition(&mut self, next: LifecycleState) {
        if self.state.can_transition_to(&next) {
            self.state = next;
        }
    }
}

struct SessionInner {
    id: SessionId,
    key: TrackingKey,
    version: ScormVersion,
    context: SessionContext,
    /// Serializes flushes so records reach the store in sequence order.
    flush_lock: Mutex<()>,
    core: Mutex<SessionCore>,
}

/// One content attempt for an (enrollment, content item) pair: lifecycle,
/// element store, error state and commit journal.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct RteSession {
    inner: Arc<SessionInner>,
}

impl RteSession {
    pub fn new(
        key: TrackingKey,
        version: ScormVersion,
        launch: LaunchContext,
        context: SessionContext,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        Self {
            inner: Arc::new(SessionInner {
                id,
                key,
                version,
                context,
                flush_lock: Mutex::new(()),
                core: Mutex::new(SessionCore {
                    state: LifecycleState::NotInitialized,
                    store: CmiStore::new(version, launch),
                    reporter: ErrorReporter::new(version),
                    next_sequence_no: 1,
                    journal: Vec::new(),
                    initializing: false,
                    delivering: false,
                    torn_down: false,
                    api_calls: 0,
                    started_at: None,
                }),
            }),
        }
    }

    fn core(&self) -> MutexGuard<'_, SessionCore> {
        self.inner
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn key(&self) -> &TrackingKey {
        &self.inner.key
    }

    pub fn version(&self) -> ScormVersion {
        self.inner.version
    }

    pub fn state(&self) -> LifecycleState {
        self.core().state
    }

    pub fn is_torn_down(&self) -> bool {
        self.core().torn_down
    }

    pub fn entry(&self) -> &'static str {
        self.core().store.entry()
    }

    pub fn dirty_len(&self) -> usize {
        self.core().store.dirty_len()
    }

    pub fn is_dirty(&self, element: &str) -> bool {
        self.core().store.is_dirty(element)
    }

    /// Every commit record this session produced, in sequence order.
    pub fn journal(&self) -> Vec<CommitRecord> {
        self.core().journal.clone()
    }

    pub fn api_call_count(&self) -> u64 {
        self.core().api_calls
    }

    pub fn last_error_code(&self) -> u16 {
        self.core().reporter.last_code()
    }

    fn reject(&self, core: &mut SessionCore, call: ApiCall, fault: RteFault) {
        let code = core.reporter.record(&fault);
        tracing::debug!(
            session_id = %self.inner.id,
            call = call.as_str(),
            code,
            class = ?fault.class(),
            %fault,
            "call rejected"
        );
    }

    pub fn initialize(&self, parameter: &str) -> bool {
        {
            let mut core = self.core();
            core.begin_call();
            if let Err(fault) = core
                .admit(ApiCall::Initialize)
                .and_then(|()| require_empty(ApiCall::Initialize, parameter))
            {
                self.reject(&mut core, ApiCall::Initialize, fault);
                return false;
            }
            core.initializing = true;
        }

        let loaded = self.claim_and_load();

        let mut core = self.core();
        core.initializing = false;
        let persisted = match loaded {
            Ok(persisted) if !core.torn_down => persisted,
            Ok(_) => {
                self.release_claim();
                let fault =
                    RteFault::InitializationFailed("session was torn down".to_string());
                self.reject(&mut core, ApiCall::Initialize, fault);
                return false;
            }
            Err(fault) => {
                self.reject(&mut core, ApiCall::Initialize, fault);
                return false;
            }
        };

        let restored = core.store.hydrate(persisted.as_ref());
        core.transition(LifecycleState::Running);
        core.started_at = Some(Instant::now());
        let entry = core.store.entry();
        drop(core);

        tracing::info!(
            session_id = %self.inner.id,
            key = %self.inner.key,
            version = %self.inner.version,
            entry,
            restored,
            "session initialized"
        );
        emit_event(
            self.inner.context.emitter.as_ref(),
            EventKind::SessionInitialized,
            &self.inner.id,
            event_data([
                ("version", json!(self.inner.version.as_str())),
                ("entry", json!(entry)),
                ("has_existing_data", json!(persisted.is_some())),
                ("restored_elements", json!(restored)),
            ]),
        );
        true
    }

    /// Claims the pair, waits for earlier deliveries to settle and loads
    /// persisted state. The claim is released again on failure.
    fn claim_and_load(&self) -> Result<Option<PersistedState>, RteFault> {
        let key = &self.inner.key;
        let registry = &self.inner.context.registry;
        registry.claim(key, &self.inner.id).map_err(|holder| {
            RteFault::InitializationFailed(format!("{key} is held by session {holder}"))
        })?;

        let hydrate_timeout = self.inner.context.hydrate_timeout;
        let loaded = registry
            .wait_settled(key, hydrate_timeout)
            .map_err(|pending| DeliveryError::InFlight {
                pending,
                waited_ms: hydrate_timeout.as_millis() as u64,
            })
            .and_then(|()| self.inner.context.pipeline.load_blocking(key))
            .map_err(|error| {
                RteFault::InitializationFailed(format!("hydrating {key} failed: {error}"))
            });
        if loaded.is_err() {
            self.release_claim();
        }
        loaded
    }

    fn release_claim(&self) {
        self.inner
            .context
            .registry
            .release(&self.inner.key, &self.inner.id);
    }

    pub fn terminate(&self, parameter: &str) -> bool {
        let flushing = self.flush_guard();
        let prepared = {
            let mut core = self.core();
            core.begin_call();
            if let Err(fault) = core
                .admit(ApiCall::Terminate)
                .and_then(|()| require_empty(ApiCall::Terminate, parameter))
            {
                self.reject(&mut core, ApiCall::Terminate, fault);
                return false;
            }
            // The final snapshot is taken under the same lock as the
            // transition so a concurrent teardown sees it as in flight.
            core.transition(LifecycleState::Terminated);
            self.prepare(&mut core, CommitAction::Terminate)
        };

        let flushed = self.deliver(prepared, CommitAction::Terminate);
        drop(flushing);
        self.release_claim();

        let mut core = self.core();
        if core.torn_down {
            self.reject(
                &mut core,
                ApiCall::Terminate,
                RteFault::General("session was torn down during Terminate".to_string()),
            );
            return false;
        }
        let flush_succeeded = flushed.is_ok();
        let session_duration_ms = core
            .started_at
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let api_call_count = core.api_calls;
        let outcome = match flushed {
            Ok(_) => true,
            Err(fault) => {
                self.reject(&mut core, ApiCall::Terminate, fault);
                false
            }
        };
        drop(core);

        tracing::info!(
            session_id = %self.inner.id,
            key = %self.inner.key,
            flush_succeeded,
            session_duration_ms,
            "session terminated"
        );
        emit_event(
            self.inner.context.emitter.as_ref(),
            EventKind::SessionTerminated,
            &self.inner.id,
            event_data([
                ("session_duration_ms", json!(session_duration_ms)),
                ("api_call_count", json!(api_call_count)),
                ("flush_succeeded", json!(flush_succeeded)),
            ]),
        );
        outcome
    }

    pub fn get_value(&self, element: &str) -> String {
        let mut core = self.core();
        core.begin_call();
        let result = core
            .admit(ApiCall::GetValue)
            .and_then(|()| core.store.get_value(element));
        match result {
            Ok(value) => {
                tracing::debug!(session_id = %self.inner.id, element, "GetValue");
                value
            }
            Err(fault) => {
                self.reject(&mut core, ApiCall::GetValue, fault);
                String::new()
            }
        }
    }

    pub fn set_value(&self, element: &str, value: &str) -> bool {
        let mut core = self.core();
        core.begin_call();
        let result = core
            .admit(ApiCall::SetValue)
            .and_then(|()| core.store.set_value(element, value));
        match result {
            Ok(()) => {
                tracing::debug!(session_id = %self.inner.id, element, "SetValue");
                true
            }
            Err(fault) => {
                self.reject(&mut core, ApiCall::SetValue, fault);
                false
            }
        }
    }

    pub fn commit(&self, parameter: &str) -> bool {
        {
            let mut core = self.core();
            core.begin_call();
            if let Err(fault) = core
                .admit(ApiCall::Commit)
                .and_then(|()| require_empty(ApiCall::Commit, parameter))
            {
                self.reject(&mut core, ApiCall::Commit, fault);
                return false;
            }
        }

        let fault = match self.flush(CommitAction::Commit) {
            Ok(FlushOutcome::Discarded { sequence_no }) => RteFault::General(format!(
                "session was torn down while delivering commit {sequence_no}"
            )),
            Ok(_) => return true,
            Err(fault) => fault,
        };
        let mut core = self.core();
        self.reject(&mut core, ApiCall::Commit, fault);
        false
    }

    pub fn last_error(&self) -> String {
        let mut core = self.core();
        core.api_calls += 1;
        core.reporter.last_error()
    }

    pub fn error_string(&self, code: &str) -> String {
        let mut core = self.core();
        core.api_calls += 1;
        core.reporter.error_string(code)
    }

    pub fn diagnostic(&self, code: &str) -> String {
        let mut core = self.core();
        core.api_calls += 1;
        core.reporter.diagnostic(code)
    }

    fn flush_guard(&self) -> MutexGuard<'_, ()> {
        self.inner
            .flush_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshots every dirty element into the next commit record and blocks
    /// until it is delivered or the delivery policy gives up.
    pub fn flush(&self, action: CommitAction) -> Result<FlushOutcome, RteFault> {
        let _flushing = self.flush_guard();
        let prepared = {
            let mut core = self.core();
            if core.torn_down {
                return Err(RteFault::General("session was torn down".to_string()));
            }
            self.prepare(&mut core, action)
        };
        self.deliver(prepared, action)
    }

    /// Queues the dirty set as the next commit record and marks a delivery
    /// in flight. Callers hold the flush lock.
    fn prepare(
        &self,
        core: &mut SessionCore,
        action: CommitAction,
    ) -> Option<(CommitRecord, InFlightGuard)> {
        let snapshot = core.store.dirty_snapshot();
        if snapshot.is_empty() {
            return None;
        }
        let sequence_no = core.next_sequence_no;
        core.next_sequence_no += 1;
        let record = CommitRecord::new(
            self.inner.key.clone(),
            self.inner.id.clone(),
            sequence_no,
            action,
            snapshot,
        );
        core.journal.push(record.clone());
        core.delivering = true;
        let guard = self.inner.context.registry.begin_delivery(&self.inner.key);
        Some((record, guard))
    }

    fn deliver(
        &self,
        prepared: Option<(CommitRecord, InFlightGuard)>,
        action: CommitAction,
    ) -> Result<FlushOutcome, RteFault> {
        let Some((record, guard)) = prepared else {
            tracing::debug!(session_id = %self.inner.id, %action, "nothing to flush");
            return Ok(FlushOutcome::Empty);
        };
        let report = self.inner.context.pipeline.deliver_blocking(&record, guard);

        let mut core = self.core();
        core.delivering = false;
        let sequence_no = record.sequence_no;
        if core.torn_down {
            tracing::warn!(
                session_id = %self.inner.id,
                sequence_no,
                attempts = report.attempts,
                delivered = report.result.is_ok(),
                "discarding delivery outcome for torn-down session"
            );
            return Ok(FlushOutcome::Discarded { sequence_no });
        }

        let element_count = record.snapshot.len();
        let (status, outcome) = match report.result {
            Ok(receipt) => {
                core.store.acknowledge(&record.snapshot);
                (
                    DeliveryStatus::Delivered {
                        attempts: report.attempts,
                        applied: receipt.applied,
                    },
                    Ok(FlushOutcome::Delivered {
                        sequence_no,
                        attempts: report.attempts,
                    }),
                )
            }
            Err(error) => {
                let reason = error.to_string();
                (
                    DeliveryStatus::Failed {
                        attempts: report.attempts,
                        reason: reason.clone(),
                    },
                    Err(RteFault::PersistenceFailed(reason)),
                )
            }
        };
        if let Some(entry) = core
            .journal
            .iter_mut()
            .rev()
            .find(|entry| entry.sequence_no == sequence_no)
        {
            entry.status = status.clone();
        }
        let still_dirty = core.store.dirty_len();
        drop(core);

        match &status {
            DeliveryStatus::Delivered { attempts, .. } => {
                tracing::info!(
                    session_id = %self.inner.id,
                    sequence_no,
                    %action,
                    attempts,
                    element_count,
                    "commit delivered"
                );
                emit_event(
                    self.inner.context.emitter.as_ref(),
                    EventKind::CommitDelivered,
                    &self.inner.id,
                    event_data([
                        ("sequence_no", json!(sequence_no)),
                        ("action", json!(action.as_str())),
                        ("attempts", json!(attempts)),
                        ("element_count", json!(element_count)),
                    ]),
                );
            }
            DeliveryStatus::Failed { attempts, reason } => {
                tracing::warn!(
                    session_id = %self.inner.id,
                    sequence_no,
                    %action,
                    attempts,
                    still_dirty,
                    reason = %reason,
                    "commit failed"
                );
                emit_event(
                    self.inner.context.emitter.as_ref(),
                    EventKind::CommitFailed,
                    &self.inner.id,
                    event_data([
                        ("sequence_no", json!(sequence_no)),
                        ("action", json!(action.as_str())),
                        ("reason", json!(reason)),
                    ]),
                );
            }
            DeliveryStatus::Pending => {}
        }
        outcome
    }

    /// Host-side teardown. A running session with nothing in flight is
    /// terminated first so accepted writes are flushed; afterwards the
    /// session rejects every call and late delivery outcomes are dropped.
    pub fn tear_down(&self) {
        let flush_first = {
            let core = self.core();
            if core.torn_down {
                return;
            }
            core.state == LifecycleState::Running && !core.delivering && !core.initializing
        };
        if flush_first {
            let flushed = self.terminate("");
            tracing::debug!(session_id = %self.inner.id, flushed, "cleanup flush");
        }

        let mut core = self.core();
        if core.torn_down {
            return;
        }
        let delivery_in_flight = core.delivering;
        let pending_elements = core.store.dirty_len();
        if delivery_in_flight {
            tracing::warn!(
                session_id = %self.inner.id,
                pending_elements,
                "tearing down with a delivery in flight"
            );
        }
        core.torn_down = true;
        core.transition(LifecycleState::Terminated);
        drop(core);
        self.release_claim();

        tracing::info!(session_id = %self.inner.id, key = %self.inner.key, "session torn down");
        emit_event(
            self.inner.context.emitter.as_ref(),
            EventKind::SessionTornDown,
            &self.inner.id,
            event_data([
                ("delivery_in_flight", json!(delivery_in_flight)),
                ("pending_elements", json!(pending_elements)),
            ]),
        );
    }
}

fn require_empty(call: ApiCall, parameter: &str) -> Result<(), RteFault> {
    if parameter.is_empty() {
        Ok(())
    } else {
        Err(RteFault::InvalidArgument {
            call,
            argument: parameter.to_string(),
        })
    }
}
