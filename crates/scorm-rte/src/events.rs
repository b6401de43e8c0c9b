use crate::RteError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

pub type EventData = HashMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionInitialized,
    CommitDelivered,
    CommitFailed,
    SessionTerminated,
    SessionTornDown,
    ApiPublished,
    ApiRetracted,
    PublishRefused,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RteEvent {
    pub kind: EventKind,
    pub timestamp: String,
    pub session_id: String,
    pub data: EventData,
}

impl RteEvent {
    pub fn new(kind: EventKind, session_id: impl Into<String>, data: EventData) -> Self {
        Self {
            kind,
            timestamp: current_timestamp(),
            session_id: session_id.into(),
            data,
        }
    }
}

pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: RteEvent) -> Result<(), RteError>;
}

#[derive(Default)]
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit(&self, _event: RteEvent) -> Result<(), RteError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct BufferedEventEmitter {
    inner: Arc<Mutex<Vec<RteEvent>>>,
}

impl BufferedEventEmitter {
    pub fn snapshot(&self) -> Vec<RteEvent> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.snapshot().into_iter().map(|event| event.kind).collect()
    }
}

impl EventEmitter for BufferedEventEmitter {
    fn emit(&self, event: RteEvent) -> Result<(), RteError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(event);
        Ok(())
    }
}

/// Emits an event; emitter failures are logged and never reach content.
pub(crate) fn emit_event(
    emitter: &dyn EventEmitter,
    kind: EventKind,
    session_id: &str,
    data: EventData,
) {
    if let Err(error) = emitter.emit(RteEvent::new(kind.clone(), session_id, data)) {
        tracing::warn!(session_id, ?kind, %error, "event emission failed");
    }
}

pub(crate) fn event_data<const N: usize>(entries: [(&str, Value); N]) -> EventData {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn current_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn buffered_event_emitter_stores_emitted_events() {
        let emitter = BufferedEventEmitter::default();
        emitter
            .emit(RteEvent {
                kind: EventKind::SessionInitialized,
                timestamp: "1791000000".to_string(),
                session_id: "s1".to_string(),
                data: event_data([("entry", json!("ab-initio"))]),
            })
            .expect("emit should succeed");

        let events = emitter.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::SessionInitialized);
        assert_eq!(events[0].data["entry"], json!("ab-initio"));
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let encoded =
            serde_json::to_string(&EventKind::PublishRefused).expect("kind should serialize");
        assert_eq!(encoded, "\"publish_refused\"");
    }

    struct FailingEmitter;

    impl EventEmitter for FailingEmitter {
        fn emit(&self, _event: RteEvent) -> Result<(), RteError> {
            Err(RteError::Event("sink closed".to_string()))
        }
    }

    #[test]
    fn emit_event_failing_emitter_expected_swallowed() {
        emit_event(
            &FailingEmitter,
            EventKind::CommitFailed,
            "s1",
            EventData::new(),
        );
    }
}
