use crate::exposure::ContextId;
use crate::lifecycle::ApiCall;
use scorm_trackstore::TrackingStoreError;
use thiserror::Error;

/// Broad category of a content-facing fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultClass {
    ProtocolViolation,
    UnknownElement,
    AccessViolation,
    TypeOrRangeViolation,
    GeneralException,
    PersistenceFailure,
}

/// A failed API call as seen by content. Each fault maps to exactly one
/// error code per protocol variant; see [`crate::reporter::fault_code`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RteFault {
    #[error("{call} called before initialization")]
    NotInitialized { call: ApiCall },
    #[error("{call} called after termination")]
    AfterTermination { call: ApiCall },
    #[error("session is already initialized")]
    AlreadyInitialized,
    #[error("content instance was already terminated")]
    InstanceTerminated,
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    #[error("{call} expects an empty string argument, got {argument:?}")]
    InvalidArgument { call: ApiCall, argument: String },
    #[error("{call} requires a data model element name")]
    EmptyElementName { call: ApiCall },
    #[error("undefined data model element {0}")]
    UndefinedElement(String),
    #[error("data model element {0} is read only")]
    ReadOnly(String),
    #[error("data model element {0} is write only")]
    WriteOnly(String),
    #[error("{0} is a keyword and cannot be set")]
    KeywordWrite(String),
    #[error("data model element {0} does not have children")]
    ChildrenUnsupported(String),
    #[error("data model element {0} is not a collection")]
    CountUnsupported(String),
    #[error("no collection entry at {0}")]
    IndexOutOfRange(String),
    #[error("value {value:?} for {path} is not a valid {expected}")]
    TypeMismatch {
        path: String,
        value: String,
        expected: &'static str,
    },
    #[error("value for {path} is out of range: {detail}")]
    ValueOutOfRange { path: String, detail: String },
    #[error("data model element {0} has not been initialized")]
    ValueNotInitialized(String),
    #[error("{path} requires {required} to be set first")]
    DependencyNotEstablished { path: String, required: String },
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
    #[error("general exception: {0}")]
    General(String),
}

impl RteFault {
    pub fn class(&self) -> FaultClass {
        match self {
            Self::NotInitialized { .. }
            | Self::AfterTermination { .. }
            | Self::AlreadyInitialized
            | Self::InstanceTerminated
            | Self::InitializationFailed(_)
            | Self::InvalidArgument { .. }
            | Self::EmptyElementName { .. } => FaultClass::ProtocolViolation,
            Self::UndefinedElement(_)
            | Self::ChildrenUnsupported(_)
            | Self::CountUnsupported(_)
            | Self::IndexOutOfRange(_)
            | Self::ValueNotInitialized(_) => FaultClass::UnknownElement,
            Self::ReadOnly(_) | Self::WriteOnly(_) | Self::KeywordWrite(_) => {
                FaultClass::AccessViolation
            }
            Self::TypeMismatch { .. }
            | Self::ValueOutOfRange { .. }
            | Self::DependencyNotEstablished { .. } => FaultClass::TypeOrRangeViolation,
            Self::PersistenceFailed(_) => FaultClass::PersistenceFailure,
            Self::General(_) => FaultClass::GeneralException,
        }
    }
}

/// Failure delivering a commit record or loading persisted state.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error(transparent)]
    Store(#[from] TrackingStoreError),
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        last: Box<DeliveryError>,
    },
    #[error("{pending} delivery(ies) still in flight after {waited_ms}ms")]
    InFlight { pending: usize, waited_ms: u64 },
    #[error("delivery runtime failure: {0}")]
    Runtime(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExposureError {
    #[error("browsing context {0} does not exist")]
    UnknownContext(ContextId),
    #[error("scope {scope} overlaps an API published by session {held_by} at {held_scope}")]
    ScopeConflict {
        scope: ContextId,
        held_scope: ContextId,
        held_by: String,
    },
    #[error("session {session_id} is already published at {scope}")]
    AlreadyPublished { session_id: String, scope: ContextId },
}

/// Rejected bridge or dynamic API call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApiCallError {
    #[error("unknown API method {0}")]
    UnknownMethod(String),
    #[error("{method} expects {expected} argument(s), got {got}")]
    Arity {
        method: String,
        expected: usize,
        got: usize,
    },
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Top-level host-facing error type for the scorm-rte crate.
#[derive(Debug, Error)]
pub enum RteError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("host contract violated: {0}")]
    HostPhase(String),
    #[error("event emission failed: {0}")]
    Event(String),
    #[error(transparent)]
    Exposure(#[from] ExposureError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Store(#[from] TrackingStoreError),
    #[error(transparent)]
    ApiCall(#[from] ApiCallError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_class_groups_protocol_violations() {
        assert_eq!(
            RteFault::NotInitialized {
                call: ApiCall::GetValue
            }
            .class(),
            FaultClass::ProtocolViolation
        );
        assert_eq!(
            RteFault::UndefinedElement("cmi.bogus".to_string()).class(),
            FaultClass::UnknownElement
        );
        assert_eq!(
            RteFault::PersistenceFailed("down".to_string()).class(),
            FaultClass::PersistenceFailure
        );
    }

    #[test]
    fn exhausted_delivery_error_mentions_last_cause() {
        let error = DeliveryError::Exhausted {
            attempts: 3,
            last: Box::new(DeliveryError::Timeout { timeout_ms: 3_000 }),
        };
        assert_eq!(
            error.to_string(),
            "gave up after 3 attempt(s): attempt timed out after 3000ms"
        );
    }
}
