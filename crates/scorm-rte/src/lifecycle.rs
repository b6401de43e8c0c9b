use crate::errors::RteFault;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    NotInitialized,
    Running,
    Terminated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Running => "RUNNING",
            Self::Terminated => "TERMINATED",
        }
    }

    pub fn can_transition_to(&self, next: &LifecycleState) -> bool {
        match self {
            LifecycleState::NotInitialized => {
                matches!(next, LifecycleState::Running | LifecycleState::Terminated)
            }
            LifecycleState::Running => matches!(next, LifecycleState::Terminated),
            LifecycleState::Terminated => false,
        }
    }

    /// Gate applied before every state-dependent call.
    pub fn admit(&self, call: ApiCall) -> Result<(), RteFault> {
        match (call, self) {
            (ApiCall::Initialize, LifecycleState::NotInitialized) => Ok(()),
            (ApiCall::Initialize, LifecycleState::Running) => Err(RteFault::AlreadyInitialized),
            (ApiCall::Initialize, LifecycleState::Terminated) => Err(RteFault::InstanceTerminated),
            (_, LifecycleState::Running) => Ok(()),
            (call, LifecycleState::NotInitialized) => Err(RteFault::NotInitialized { call }),
            (call, LifecycleState::Terminated) => Err(RteFault::AfterTermination { call }),
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calls that clear the reporter and pass through the lifecycle gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiCall {
    Initialize,
    Terminate,
    GetValue,
    SetValue,
    Commit,
}

impl ApiCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "Initialize",
            Self::Terminate => "Terminate",
            Self::GetValue => "GetValue",
            Self::SetValue => "SetValue",
            Self::Commit => "Commit",
        }
    }
}

impl Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminated_state_expected_terminal() {
        assert!(!LifecycleState::Terminated.can_transition_to(&LifecycleState::Running));
        assert!(!LifecycleState::Terminated.can_transition_to(&LifecycleState::NotInitialized));
        assert!(LifecycleState::Running.can_transition_to(&LifecycleState::Terminated));
        assert!(!LifecycleState::Running.can_transition_to(&LifecycleState::NotInitialized));
    }

    #[test]
    fn admit_initialize_expected_only_from_not_initialized() {
        assert!(LifecycleState::NotInitialized.admit(ApiCall::Initialize).is_ok());
        assert_eq!(
            LifecycleState::Running.admit(ApiCall::Initialize),
            Err(RteFault::AlreadyInitialized)
        );
        assert_eq!(
            LifecycleState::Terminated.admit(ApiCall::Initialize),
            Err(RteFault::InstanceTerminated)
        );
    }

    #[test]
    fn admit_accessors_expected_running_only() {
        assert_eq!(
            LifecycleState::NotInitialized.admit(ApiCall::Commit),
            Err(RteFault::NotInitialized {
                call: ApiCall::Commit
            })
        );
        assert_eq!(
            LifecycleState::Terminated.admit(ApiCall::SetValue),
            Err(RteFault::AfterTermination {
                call: ApiCall::SetValue
            })
        );
        assert!(LifecycleState::Running.admit(ApiCall::GetValue).is_ok());
    }
}
