use crate::api::ApiObject;
use crate::bridge::MessageBridge;
use crate::errors::RteError;
use crate::exposure::{ContextId, ExposureManager, PublishToken};
use crate::session::RteSession;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HostPhase {
    Mounted,
    Initialized(PublishToken),
    CleanedUp,
}

/// A mounted player. The host calls `initialize()` once to publish the API
/// object and `cleanup()` once when the player goes away; dropping the
/// handle cleans up as well.
pub struct PlayerHandle {
    session: RteSession,
    api: ApiObject,
    scope: ContextId,
    exposure: Arc<ExposureManager>,
    phase: Mutex<HostPhase>,
}

impl PlayerHandle {
    pub(crate) fn new(session: RteSession, scope: ContextId, exposure: Arc<ExposureManager>) -> Self {
        let api = ApiObject::for_session(session.clone());
        Self {
            session,
            api,
            scope,
            exposure,
            phase: Mutex::new(HostPhase::Mounted),
        }
    }

    pub fn session(&self) -> &RteSession {
        &self.session
    }

    pub fn api(&self) -> &ApiObject {
        &self.api
    }

    pub fn scope(&self) -> ContextId {
        self.scope
    }

    pub fn bridge(&self) -> MessageBridge {
        MessageBridge::new(self.api.clone())
    }

    pub fn is_published(&self) -> bool {
        matches!(
            *self.phase.lock().unwrap_or_else(PoisonError::into_inner),
            HostPhase::Initialized(_)
        )
    }

    /// Publishes the API object on the mount scope.
    pub fn initialize(&self) -> Result<(), RteError> {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            HostPhase::Mounted => {}
            HostPhase::Initialized(_) => {
                return Err(RteError::HostPhase("player already initialized".to_string()));
            }
            HostPhase::CleanedUp => {
                return Err(RteError::HostPhase("player already cleaned up".to_string()));
            }
        }
        let token = self.exposure.publish(self.api.clone(), self.scope)?;
        *phase = HostPhase::Initialized(token);
        Ok(())
    }

    /// Retracts the API object and tears the session down. Safe to call
    /// more than once.
    pub fn cleanup(&self) {
        let previous = {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *phase, HostPhase::CleanedUp)
        };
        match previous {
            HostPhase::CleanedUp => return,
            HostPhase::Initialized(token) => {
                self.exposure.unpublish(token);
            }
            HostPhase::Mounted => {}
        }
        self.session.tear_down();
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.cleanup();
    }
}
