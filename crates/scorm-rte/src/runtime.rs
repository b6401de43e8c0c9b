use crate::config::RteConfig;
use crate::datamodel::LaunchContext;
use crate::errors::{ExposureError, RteError};
use crate::events::{EventEmitter, NoopEventEmitter};
use crate::exposure::{ContextId, ExposureManager};
use crate::host::PlayerHandle;
use crate::pipeline::CommitPipeline;
use crate::registry::SessionRegistry;
use crate::session::{RteSession, SessionContext};
use crate::version::ScormVersion;
use scorm_trackstore::{TrackingKey, TrackingStore};
use std::sync::Arc;
use std::time::Duration;

/// What the host supplies when mounting a player.
#[derive(Clone, Debug)]
pub struct MountRequest {
    pub key: TrackingKey,
    pub version: ScormVersion,
    /// Browsing context the API object is published on.
    pub scope: ContextId,
    pub launch: LaunchContext,
}

impl MountRequest {
    pub fn new(
        enrollment_id: impl Into<String>,
        content_item_id: impl Into<String>,
        version: ScormVersion,
        scope: ContextId,
    ) -> Self {
        Self {
            key: TrackingKey::new(enrollment_id, content_item_id),
            version,
            scope,
            launch: LaunchContext::default(),
        }
    }

    pub fn with_launch(mut self, launch: LaunchContext) -> Self {
        self.launch = launch;
        self
    }
}

/// Shared pieces every mounted player uses: one tracking store, one
/// registry of active pairs and one exposure manager.
pub struct RteRuntime {
    config: RteConfig,
    store: Arc<dyn TrackingStore>,
    registry: Arc<SessionRegistry>,
    exposure: Arc<ExposureManager>,
    emitter: Arc<dyn EventEmitter>,
}

impl RteRuntime {
    pub fn new(config: RteConfig, store: Arc<dyn TrackingStore>) -> Result<Self, RteError> {
        Self::with_emitter(config, store, Arc::new(NoopEventEmitter))
    }

    pub fn with_emitter(
        config: RteConfig,
        store: Arc<dyn TrackingStore>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<Self, RteError> {
        config.validate()?;
        let exposure = Arc::new(ExposureManager::new(
            Arc::clone(&emitter),
            config.max_discovery_depth,
        ));
        Ok(Self {
            config,
            store,
            registry: Arc::new(SessionRegistry::new()),
            exposure,
            emitter,
        })
    }

    pub fn config(&self) -> &RteConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TrackingStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn exposure(&self) -> &Arc<ExposureManager> {
        &self.exposure
    }

    /// Creates the session and API object for one player. Nothing is
    /// published until the handle's `initialize()`.
    pub fn mount(&self, request: MountRequest) -> Result<PlayerHandle, RteError> {
        if request.key.enrollment_id.trim().is_empty() {
            return Err(RteError::InvalidConfiguration(
                "enrollment id must not be empty".to_string(),
            ));
        }
        if request.key.content_item_id.trim().is_empty() {
            return Err(RteError::InvalidConfiguration(
                "content item id must not be empty".to_string(),
            ));
        }
        if !self.exposure.contains(request.scope) {
            return Err(ExposureError::UnknownContext(request.scope).into());
        }

        let session = RteSession::new(
            request.key,
            request.version,
            request.launch,
            SessionContext {
                pipeline: CommitPipeline::new(Arc::clone(&self.store), self.config.delivery.clone()),
                registry: Arc::clone(&self.registry),
                emitter: Arc::clone(&self.emitter),
                hydrate_timeout: Duration::from_millis(self.config.hydrate_timeout_ms),
            },
        );
        tracing::debug!(
            session_id = session.id(),
            key = %session.key(),
            version = %session.version(),
            scope = %request.scope,
            "player mounted"
        );
        Ok(PlayerHandle::new(
            session,
            request.scope,
            Arc::clone(&self.exposure),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorm_trackstore::MemoryTrackingStore;

    fn runtime() -> RteRuntime {
        RteRuntime::new(RteConfig::default(), Arc::new(MemoryTrackingStore::new()))
            .expect("runtime should build")
    }

    #[test]
    fn mount_empty_enrollment_expected_configuration_error() {
        let error = runtime()
            .mount(MountRequest::new(" ", "sco-1", ScormVersion::Scorm12, ContextId::ROOT))
            .err()
            .expect("empty enrollment should be refused");
        assert!(matches!(error, RteError::InvalidConfiguration(_)));
    }

    #[test]
    fn mount_unknown_scope_expected_exposure_error() {
        let runtime = runtime();
        let frame = runtime
            .exposure()
            .add_context(ContextId::ROOT)
            .expect("frame should be added");
        assert!(
            runtime
                .mount(MountRequest::new("enr-1", "sco-1", ScormVersion::Scorm12, frame))
                .is_ok()
        );

        let other = RteRuntime::new(RteConfig::default(), Arc::new(MemoryTrackingStore::new()))
            .expect("runtime should build");
        let error = other
            .mount(MountRequest::new("enr-1", "sco-1", ScormVersion::Scorm12, frame))
            .err()
            .expect("scope from another tree should be refused");
        assert!(matches!(
            error,
            RteError::Exposure(ExposureError::UnknownContext(_))
        ));
    }

    #[test]
    fn with_emitter_invalid_config_expected_error() {
        let mut config = RteConfig::default();
        config.delivery.max_attempts = 0;
        assert!(RteRuntime::new(config, Arc::new(MemoryTrackingStore::new())).is_err());
    }
}
