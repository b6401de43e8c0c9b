#![allow(dead_code)]

use scorm_rte::{
    BufferedEventEmitter, CommitPipeline, ContextId, DeliveryPolicy, LaunchContext, MountRequest,
    PlayerHandle, RetryBackoffConfig, RteConfig, RteRuntime, ScormVersion,
};
use scorm_trackstore::{PersistedState, TrackingKey, TrackingStore};
use std::sync::Arc;

pub const ENROLLMENT: &str = "enr-100";
pub const CONTENT_ITEM: &str = "sco-intro";

pub fn fast_config() -> RteConfig {
    RteConfig {
        delivery: DeliveryPolicy {
            max_attempts: 3,
            attempt_timeout_ms: 300,
            backoff: RetryBackoffConfig {
                initial_delay_ms: 1,
                max_delay_ms: 5,
                ..RetryBackoffConfig::default()
            },
        },
        hydrate_timeout_ms: 2_000,
        max_discovery_depth: 10,
    }
}

pub fn runtime_with(store: Arc<dyn TrackingStore>) -> (RteRuntime, BufferedEventEmitter) {
    let emitter = BufferedEventEmitter::default();
    let runtime = RteRuntime::with_emitter(fast_config(), store, Arc::new(emitter.clone()))
        .expect("runtime should build");
    (runtime, emitter)
}

pub fn mount(runtime: &RteRuntime, version: ScormVersion) -> PlayerHandle {
    mount_at(runtime, version, ContextId::ROOT)
}

pub fn mount_at(runtime: &RteRuntime, version: ScormVersion, scope: ContextId) -> PlayerHandle {
    runtime
        .mount(
            MountRequest::new(ENROLLMENT, CONTENT_ITEM, version, scope)
                .with_launch(LaunchContext::for_learner("learner-7")),
        )
        .expect("mount should succeed")
}

pub fn key() -> TrackingKey {
    TrackingKey::new(ENROLLMENT, CONTENT_ITEM)
}

pub fn load_state(store: &Arc<dyn TrackingStore>, key: &TrackingKey) -> Option<PersistedState> {
    CommitPipeline::new(Arc::clone(store), fast_config().delivery)
        .load_blocking(key)
        .expect("load should succeed")
}

pub fn persisted_value(store: &Arc<dyn TrackingStore>, element: &str) -> Option<String> {
    load_state(store, &key()).and_then(|state| state.elements.get(element).cloned())
}
