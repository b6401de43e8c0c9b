use scorm_trackstore::{SessionId, TrackingKey};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct RegistryState {
    active: HashMap<TrackingKey, SessionId>,
    in_flight: HashMap<TrackingKey, usize>,
}

/// Process-wide bookkeeping per (enrollment, content item): which session
/// holds the pair, and how many deliveries for it are still running.
#[derive(Default)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    settled: Condvar,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `key` for `session_id`. Returns the current holder when
    /// another session already has it.
    pub fn claim(&self, key: &TrackingKey, session_id: &str) -> Result<(), SessionId> {
        let mut state = self.lock();
        match state.active.get(key) {
            Some(holder) if holder != session_id => Err(holder.clone()),
            Some(_) => Ok(()),
            None => {
                state.active.insert(key.clone(), session_id.to_string());
                Ok(())
            }
        }
    }

    /// Releases `key` if `session_id` holds it.
    pub fn release(&self, key: &TrackingKey, session_id: &str) -> bool {
        let mut state = self.lock();
        if state.active.get(key).is_some_and(|holder| holder == session_id) {
            state.active.remove(key);
            return true;
        }
        false
    }

    pub fn holder(&self, key: &TrackingKey) -> Option<SessionId> {
        self.lock().active.get(key).cloned()
    }

    pub fn begin_delivery(self: &Arc<Self>, key: &TrackingKey) -> InFlightGuard {
        *self.lock().in_flight.entry(key.clone()).or_default() += 1;
        InFlightGuard {
            registry: Arc::clone(self),
            key: key.clone(),
        }
    }

    pub fn in_flight(&self, key: &TrackingKey) -> usize {
        self.lock().in_flight.get(key).copied().unwrap_or(0)
    }

    /// Waits until no delivery for `key` is running. On timeout returns the
    /// number still in flight.
    pub fn wait_settled(&self, key: &TrackingKey, timeout: Duration) -> Result<(), usize> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            let pending = state.in_flight.get(key).copied().unwrap_or(0);
            if pending == 0 {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(pending);
            }
            state = self
                .settled
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    fn finish_delivery(&self, key: &TrackingKey) {
        let mut state = self.lock();
        if let Some(count) = state.in_flight.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.in_flight.remove(key);
            }
        }
        drop(state);
        self.settled.notify_all();
    }
}

/// Counts one running delivery until dropped.
pub struct InFlightGuard {
    registry: Arc<SessionRegistry>,
    key: TrackingKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.finish_delivery(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_second_session_expected_conflict_until_release() {
        let registry = SessionRegistry::new();
        let key = TrackingKey::new("enr-1", "sco-1");

        registry.claim(&key, "s1").expect("first claim should succeed");
        registry.claim(&key, "s1").expect("reclaim should succeed");
        assert_eq!(registry.claim(&key, "s2"), Err("s1".to_string()));

        assert!(!registry.release(&key, "s2"));
        assert!(registry.release(&key, "s1"));
        registry.claim(&key, "s2").expect("claim after release should succeed");
        assert_eq!(registry.holder(&key).as_deref(), Some("s2"));
    }

    #[test]
    fn wait_settled_expected_wakes_when_guard_dropped() {
        let registry = Arc::new(SessionRegistry::new());
        let key = TrackingKey::new("enr-1", "sco-1");
        let guard = registry.begin_delivery(&key);
        assert_eq!(registry.in_flight(&key), 1);

        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            drop(guard);
        });
        registry
            .wait_settled(&key, Duration::from_secs(5))
            .expect("delivery should settle");
        releaser.join().expect("releaser should finish");
        assert_eq!(registry.in_flight(&key), 0);
    }

    #[test]
    fn wait_settled_timeout_expected_pending_count() {
        let registry = Arc::new(SessionRegistry::new());
        let key = TrackingKey::new("enr-1", "sco-1");
        let _first = registry.begin_delivery(&key);
        let _second = registry.begin_delivery(&key);

        assert_eq!(
            registry.wait_settled(&key, Duration::from_millis(10)),
            Err(2)
        );
        assert!(
            registry
                .wait_settled(&TrackingKey::new("enr-1", "other"), Duration::ZERO)
                .is_ok()
        );
    }
}
