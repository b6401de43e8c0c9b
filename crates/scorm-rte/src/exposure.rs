use crate::api::ApiObject;
use crate::errors::ExposureError;
use crate::events::{EventEmitter, EventKind, emit_event, event_data};
use crate::version::ScormVersion;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A browsing context (window or frame) in the host's context tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(u32);

impl ContextId {
    /// The top-level window every tree starts with.
    pub const ROOT: ContextId = ContextId(0);

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Parent links for every known browsing context.
#[derive(Clone, Debug)]
pub struct BrowsingContextTree {
    parents: Vec<Option<ContextId>>,
}

impl Default for BrowsingContextTree {
    fn default() -> Self {
        Self {
            parents: vec![None],
        }
    }
}

impl BrowsingContextTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ContextId) -> bool {
        (id.0 as usize) < self.parents.len()
    }

    pub fn add_child(&mut self, parent: ContextId) -> Result<ContextId, ExposureError> {
        if !self.contains(parent) {
            return Err(ExposureError::UnknownContext(parent));
        }
        let id = ContextId(self.parents.len() as u32);
        self.parents.push(Some(parent));
        Ok(id)
    }

    pub fn parent(&self, id: ContextId) -> Option<ContextId> {
        self.parents.get(id.0 as usize).copied().flatten()
    }

    pub fn is_ancestor_or_self(&self, ancestor: ContextId, of: ContextId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Two scopes overlap when one contains the other.
    pub fn overlaps(&self, left: ContextId, right: ContextId) -> bool {
        self.is_ancestor_or_self(left, right) || self.is_ancestor_or_self(right, left)
    }
}

/// Handle returned by a successful publish; retracts exactly that
/// publication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublishToken(u64);

struct Publication {
    token: PublishToken,
    session_id: String,
    api: ApiObject,
}

#[derive(Default)]
struct ExposureState {
    tree: BrowsingContextTree,
    published: HashMap<ContextId, Publication>,
    next_token: u64,
}

/// Makes API objects reachable by name from content frames and enforces a
/// single owner per containment scope.
pub struct ExposureManager {
    state: Mutex<ExposureState>,
    emitter: Arc<dyn EventEmitter>,
    max_discovery_depth: usize,
}

impl ExposureManager {
    pub fn new(emitter: Arc<dyn EventEmitter>, max_discovery_depth: usize) -> Self {
        Self {
            state: Mutex::new(ExposureState::default()),
            emitter,
            max_discovery_depth,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExposureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_context(&self, parent: ContextId) -> Result<ContextId, ExposureError> {
        self.lock().tree.add_child(parent)
    }

    pub fn contains(&self, id: ContextId) -> bool {
        self.lock().tree.contains(id)
    }

    pub fn publish(&self, api: ApiObject, scope: ContextId) -> Result<PublishToken, ExposureError> {
        let session_id = api.session().id().to_string();
        let mut state = self.lock();
        if !state.tree.contains(scope) {
            return Err(ExposureError::UnknownContext(scope));
        }

        let mut conflict = None;
        for (held_scope, publication) in &state.published {
            if publication.session_id == session_id {
                if *held_scope == scope {
                    return Ok(publication.token);
                }
                return Err(ExposureError::AlreadyPublished { session_id, scope: *held_scope });
            }
            if conflict.is_none() && state.tree.overlaps(scope, *held_scope) {
                conflict = Some(ExposureError::ScopeConflict {
                    scope,
                    held_scope: *held_scope,
                    held_by: publication.session_id.clone(),
                });
            }
        }
        if let Some(error) = conflict {
            drop(state);
            tracing::warn!(session_id, %scope, %error, "publish refused");
            emit_event(
                self.emitter.as_ref(),
                EventKind::PublishRefused,
                &session_id,
                event_data([
                    ("scope", json!(scope.to_string())),
                    ("reason", json!(error.to_string())),
                ]),
            );
            return Err(error);
        }

        state.next_token += 1;
        let token = PublishToken(state.next_token);
        let api_name = api.version().api_name();
        state.published.insert(
            scope,
            Publication {
                token,
                session_id: session_id.clone(),
                api,
            },
        );
        drop(state);

        tracing::info!(session_id, %scope, api_name, "API published");
        emit_event(
            self.emitter.as_ref(),
            EventKind::ApiPublished,
            &session_id,
            event_data([
                ("scope", json!(scope.to_string())),
                ("api_name", json!(api_name)),
            ]),
        );
        Ok(token)
    }

    /// Retracts a publication. Returns false when `token` is no longer
    /// published.
    pub fn unpublish(&self, token: PublishToken) -> bool {
        let mut state = self.lock();
        let Some(scope) = state
            .published
            .iter()
            .find(|(_, publication)| publication.token == token)
            .map(|(scope, _)| *scope)
        else {
            return false;
        };
        let Some(publication) = state.published.remove(&scope) else {
            return false;
        };
        drop(state);

        tracing::info!(session_id = %publication.session_id, %scope, "API retracted");
        emit_event(
            self.emitter.as_ref(),
            EventKind::ApiRetracted,
            &publication.session_id,
            event_data([("scope", json!(scope.to_string()))]),
        );
        true
    }

    /// Looks up `version`'s well-known name starting at `from` and walking
    /// at most `max_discovery_depth` parents.
    pub fn find(&self, from: ContextId, version: ScormVersion) -> Option<ApiObject> {
        let state = self.lock();
        let mut current = Some(from);
        for _ in 0..=self.max_discovery_depth {
            let id = current?;
            if let Some(publication) = state.published.get(&id) {
                if publication.api.version() == version {
                    return Some(publication.api.clone());
                }
            }
            current = state.tree.parent(id);
        }
        None
    }

    /// Discovery as content performs it: `API_1484_11` first, then `API`.
    pub fn discover(&self, from: ContextId) -> Option<ApiObject> {
        self.find(from, ScormVersion::Scorm2004)
            .or_else(|| self.find(from, ScormVersion::Scorm12))
    }

    pub fn published_count(&self) -> usize {
        self.lock().published.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browsing_context_tree_overlap_expected_ancestor_or_self() {
        let mut tree = BrowsingContextTree::new();
        let player = tree.add_child(ContextId::ROOT).expect("player frame");
        let content = tree.add_child(player).expect("content frame");
        let sibling = tree.add_child(ContextId::ROOT).expect("sibling frame");

        assert!(tree.overlaps(player, content));
        assert!(tree.overlaps(content, ContextId::ROOT));
        assert!(tree.overlaps(sibling, sibling));
        assert!(!tree.overlaps(sibling, content));
        assert_eq!(tree.parent(content), Some(player));
        assert_eq!(tree.parent(ContextId::ROOT), None);
    }

    #[test]
    fn add_child_unknown_parent_expected_error() {
        let mut tree = BrowsingContextTree::new();
        assert_eq!(
            tree.add_child(ContextId(7)),
            Err(ExposureError::UnknownContext(ContextId(7)))
        );
    }
}
