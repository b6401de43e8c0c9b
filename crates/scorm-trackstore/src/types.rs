use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

pub type SessionId = String;

/// Dotted CMI path → value, ordered so snapshots serialize deterministically.
pub type ElementSnapshot = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackingKey {
    pub enrollment_id: String,
    pub content_item_id: String,
}

impl TrackingKey {
    pub fn new(enrollment_id: impl Into<String>, content_item_id: impl Into<String>) -> Self {
        Self {
            enrollment_id: enrollment_id.into(),
            content_item_id: content_item_id.into(),
        }
    }

    pub fn storage_key(&self) -> String {
        format!(
            "{}|{}",
            encode_part(&self.enrollment_id),
            encode_part(&self.content_item_id)
        )
    }
}

impl Display for TrackingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.enrollment_id, self.content_item_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitAction {
    Commit,
    Terminate,
}

impl CommitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Terminate => "terminate",
        }
    }
}

impl Display for CommitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub key: TrackingKey,
    pub session_id: SessionId,
    pub sequence_no: u64,
    pub action: CommitAction,
    pub snapshot: ElementSnapshot,
}

impl UpsertRequest {
    pub fn idempotency_key(&self) -> String {
        commit_idempotency_key(&self.key, &self.session_id, self.sequence_no)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReceipt {
    pub key: TrackingKey,
    pub session_id: SessionId,
    pub sequence_no: u64,
    /// False when the record had already been applied and this call only
    /// acknowledged it again.
    pub applied: bool,
    pub snapshot_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub key: TrackingKey,
    pub elements: ElementSnapshot,
    pub last_session_id: Option<SessionId>,
    pub last_sequence_no: u64,
    pub last_action: Option<CommitAction>,
    pub commit_count: u64,
    pub terminated: bool,
}

impl PersistedState {
    pub fn empty(key: TrackingKey) -> Self {
        Self {
            key,
            elements: ElementSnapshot::new(),
            last_session_id: None,
            last_sequence_no: 0,
            last_action: None,
            commit_count: 0,
            terminated: false,
        }
    }

    pub fn can_resume(&self) -> bool {
        self.commit_count > 0 && self.last_action != Some(CommitAction::Terminate)
    }
}

fn encode_part(part: &str) -> String {
    format!("{}:{}", part.len(), part)
}

pub fn commit_idempotency_key(key: &TrackingKey, session_id: &str, sequence_no: u64) -> String {
    format!(
        "scorm-rte:v1|{}|{}|{}|{}",
        encode_part(&key.enrollment_id),
        encode_part(&key.content_item_id),
        encode_part(session_id),
        sequence_no
    )
}

pub fn snapshot_hash(snapshot: &ElementSnapshot) -> String {
    let canonical = serde_json::to_vec(snapshot).unwrap_or_default();
    blake3::hash(&canonical).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_idempotency_key_same_inputs_expected_stable_output() {
        let key = TrackingKey::new("enr-1", "sco-7");
        let first = commit_idempotency_key(&key, "session-1", 3);
        let second = commit_idempotency_key(&key, "session-1", 3);

        assert_eq!(first, second);
        assert_eq!(first, "scorm-rte:v1|5:enr-1|5:sco-7|9:session-1|3");
    }

    #[test]
    fn commit_idempotency_key_distinct_sequence_expected_distinct_keys() {
        let key = TrackingKey::new("enr-1", "sco-7");
        assert_ne!(
            commit_idempotency_key(&key, "session-1", 1),
            commit_idempotency_key(&key, "session-1", 2)
        );
    }

    #[test]
    fn storage_key_length_prefix_expected_no_ambiguity() {
        let left = TrackingKey::new("a|b", "c");
        let right = TrackingKey::new("a", "b|c");
        assert_ne!(left.storage_key(), right.storage_key());
    }

    #[test]
    fn commit_action_serializes_lowercase() {
        let encoded = serde_json::to_string(&CommitAction::Terminate).expect("should serialize");
        assert_eq!(encoded, "\"terminate\"");
    }

    #[test]
    fn can_resume_after_terminate_expected_false() {
        let mut state = PersistedState::empty(TrackingKey::new("e", "c"));
        assert!(!state.can_resume());

        state.commit_count = 1;
        state.last_action = Some(CommitAction::Commit);
        assert!(state.can_resume());

        state.last_action = Some(CommitAction::Terminate);
        assert!(!state.can_resume());
    }
}
