use serde::{Deserialize, Serialize};

/// Read-only learner and launch values supplied by the host at mount time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchContext {
    pub learner_id: String,
    pub learner_name: String,
    pub credit: String,
    pub mode: String,
    pub launch_data: Option<String>,
    pub mastery_score: Option<String>,
    pub max_time_allowed: Option<String>,
    pub time_limit_action: Option<String>,
    pub completion_threshold: Option<String>,
    pub scaled_passing_score: Option<String>,
    pub comments_from_lms: Option<String>,
}

impl Default for LaunchContext {
    fn default() -> Self {
        Self {
            learner_id: String::new(),
            learner_name: "Learner".to_string(),
            credit: "credit".to_string(),
            mode: "normal".to_string(),
            launch_data: None,
            mastery_score: None,
            max_time_allowed: None,
            time_limit_action: None,
            completion_threshold: None,
            scaled_passing_score: None,
            comments_from_lms: None,
        }
    }
}

impl LaunchContext {
    pub fn for_learner(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            ..Self::default()
        }
    }

    pub fn value(&self, field: LaunchField) -> Option<&str> {
        match field {
            LaunchField::LearnerId => Some(self.learner_id.as_str()),
            LaunchField::LearnerName => Some(self.learner_name.as_str()),
            LaunchField::Credit => Some(self.credit.as_str()),
            LaunchField::Mode => Some(self.mode.as_str()),
            LaunchField::LaunchData => self.launch_data.as_deref(),
            LaunchField::MasteryScore => self.mastery_score.as_deref(),
            LaunchField::MaxTimeAllowed => self.max_time_allowed.as_deref(),
            LaunchField::TimeLimitAction => self.time_limit_action.as_deref(),
            LaunchField::CompletionThreshold => self.completion_threshold.as_deref(),
            LaunchField::ScaledPassingScore => self.scaled_passing_score.as_deref(),
            LaunchField::CommentsFromLms => self.comments_from_lms.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaunchField {
    LearnerId,
    LearnerName,
    Credit,
    Mode,
    LaunchData,
    MasteryScore,
    MaxTimeAllowed,
    TimeLimitAction,
    CompletionThreshold,
    ScaledPassingScore,
    CommentsFromLms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_launch_context_expected_learner_defaults() {
        let launch = LaunchContext::for_learner("u-7");
        assert_eq!(launch.value(LaunchField::LearnerId), Some("u-7"));
        assert_eq!(launch.value(LaunchField::LearnerName), Some("Learner"));
        assert_eq!(launch.value(LaunchField::Credit), Some("credit"));
        assert_eq!(launch.value(LaunchField::Mode), Some("normal"));
        assert_eq!(launch.value(LaunchField::MasteryScore), None);
    }

    #[test]
    fn launch_context_deserializes_partial_json() {
        let launch: LaunchContext =
            serde_json::from_str(r#"{"learner_id":"u-1","mastery_score":"80"}"#)
                .expect("partial launch context should deserialize");
        assert_eq!(launch.learner_name, "Learner");
        assert_eq!(launch.mastery_score.as_deref(), Some("80"));
    }
}
