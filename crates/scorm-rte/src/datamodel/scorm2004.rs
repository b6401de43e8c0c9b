//! SCORM 2004 `cmi` and `adl.nav` data model.

use crate::datamodel::launch::LaunchField;
use crate::datamodel::table::{ElementSpec, ElementTable};
use crate::datamodel::types::DataType;
use crate::version::ScormVersion;

const REAL: DataType = DataType::Decimal {
    min: None,
    max: None,
    allow_blank: false,
};
const SCALED: DataType = DataType::Decimal {
    min: Some(-1.0),
    max: Some(1.0),
    allow_blank: false,
};
const UNIT: DataType = DataType::Decimal {
    min: Some(0.0),
    max: Some(1.0),
    allow_blank: false,
};
const NON_NEGATIVE: DataType = DataType::Decimal {
    min: Some(0.0),
    max: None,
    allow_blank: false,
};

const COMPLETION_STATUS: &[&str] = &["completed", "incomplete", "not attempted", "unknown"];
const SUCCESS_STATUS: &[&str] = &["passed", "failed", "unknown"];
const EXIT: &[&str] = &["timeout", "suspend", "logout", "normal", ""];
const AUDIO_CAPTIONING: &[&str] = &["-1", "0", "1"];
const INTERACTION_TYPE: &[&str] = &[
    "true-false",
    "choice",
    "fill-in",
    "long-fill-in",
    "matching",
    "performance",
    "sequencing",
    "likert",
    "numeric",
    "other",
];
const INTERACTION_RESULT: &[&str] = &["correct", "incorrect", "unanticipated", "neutral"];

pub(crate) fn build_table() -> ElementTable {
    ElementTable::new(ScormVersion::Scorm2004, true)
        .with_container("cmi.score", "scaled,raw,min,max")
        .with_container(
            "cmi.learner_preference",
            "audio_level,language,delivery_speed,audio_captioning",
        )
        .with_container("cmi.objectives.n.score", "scaled,raw,min,max")
        .with_collection(
            "cmi.comments_from_learner",
            "comment,location,timestamp",
            None,
        )
        .with_collection("cmi.comments_from_lms", "comment,location,timestamp", None)
        .with_collection(
            "cmi.interactions",
            "id,type,objectives,timestamp,correct_responses,weighting,learner_response,result,latency,description",
            Some("id"),
        )
        .with_collection("cmi.interactions.n.objectives", "id", Some("id"))
        .with_collection("cmi.interactions.n.correct_responses", "pattern", None)
        .with_collection(
            "cmi.objectives",
            "id,score,success_status,completion_status,progress_measure,description",
            Some("id"),
        )
        .with_elements([
            ElementSpec::read_only("cmi._version", DataType::CharacterString).with_default("1.0"),
            ElementSpec::read_write(
                "cmi.comments_from_learner.n.comment",
                DataType::LocalizedString,
            ),
            ElementSpec::read_write(
                "cmi.comments_from_learner.n.location",
                DataType::CharacterString,
            ),
            ElementSpec::read_write("cmi.comments_from_learner.n.timestamp", DataType::Timestamp),
            ElementSpec::read_only("cmi.comments_from_lms.n.comment", DataType::LocalizedString),
            ElementSpec::read_only("cmi.comments_from_lms.n.location", DataType::CharacterString),
            ElementSpec::read_only("cmi.comments_from_lms.n.timestamp", DataType::Timestamp),
            ElementSpec::read_write(
                "cmi.completion_status",
                DataType::Vocabulary(COMPLETION_STATUS),
            )
            .with_default("unknown"),
            ElementSpec::read_only("cmi.completion_threshold", UNIT)
                .from_launch(LaunchField::CompletionThreshold),
            ElementSpec::read_only("cmi.credit", DataType::CharacterString)
                .from_launch(LaunchField::Credit),
            ElementSpec::read_only("cmi.entry", DataType::CharacterString).entry(),
            ElementSpec::write_only("cmi.exit", DataType::Vocabulary(EXIT)).session_scoped(),
            ElementSpec::read_write("cmi.interactions.n.id", DataType::LongIdentifier),
            ElementSpec::read_write(
                "cmi.interactions.n.type",
                DataType::Vocabulary(INTERACTION_TYPE),
            ),
            ElementSpec::read_write(
                "cmi.interactions.n.objectives.n.id",
                DataType::LongIdentifier,
            ),
            ElementSpec::read_write("cmi.interactions.n.timestamp", DataType::Timestamp),
            ElementSpec::read_write(
                "cmi.interactions.n.correct_responses.n.pattern",
                DataType::CharacterString,
            )
            .requires("cmi.interactions.n.type"),
            ElementSpec::read_write("cmi.interactions.n.weighting", REAL),
            ElementSpec::read_write(
                "cmi.interactions.n.learner_response",
                DataType::CharacterString,
            )
            .requires("cmi.interactions.n.type"),
            ElementSpec::read_write(
                "cmi.interactions.n.result",
                DataType::VocabularyOrDecimal(INTERACTION_RESULT),
            ),
            ElementSpec::read_write("cmi.interactions.n.latency", DataType::Duration),
            ElementSpec::read_write("cmi.interactions.n.description", DataType::LocalizedString),
            ElementSpec::read_only("cmi.launch_data", DataType::CharacterString)
                .from_launch(LaunchField::LaunchData),
            ElementSpec::read_only("cmi.learner_id", DataType::LongIdentifier)
                .from_launch(LaunchField::LearnerId),
            ElementSpec::read_only("cmi.learner_name", DataType::LocalizedString)
                .from_launch(LaunchField::LearnerName),
            ElementSpec::read_write("cmi.learner_preference.audio_level", NON_NEGATIVE)
                .with_default("1"),
            ElementSpec::read_write("cmi.learner_preference.language", DataType::LanguageTag)
                .with_default(""),
            ElementSpec::read_write("cmi.learner_preference.delivery_speed", NON_NEGATIVE)
                .with_default("1"),
            ElementSpec::read_write(
                "cmi.learner_preference.audio_captioning",
                DataType::Vocabulary(AUDIO_CAPTIONING),
            )
            .with_default("0"),
            ElementSpec::read_write("cmi.location", DataType::CharacterString),
            ElementSpec::read_only("cmi.max_time_allowed", DataType::Duration)
                .from_launch(LaunchField::MaxTimeAllowed),
            ElementSpec::read_only("cmi.mode", DataType::CharacterString)
                .from_launch(LaunchField::Mode),
            ElementSpec::read_write("cmi.objectives.n.id", DataType::LongIdentifier),
            ElementSpec::read_write("cmi.objectives.n.score.scaled", SCALED),
            ElementSpec::read_write("cmi.objectives.n.score.raw", REAL),
            ElementSpec::read_write("cmi.objectives.n.score.min", REAL),
            ElementSpec::read_write("cmi.objectives.n.score.max", REAL),
            ElementSpec::read_write(
                "cmi.objectives.n.success_status",
                DataType::Vocabulary(SUCCESS_STATUS),
            )
            .with_default("unknown"),
            ElementSpec::read_write(
                "cmi.objectives.n.completion_status",
                DataType::Vocabulary(COMPLETION_STATUS),
            )
            .with_default("unknown"),
            ElementSpec::read_write("cmi.objectives.n.progress_measure", UNIT),
            ElementSpec::read_write("cmi.objectives.n.description", DataType::LocalizedString),
            ElementSpec::read_write("cmi.progress_measure", UNIT),
            ElementSpec::read_only("cmi.scaled_passing_score", SCALED)
                .from_launch(LaunchField::ScaledPassingScore),
            ElementSpec::read_write("cmi.score.scaled", SCALED),
            ElementSpec::read_write("cmi.score.raw", REAL),
            ElementSpec::read_write("cmi.score.min", REAL),
            ElementSpec::read_write("cmi.score.max", REAL),
            ElementSpec::write_only("cmi.session_time", DataType::Duration).session_scoped(),
            ElementSpec::read_write("cmi.success_status", DataType::Vocabulary(SUCCESS_STATUS))
                .with_default("unknown"),
            ElementSpec::read_write("cmi.suspend_data", DataType::CharacterString),
            ElementSpec::read_only("cmi.time_limit_action", DataType::CharacterString)
                .from_launch(LaunchField::TimeLimitAction),
            ElementSpec::read_only("cmi.total_time", DataType::Duration).with_default("PT0H0M0S"),
            ElementSpec::read_write("adl.nav.request", DataType::NavRequest)
                .with_default("_none_")
                .session_scoped(),
        ])
}
