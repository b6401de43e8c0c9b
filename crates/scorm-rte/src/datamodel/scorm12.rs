//! SCORM 1.2 `cmi` data model.

use crate::datamodel::launch::LaunchField;
use crate::datamodel::table::{ElementSpec, ElementTable};
use crate::datamodel::types::DataType;
use crate::version::ScormVersion;

const STRING_255: DataType = DataType::CmiString { max_len: 255 };
const STRING_4096: DataType = DataType::CmiString { max_len: 4096 };
const SCORE: DataType = DataType::Decimal {
    min: Some(0.0),
    max: Some(100.0),
    allow_blank: true,
};
const WEIGHTING: DataType = DataType::Decimal {
    min: None,
    max: None,
    allow_blank: false,
};

/// Values content may write; "not attempted" is reserved for the LMS.
const LESSON_STATUS: &[&str] = &["passed", "completed", "failed", "incomplete", "browsed"];
const OBJECTIVE_STATUS: &[&str] = &[
    "passed",
    "completed",
    "failed",
    "incomplete",
    "browsed",
    "not attempted",
];
const EXIT: &[&str] = &["time-out", "suspend", "logout", ""];
const INTERACTION_TYPE: &[&str] = &[
    "true-false",
    "choice",
    "fill-in",
    "matching",
    "performance",
    "sequencing",
    "likert",
    "numeric",
];
const INTERACTION_RESULT: &[&str] = &["correct", "wrong", "unanticipated", "neutral"];

pub(crate) fn build_table() -> ElementTable {
    ElementTable::new(ScormVersion::Scorm12, false)
        .with_container(
            "cmi.core",
            "student_id,student_name,lesson_location,credit,lesson_status,entry,score,total_time,lesson_mode,exit,session_time",
        )
        .with_container("cmi.core.score", "raw,min,max")
        .with_container(
            "cmi.student_data",
            "mastery_score,max_time_allowed,time_limit_action",
        )
        .with_container("cmi.student_preference", "audio,language,speed,text")
        .with_container("cmi.objectives.n.score", "raw,min,max")
        .with_collection("cmi.objectives", "id,score,status", None)
        .with_collection(
            "cmi.interactions",
            "id,objectives,time,type,correct_responses,weighting,student_response,result,latency",
            None,
        )
        .with_collection("cmi.interactions.n.objectives", "id", None)
        .with_collection("cmi.interactions.n.correct_responses", "pattern", None)
        .with_elements([
            ElementSpec::read_only("cmi.core.student_id", DataType::Identifier)
                .from_launch(LaunchField::LearnerId),
            ElementSpec::read_only("cmi.core.student_name", STRING_255)
                .from_launch(LaunchField::LearnerName),
            ElementSpec::read_write("cmi.core.lesson_location", STRING_255),
            ElementSpec::read_only("cmi.core.credit", STRING_255).from_launch(LaunchField::Credit),
            ElementSpec::read_write("cmi.core.lesson_status", DataType::Vocabulary(LESSON_STATUS))
                .with_default("not attempted"),
            ElementSpec::read_only("cmi.core.entry", STRING_255).entry(),
            ElementSpec::read_write("cmi.core.score.raw", SCORE),
            ElementSpec::read_write("cmi.core.score.min", SCORE),
            ElementSpec::read_write("cmi.core.score.max", SCORE),
            ElementSpec::read_only("cmi.core.total_time", DataType::Timespan)
                .with_default("0000:00:00.00"),
            ElementSpec::read_only("cmi.core.lesson_mode", STRING_255)
                .from_launch(LaunchField::Mode),
            ElementSpec::write_only("cmi.core.exit", DataType::Vocabulary(EXIT)).session_scoped(),
            ElementSpec::write_only("cmi.core.session_time", DataType::Timespan).session_scoped(),
            ElementSpec::read_write("cmi.suspend_data", STRING_4096),
            ElementSpec::read_only("cmi.launch_data", STRING_4096)
                .from_launch(LaunchField::LaunchData),
            ElementSpec::read_write("cmi.comments", STRING_4096),
            ElementSpec::read_only("cmi.comments_from_lms", STRING_4096)
                .from_launch(LaunchField::CommentsFromLms),
            ElementSpec::read_write("cmi.objectives.n.id", DataType::Identifier),
            ElementSpec::read_write("cmi.objectives.n.score.raw", SCORE),
            ElementSpec::read_write("cmi.objectives.n.score.min", SCORE),
            ElementSpec::read_write("cmi.objectives.n.score.max", SCORE),
            ElementSpec::read_write(
                "cmi.objectives.n.status",
                DataType::Vocabulary(OBJECTIVE_STATUS),
            ),
            ElementSpec::read_only("cmi.student_data.mastery_score", SCORE)
                .from_launch(LaunchField::MasteryScore),
            ElementSpec::read_only("cmi.student_data.max_time_allowed", DataType::Timespan)
                .from_launch(LaunchField::MaxTimeAllowed),
            ElementSpec::read_only("cmi.student_data.time_limit_action", STRING_255)
                .from_launch(LaunchField::TimeLimitAction),
            ElementSpec::read_write(
                "cmi.student_preference.audio",
                DataType::Integer { min: -1, max: 100 },
            )
            .with_default("0"),
            ElementSpec::read_write("cmi.student_preference.language", STRING_255),
            ElementSpec::read_write(
                "cmi.student_preference.speed",
                DataType::Integer {
                    min: -100,
                    max: 100,
                },
            )
            .with_default("0"),
            ElementSpec::read_write(
                "cmi.student_preference.text",
                DataType::Integer { min: -1, max: 1 },
            )
            .with_default("0"),
            ElementSpec::write_only("cmi.interactions.n.id", DataType::Identifier),
            ElementSpec::write_only("cmi.interactions.n.objectives.n.id", DataType::Identifier),
            ElementSpec::write_only("cmi.interactions.n.time", DataType::TimeOfDay),
            ElementSpec::write_only(
                "cmi.interactions.n.type",
                DataType::Vocabulary(INTERACTION_TYPE),
            ),
            ElementSpec::write_only("cmi.interactions.n.correct_responses.n.pattern", STRING_255),
            ElementSpec::write_only("cmi.interactions.n.weighting", WEIGHTING),
            ElementSpec::write_only("cmi.interactions.n.student_response", STRING_255),
            ElementSpec::write_only(
                "cmi.interactions.n.result",
                DataType::VocabularyOrDecimal(INTERACTION_RESULT),
            ),
            ElementSpec::write_only("cmi.interactions.n.latency", DataType::Timespan),
        ])
}
