mod support;

use scorm_rte::{ApiObject, LifecycleState, ScormVersion};
use scorm_trackstore::{MemoryTrackingStore, TrackingStore};
use std::sync::Arc;
use support::{mount, persisted_value, runtime_with};

fn scorm12(api: &ApiObject) -> &scorm_rte::Scorm12Api {
    match api {
        ApiObject::Scorm12(api) => api,
        ApiObject::Scorm2004(_) => panic!("expected the 1.2 API"),
    }
}

#[test]
fn end_to_end_completed_status_expected_four_trues_and_persisted() {
    let store: Arc<dyn TrackingStore> = Arc::new(MemoryTrackingStore::new());
    let (runtime, _) = runtime_with(Arc::clone(&store));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());

    assert_eq!(api.lms_initialize(""), "true");
    assert_eq!(api.lms_set_value("cmi.core.lesson_status", "completed"), "true");
    assert_eq!(api.lms_commit(""), "true");
    assert_eq!(api.lms_finish(""), "true");

    assert_eq!(
        persisted_value(&store, "cmi.core.lesson_status").as_deref(),
        Some("completed")
    );
}

#[test]
fn calls_before_initialize_expected_301_without_mutation() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());

    assert_eq!(api.lms_get_value("cmi.core.lesson_location"), "");
    assert_eq!(api.lms_get_last_error(), "301");
    assert_eq!(api.lms_set_value("cmi.core.lesson_location", "p1"), "false");
    assert_eq!(api.lms_get_last_error(), "301");
    assert_eq!(api.lms_commit(""), "false");
    assert_eq!(api.lms_get_last_error(), "301");
    assert_eq!(api.lms_finish(""), "false");

    assert_eq!(api.lms_initialize(""), "true");
    assert_eq!(api.lms_get_value("cmi.core.lesson_location"), "");
    assert_eq!(api.lms_get_last_error(), "0");
    assert_eq!(player.session().dirty_len(), 0);
}

#[test]
fn calls_after_finish_expected_101() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());

    assert_eq!(api.lms_initialize(""), "true");
    assert_eq!(api.lms_finish(""), "true");
    assert_eq!(api.lms_set_value("cmi.core.lesson_location", "p9"), "false");
    assert_eq!(api.lms_get_last_error(), "101");
    assert_eq!(api.lms_initialize(""), "false");
    assert_eq!(player.session().state(), LifecycleState::Terminated);
}

#[test]
fn second_initialize_expected_failure_and_store_unchanged() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());

    assert_eq!(api.lms_initialize(""), "true");
    assert_eq!(api.lms_set_value("cmi.suspend_data", "bookmark=4"), "true");
    assert_eq!(api.lms_initialize(""), "false");
    assert_eq!(api.lms_get_last_error(), "101");
    assert_eq!(api.lms_get_value("cmi.suspend_data"), "bookmark=4");
    assert!(player.session().is_dirty("cmi.suspend_data"));
}

#[test]
fn unknown_element_expected_empty_read_false_write_and_201() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());
    assert_eq!(api.lms_initialize(""), "true");

    assert_eq!(api.lms_get_value("cmi.core.favourite_colour"), "");
    assert_eq!(api.lms_get_last_error(), "201");
    assert_eq!(api.lms_set_value("cmi.core.favourite_colour", "red"), "false");
    assert_eq!(api.lms_get_last_error(), "201");
    assert_eq!(api.lms_get_error_string("201"), "Invalid argument error");
}

#[test]
fn keywords_expected_children_count_and_refused_writes() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());
    assert_eq!(api.lms_initialize(""), "true");

    assert_eq!(api.lms_get_value("cmi.core.score._children"), "raw,min,max");
    assert_eq!(api.lms_get_value("cmi.objectives._count"), "0");
    assert_eq!(api.lms_set_value("cmi.objectives._count", "3"), "false");
    assert_eq!(api.lms_get_last_error(), "402");
    assert_eq!(api.lms_get_value("cmi.core.lesson_location._children"), "");
    assert_eq!(api.lms_get_last_error(), "202");
    assert_eq!(api.lms_get_value("cmi.core._count"), "");
    assert_eq!(api.lms_get_last_error(), "203");
}

#[test]
fn access_rules_expected_read_only_and_write_only_codes() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());
    assert_eq!(api.lms_initialize(""), "true");

    assert_eq!(api.lms_get_value("cmi.core.student_id"), "learner-7");
    assert_eq!(api.lms_set_value("cmi.core.student_id", "x"), "false");
    assert_eq!(api.lms_get_last_error(), "403");
    assert_eq!(api.lms_set_value("cmi.core.exit", "suspend"), "true");
    assert_eq!(api.lms_get_value("cmi.core.exit"), "");
    assert_eq!(api.lms_get_last_error(), "404");
    assert_eq!(api.lms_get_value("cmi.core.entry"), "ab-initio");
}

#[test]
fn out_of_range_score_expected_405_and_previous_value() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());
    assert_eq!(api.lms_initialize(""), "true");

    assert_eq!(api.lms_set_value("cmi.core.score.raw", "88"), "true");
    assert_eq!(api.lms_set_value("cmi.core.score.raw", "101"), "false");
    assert_eq!(api.lms_get_last_error(), "405");
    assert_eq!(api.lms_get_value("cmi.core.score.raw"), "88");
    assert_eq!(api.lms_set_value("cmi.core.lesson_status", "not attempted"), "false");
    assert_eq!(api.lms_get_value("cmi.core.lesson_status"), "not attempted");

    assert_eq!(
        api.lms_set_value("cmi.objectives.99999999999999999999999.id", "obj-x"),
        "false"
    );
    assert_eq!(api.lms_get_last_error(), "405");
}

#[test]
fn inspection_calls_expected_error_state_preserved() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm12);
    let api = scorm12(player.api());
    assert_eq!(api.lms_initialize(""), "true");

    assert_eq!(api.lms_set_value("cmi.core.credit", "no-credit"), "false");
    assert_eq!(api.lms_get_last_error(), "403");
    assert_eq!(api.lms_get_error_string("403"), "Element is read only");
    assert!(api.lms_get_diagnostic("").contains("cmi.core.credit"));
    assert_eq!(api.lms_get_error_string("999"), "");
    assert_eq!(api.lms_get_last_error(), "403");
}
