mod support;

use scorm_rte::{ApiObject, ScormVersion};
use scorm_trackstore::{MemoryTrackingStore, TrackingStore};
use std::sync::Arc;
use support::{mount, persisted_value, runtime_with};

fn scorm2004(api: &ApiObject) -> &scorm_rte::Scorm2004Api {
    match api {
        ApiObject::Scorm2004(api) => api,
        ApiObject::Scorm12(_) => panic!("expected the 2004 API"),
    }
}

#[test]
fn end_to_end_completion_expected_persisted_after_terminate() {
    let store: Arc<dyn TrackingStore> = Arc::new(MemoryTrackingStore::new());
    let (runtime, _) = runtime_with(Arc::clone(&store));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());

    assert_eq!(api.initialize(""), "true");
    assert_eq!(api.set_value("cmi.completion_status", "completed"), "true");
    assert_eq!(api.set_value("cmi.score.scaled", "0.85"), "true");
    assert_eq!(api.commit(""), "true");
    assert_eq!(api.terminate(""), "true");

    assert_eq!(
        persisted_value(&store, "cmi.completion_status").as_deref(),
        Some("completed")
    );
    assert_eq!(persisted_value(&store, "cmi.score.scaled").as_deref(), Some("0.85"));
}

#[test]
fn lifecycle_codes_expected_per_call() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());

    assert_eq!(api.terminate(""), "false");
    assert_eq!(api.get_last_error(), "112");
    assert_eq!(api.get_value("cmi.location"), "");
    assert_eq!(api.get_last_error(), "122");
    assert_eq!(api.set_value("cmi.location", "p1"), "false");
    assert_eq!(api.get_last_error(), "132");
    assert_eq!(api.commit(""), "false");
    assert_eq!(api.get_last_error(), "142");

    assert_eq!(api.initialize(""), "true");
    assert_eq!(api.initialize(""), "false");
    assert_eq!(api.get_last_error(), "103");
    assert_eq!(api.terminate(""), "true");

    assert_eq!(api.get_value("cmi.location"), "");
    assert_eq!(api.get_last_error(), "123");
    assert_eq!(api.set_value("cmi.location", "p1"), "false");
    assert_eq!(api.get_last_error(), "133");
    assert_eq!(api.commit(""), "false");
    assert_eq!(api.get_last_error(), "143");
    assert_eq!(api.terminate(""), "false");
    assert_eq!(api.get_last_error(), "113");
    assert_eq!(api.initialize(""), "false");
    assert_eq!(api.get_last_error(), "104");
}

#[test]
fn non_empty_parameter_expected_201() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());

    assert_eq!(api.initialize(""), "true");
    assert_eq!(api.commit("now"), "false");
    assert_eq!(api.get_last_error(), "201");
    assert_eq!(api.get_error_string("201"), "General Argument Error");
}

#[test]
fn unset_value_expected_403_and_defaults_readable() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());
    assert_eq!(api.initialize(""), "true");

    assert_eq!(api.get_value("cmi.location"), "");
    assert_eq!(api.get_last_error(), "403");
    assert_eq!(api.get_value("cmi.completion_status"), "unknown");
    assert_eq!(api.get_last_error(), "0");
    assert_eq!(api.get_value("cmi.learner_id"), "learner-7");
    assert_eq!(api.get_value("cmi.entry"), "ab-initio");
    assert_eq!(api.get_value("cmi._version"), "1.0");
    assert_eq!(api.get_value(""), "");
    assert_eq!(api.get_last_error(), "301");
}

#[test]
fn type_and_range_violations_expected_406_and_407() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());
    assert_eq!(api.initialize(""), "true");

    assert_eq!(api.set_value("cmi.score.scaled", "0.5"), "true");
    assert_eq!(api.set_value("cmi.score.scaled", "1.5"), "false");
    assert_eq!(api.get_last_error(), "407");
    assert_eq!(api.set_value("cmi.score.scaled", "high"), "false");
    assert_eq!(api.get_last_error(), "406");
    assert_eq!(api.get_value("cmi.score.scaled"), "0.5");
    assert_eq!(api.set_value("cmi.completion_status", "done"), "false");
    assert_eq!(api.get_last_error(), "406");

    assert_eq!(
        api.set_value("cmi.objectives.99999999999999999999999.id", "obj-x"),
        "false"
    );
    assert_eq!(api.get_last_error(), "407");
    assert_eq!(api.set_value("cmi.score.raw", "12345678901234567890"), "true");
    assert_eq!(api.get_value("cmi.score.raw"), "12345678901234567890");
}

#[test]
fn interactions_expected_id_first_and_type_before_response() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());
    assert_eq!(api.initialize(""), "true");

    assert_eq!(api.set_value("cmi.interactions.0.type", "choice"), "false");
    assert_eq!(api.get_last_error(), "408");
    assert_eq!(api.set_value("cmi.interactions.0.id", "q-1"), "true");
    assert_eq!(api.set_value("cmi.interactions.0.learner_response", "a"), "false");
    assert_eq!(api.get_last_error(), "408");
    assert_eq!(api.set_value("cmi.interactions.0.type", "choice"), "true");
    assert_eq!(api.set_value("cmi.interactions.0.learner_response", "a"), "true");
    assert_eq!(
        api.set_value("cmi.interactions.0.correct_responses.0.pattern", "a"),
        "true"
    );
    assert_eq!(api.get_value("cmi.interactions._count"), "1");
    assert_eq!(api.get_value("cmi.interactions.0.correct_responses._count"), "1");

    assert_eq!(api.set_value("cmi.interactions.3.id", "q-4"), "false");
    assert_eq!(api.get_last_error(), "407");
    assert_eq!(api.get_value("cmi.interactions.5.id"), "");
    assert_eq!(api.get_last_error(), "301");
}

#[test]
fn keyword_write_expected_404_and_unknown_keyword_target_401() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());
    assert_eq!(api.initialize(""), "true");

    assert_eq!(api.set_value("cmi.objectives._count", "1"), "false");
    assert_eq!(api.get_last_error(), "404");
    assert_eq!(api.get_value("cmi.nothing._children"), "");
    assert_eq!(api.get_last_error(), "401");
    assert_eq!(
        api.get_value("cmi.score._children"),
        "scaled,raw,min,max"
    );
}

#[test]
fn nav_request_expected_session_scoped_default() {
    let store: Arc<dyn TrackingStore> = Arc::new(MemoryTrackingStore::new());
    let (runtime, _) = runtime_with(Arc::clone(&store));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());
    assert_eq!(api.initialize(""), "true");

    assert_eq!(api.get_value("adl.nav.request"), "_none_");
    assert_eq!(api.set_value("adl.nav.request", "continue"), "true");
    assert_eq!(api.get_value("adl.nav.request"), "continue");
    assert_eq!(api.set_value("adl.nav.request", "sideways"), "false");
    assert_eq!(api.get_last_error(), "406");
}

#[test]
fn diagnostic_expected_detail_for_last_code_and_phrase_otherwise() {
    let (runtime, _) = runtime_with(Arc::new(MemoryTrackingStore::new()));
    let player = mount(&runtime, ScormVersion::Scorm2004);
    let api = scorm2004(player.api());
    assert_eq!(api.initialize(""), "true");

    assert_eq!(api.set_value("cmi.learner_id", "someone"), "false");
    assert_eq!(api.get_last_error(), "404");
    assert!(api.get_diagnostic("404").contains("cmi.learner_id"));
    assert_eq!(api.get_diagnostic("406"), "Data Model Element Type Mismatch");
    assert_eq!(api.get_diagnostic("123456"), "");
    assert_eq!(api.get_last_error(), "404");
}
