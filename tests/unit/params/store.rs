use serde_json::json;

use super::*;

fn store() -> ParameterStore {
    ParameterStore::new(CoercionPolicy::Widen)
}

#[test]
fn define_dump_reload_round_trip() {
    let mut a = store();
    a.define("count", 4, ParamType::Int).unwrap();
    let dumped = a.dump();

    let mut b = store();
    b.define("count", 1, ParamType::Int).unwrap();
    assert_eq!(b.load_from(&dumped).unwrap(), 1);
    assert_eq!(b.get_int("count").unwrap(), 4);
}

#[test]
fn define_is_idempotent_but_rejects_type_change() {
    let mut s = store();
    s.define("useScale", true, ParamType::Bool).unwrap();
    s.set("useScale", false).unwrap();
    s.define("useScale", true, ParamType::Bool).unwrap();
    assert!(!s.get_bool("useScale").unwrap());
    assert_eq!(s.len(), 1);

    let err = s.define("useScale", "yes", ParamType::String).unwrap_err();
    assert!(matches!(err, RigError::ParameterType(_)));
}

#[test]
fn default_must_match_declared_type() {
    let mut s = store();
    assert!(s.define("aimAxis", 1, ParamType::String).is_err());
    assert!(!s.contains("aimAxis"));
}

#[test]
fn int_widens_to_float_under_widen_policy() {
    let mut s = store();
    s.define("size", 1.0, ParamType::Float).unwrap();
    s.set("size", 3).unwrap();
    assert_eq!(s.get_float("size").unwrap(), 3.0);
    assert_eq!(s.parameter("size").unwrap().value, json!(3.0));
}

#[test]
fn strict_policy_rejects_widening() {
    let mut s = ParameterStore::new(CoercionPolicy::Strict);
    s.define("size", 1.0, ParamType::Float).unwrap();
    let err = s.set("size", 3).unwrap_err();
    assert!(matches!(err, RigError::ParameterType(_)));
    assert_eq!(s.get_float("size").unwrap(), 1.0);
}

#[test]
fn float_never_narrows_to_int() {
    let mut s = store();
    s.define("count", 2, ParamType::Int).unwrap();
    assert!(s.set("count", 2.5).is_err());
    assert!(s.set("count", "2").is_err());
}

#[test]
fn unknown_parameter_is_reported() {
    let mut s = store();
    assert!(matches!(
        s.set("ghost", 1).unwrap_err(),
        RigError::UnknownParameter(_)
    ));
    assert!(matches!(
        s.get("ghost").unwrap_err(),
        RigError::UnknownParameter(_)
    ));
}

#[test]
fn load_from_skips_protected_and_undeclared_keys() {
    let mut s = store();
    s.define("name", "arm_l", ParamType::String).unwrap();
    s.define("input", json!(["a"]), ParamType::Sequence).unwrap();
    s.define("useScale", false, ParamType::Bool).unwrap();

    let data = json!({
        "name": "hacked",
        "input": ["x", "y"],
        "type": "limb.limb",
        "useScale": true,
        "notDeclared": 12,
    });
    let n = s.load_from(data.as_object().unwrap()).unwrap();

    assert_eq!(n, 1);
    assert_eq!(s.get_str("name").unwrap(), "arm_l");
    assert_eq!(s.get_sequence("input").unwrap().len(), 1);
    assert!(s.get_bool("useScale").unwrap());
}

#[test]
fn load_from_fails_on_type_mismatch() {
    let mut s = store();
    s.define("closed", false, ParamType::Bool).unwrap();
    let data = json!({ "closed": "nope" });
    assert!(s.load_from(data.as_object().unwrap()).is_err());
}

#[test]
fn load_only_touches_named_keys() {
    let mut s = store();
    s.define("numberMainControls", 4, ParamType::Int).unwrap();
    s.define("closed", false, ParamType::Bool).unwrap();
    let data = json!({ "numberMainControls": 3, "closed": true });

    s.load_only(data.as_object().unwrap(), &["numberMainControls"])
        .unwrap();
    assert_eq!(s.get_int("numberMainControls").unwrap(), 3);
    assert!(!s.get_bool("closed").unwrap());
}

#[test]
fn clear_dynamic_keeps_static_parameters_and_order() {
    let mut s = store();
    s.define("a", 1, ParamType::Int).unwrap();
    s.define_dynamic("d0", "x", ParamType::String).unwrap();
    s.define("b", 2, ParamType::Int).unwrap();
    s.define_dynamic("d1", "y", ParamType::String).unwrap();
    assert_eq!(s.dynamic_names(), vec!["d0", "d1"]);

    s.clear_dynamic();
    assert_eq!(s.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(s.get_int("b").unwrap(), 2);
    assert!(!s.contains("d1"));
}

#[test]
fn mapping_and_sequence_accessors() {
    let mut s = store();
    s.define("ikSpaces", json!({ "world": "trs_world" }), ParamType::Mapping)
        .unwrap();
    let spaces: std::collections::BTreeMap<String, String> = s.get_as("ikSpaces").unwrap();
    assert_eq!(spaces["world"], "trs_world");
    assert_eq!(s.get_mapping("ikSpaces").unwrap().len(), 1);
    assert!(s.get_sequence("ikSpaces").is_err());
}

#[test]
fn type_inference_from_values() {
    assert_eq!(ParamType::of(&json!(1)), Some(ParamType::Int));
    assert_eq!(ParamType::of(&json!(1.5)), Some(ParamType::Float));
    assert_eq!(ParamType::of(&json!([])), Some(ParamType::Sequence));
    assert_eq!(ParamType::of(&json!(null)), None);
}
