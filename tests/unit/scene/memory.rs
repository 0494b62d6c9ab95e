use super::*;

fn r(name: &str) -> EntityRef {
    EntityRef::new(name)
}

#[test]
fn create_rejects_duplicates_and_missing_parents() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Joint, "hip", None).unwrap();
    let err = scene
        .create_entity(EntityKind::Joint, "hip", None)
        .unwrap_err();
    assert!(matches!(err, crate::RigError::DuplicateName(_)));

    let err = scene
        .create_entity(EntityKind::Joint, "knee", Some(&r("nope")))
        .unwrap_err();
    assert!(matches!(err, crate::RigError::MissingInput(_)));
}

#[test]
fn delete_removes_subtree_children_first() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Joint, "a", None).unwrap();
    scene.create_entity(EntityKind::Joint, "b", Some(&r("a"))).unwrap();
    scene.create_entity(EntityKind::Joint, "c", Some(&r("b"))).unwrap();

    scene.delete_entities(&[r("a"), r("ghost")]).unwrap();

    assert_eq!(scene.entity_count(), 0);
    let order: Vec<&str> = scene.deletion_log().iter().map(|e| e.as_str()).collect();
    assert_eq!(order, vec!["c", "b", "a"]);
}

#[test]
fn reparent_moves_children_and_rejects_cycles() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Transform, "root", None).unwrap();
    scene
        .create_entity(EntityKind::Transform, "grp", Some(&r("root")))
        .unwrap();
    scene.create_entity(EntityKind::Transform, "other", None).unwrap();

    scene.reparent(&r("grp"), Some(&r("other"))).unwrap();
    assert_eq!(scene.parent_of(&r("grp")), Some(r("other")));
    assert!(scene.list_children(&r("root")).unwrap().is_empty());

    assert!(scene.reparent(&r("other"), Some(&r("grp"))).is_err());

    scene.reparent(&r("grp"), None).unwrap();
    assert_eq!(scene.parent_of(&r("grp")), None);
}

#[test]
fn null_attribute_clears_value() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Transform, "n", None).unwrap();
    scene
        .set_attribute(&r("n"), "history", serde_json::json!(["rebuild"]))
        .unwrap();
    assert!(scene.get_attribute(&r("n"), "history").unwrap().is_some());
    scene
        .set_attribute(&r("n"), "history", serde_json::Value::Null)
        .unwrap();
    assert!(scene.get_attribute(&r("n"), "history").unwrap().is_none());
    assert!(scene.get_attribute(&r("missing"), "history").is_err());
}

#[test]
fn tags_follow_entity_lifetime() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Control, "ctl", None).unwrap();
    scene.tag(&r("ctl"), "control").unwrap();
    assert!(scene.has_tag(&r("ctl"), "control"));
    assert_eq!(scene.get_tagged("control"), vec![r("ctl")]);

    scene.delete_entities(&[r("ctl")]).unwrap();
    assert!(scene.get_tagged("control").is_empty());
    assert!(scene.tag(&r("ctl"), "control").is_err());
}

#[test]
fn lock_helpers_merge_and_remove() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Joint, "j", None).unwrap();
    lock_attributes(&mut scene, &r("j"), &TRANSFORM_ATTRS).unwrap();
    lock_attributes(&mut scene, &r("j"), &["t", "v"]).unwrap();
    assert_eq!(
        locked_attributes(&scene, &r("j")).unwrap(),
        vec!["t", "r", "s", "v"]
    );

    unlock_attributes(&mut scene, &r("j"), &TRANSFORM_ATTRS).unwrap();
    assert_eq!(locked_attributes(&scene, &r("j")).unwrap(), vec!["v"]);
}
