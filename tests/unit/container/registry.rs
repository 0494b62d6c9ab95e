use super::*;
use crate::scene::{MemoryScene, SceneGraph, TagIndex};

fn r(name: &str) -> EntityRef {
    EntityRef::new(name)
}

fn scene_with(names: &[&str]) -> MemoryScene {
    let mut scene = MemoryScene::new();
    for n in names {
        scene.create_entity(EntityKind::Transform, n, None).unwrap();
    }
    scene
}

#[test]
fn create_rejects_names_used_by_entities_or_containers() {
    let mut scene = scene_with(&["taken"]);
    let mut reg = ContainerRegistry::new();

    let err = reg.create(&mut scene, "taken").unwrap_err();
    assert!(matches!(err, RigError::DuplicateName(_)));

    reg.create(&mut scene, "arm_l_container").unwrap();
    let err = reg.create(&mut scene, "arm_l_container").unwrap_err();
    assert!(matches!(err, RigError::DuplicateName(_)));
    assert!(scene.has_tag(&r("arm_l_container"), COMPONENT_TAG));
}

#[test]
fn claims_are_unique_per_session() {
    let mut reg = ContainerRegistry::new();
    reg.claim("arm_l").unwrap();
    assert!(matches!(
        reg.claim("arm_l").unwrap_err(),
        RigError::DuplicateName(_)
    ));
    reg.release("arm_l");
    reg.claim("arm_l").unwrap();
}

#[test]
fn add_entities_captures_shapes_and_moves_ownership() {
    let mut scene = scene_with(&["ctl"]);
    scene
        .create_entity(EntityKind::Shape, "ctlShape", Some(&r("ctl")))
        .unwrap();
    let mut reg = ContainerRegistry::new();
    reg.create(&mut scene, "a_container").unwrap();
    reg.create(&mut scene, "b_container").unwrap();

    let added = reg.add_entities(&mut scene, "a_container", &[r("ctl")]).unwrap();
    assert_eq!(added, vec![r("ctl"), r("ctlShape")]);
    assert_eq!(reg.container_of(&r("ctlShape")), Some("a_container"));

    reg.add_entities(&mut scene, "b_container", &[r("ctl")]).unwrap();
    assert!(reg.members("a_container").unwrap().is_empty());
    assert_eq!(reg.container_of(&r("ctl")), Some("b_container"));

    reg.remove_entities(&mut scene, "b_container", &[r("ctl")])
        .unwrap();
    assert!(reg.members("b_container").unwrap().is_empty());
    assert_eq!(reg.container_of(&r("ctlShape")), None);
}

#[test]
fn add_missing_entity_is_missing_input() {
    let mut scene = MemoryScene::new();
    let mut reg = ContainerRegistry::new();
    reg.create(&mut scene, "c").unwrap();
    let err = reg.add_entities(&mut scene, "c", &[r("ghost")]).unwrap_err();
    assert!(matches!(err, RigError::MissingInput(_)));
}

#[test]
fn anchors_and_published_attrs_are_mirrored_into_scene() {
    let mut scene = scene_with(&["root", "tip"]);
    scene
        .set_attribute(&r("tip"), "ikfk", serde_json::json!(0.0))
        .unwrap();
    let mut reg = ContainerRegistry::new();
    reg.create(&mut scene, "c").unwrap();

    reg.set_parent_anchor(&mut scene, "c", &r("root")).unwrap();
    reg.set_child_anchor(&mut scene, "c", &r("tip")).unwrap();
    let plug = reg
        .publish_attr(&mut scene, "c", &r("tip"), "ikfk", Some("arm_ikfk"))
        .unwrap();
    assert_eq!(plug, "c.arm_ikfk");
    assert!(
        reg.publish_attr(&mut scene, "c", &r("tip"), "nope", None)
            .is_err()
    );

    let stored = scene.get_attribute(&r("c"), CONTAINER_ATTR).unwrap().unwrap();
    let mirrored: Container = serde_json::from_value(stored).unwrap();
    assert_eq!(mirrored.parent_anchor, Some(r("root")));
    assert_eq!(mirrored.child_anchor, Some(r("tip")));
    assert_eq!(mirrored.published_attrs["arm_ikfk"], "tip.ikfk");
    assert!(mirrored.contains(&r("root")));
}

#[test]
fn delete_removes_nested_containers_first() {
    let mut scene = scene_with(&["p_root", "c1_root", "c2_root"]);
    let mut reg = ContainerRegistry::new();
    for (c, m) in [("p", "p_root"), ("c1", "c1_root"), ("c2", "c2_root")] {
        reg.create(&mut scene, c).unwrap();
        reg.add_entities(&mut scene, c, &[r(m)]).unwrap();
    }
    reg.nest(&mut scene, "p", "c1").unwrap();
    reg.nest(&mut scene, "p", "c2").unwrap();

    let deleted = reg.delete(&mut scene, "p").unwrap();
    assert_eq!(deleted, vec!["c2", "c1", "p"]);
    assert_eq!(scene.entity_count(), 0);

    let log: Vec<&str> = scene.deletion_log().iter().map(|e| e.as_str()).collect();
    let pos = |n: &str| log.iter().position(|x| *x == n).unwrap();
    assert!(pos("c1") < pos("p"));
    assert!(pos("c2") < pos("p"));
    assert!(!reg.is_registered("c1"));
}

#[test]
fn absorb_rehomes_members_and_discards_root() {
    let mut scene = MemoryScene::new();
    scene.create_entity(EntityKind::Transform, "thumb_cmpt", None).unwrap();
    scene
        .create_entity(EntityKind::Control, "thumb_ctl", Some(&r("thumb_cmpt")))
        .unwrap();
    scene.create_entity(EntityKind::Transform, "hand_control", None).unwrap();
    let mut reg = ContainerRegistry::new();
    reg.create(&mut scene, "hand_container").unwrap();
    reg.create(&mut scene, "thumb_container").unwrap();
    reg.add_entities(&mut scene, "thumb_container", &[r("thumb_cmpt"), r("thumb_ctl")])
        .unwrap();

    scene.reparent(&r("thumb_ctl"), Some(&r("hand_control"))).unwrap();
    let moved = reg
        .absorb(&mut scene, "thumb_container", "hand_container", Some(&r("thumb_cmpt")))
        .unwrap();

    assert_eq!(moved, vec![r("thumb_ctl")]);
    assert!(!scene.exists("thumb_cmpt"));
    assert!(reg.members("thumb_container").unwrap().is_empty());
    assert_eq!(reg.container_of(&r("thumb_ctl")), Some("hand_container"));
}

#[test]
fn adopt_and_discover_existing_containers() {
    let mut scene = scene_with(&["ctl"]);
    {
        let mut first = ContainerRegistry::new();
        first.create(&mut scene, "arm_l_container").unwrap();
        first
            .add_entities(&mut scene, "arm_l_container", &[r("ctl")])
            .unwrap();
        let mut meta = ContainerMetadata::new("limb.limb", "1.0");
        meta.stage = crate::foundation::core::BuildStage::Built;
        first
            .write_metadata(&mut scene, "arm_l_container", &meta)
            .unwrap();
    }

    assert_eq!(ContainerRegistry::discover(&scene), vec!["arm_l_container"]);

    let mut second = ContainerRegistry::new();
    let adopted = second.adopt(&mut scene, "arm_l_container").unwrap();
    assert!(adopted.contains(&r("ctl")));
    assert_eq!(second.container_of(&r("ctl")), Some("arm_l_container"));

    let meta = ContainerRegistry::read_metadata(&scene, "arm_l_container")
        .unwrap()
        .unwrap();
    assert_eq!(meta.type_tag, "limb.limb");
    assert_eq!(meta.stage, crate::foundation::core::BuildStage::Built);

    assert!(matches!(
        second.adopt(&mut scene, "ctl").unwrap_err(),
        RigError::Scene(_)
    ));
}
