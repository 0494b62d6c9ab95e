use super::*;

fn rec(name: &str, ty: &str) -> ComponentRecord {
    ComponentRecord::new(name, ty)
}

#[test]
fn references_order_components_and_main_goes_first() {
    let records = vec![
        rec("arm_l", "limb.limb")
            .inputs(["clav_l", "shoulder_l", "elbow_l", "wrist_l"])
            .rig_parent("spine_chest"),
        rec("spine", "chain.chainSpline").inputs(["hip", "chest"]),
        rec("root", "main.main"),
        rec("neck", "basic.basic").input("neck").rig_parent("spine_chest"),
    ];
    let p = plan(&records, &ComponentCatalog::builtin()).unwrap();
    assert_eq!(p.names(&records), vec!["root", "spine", "arm_l", "neck"]);
    assert!(p.dependencies["arm_l"].contains("spine"));
    assert!(p.dependencies["spine"].is_empty());
}

#[test]
fn longest_matching_component_wins() {
    let records = vec![
        rec("arm", "basic.basic").input("a"),
        rec("arm_l", "basic.basic").input("b"),
        rec("hand_l", "basic.basic").input("c").rig_parent("arm_l_tip"),
    ];
    let p = plan(&records, &ComponentCatalog::builtin()).unwrap();
    let deps: Vec<&str> = p.dependencies["hand_l"].iter().map(String::as_str).collect();
    assert_eq!(deps, vec!["arm_l"]);
}

#[test]
fn explicit_dependencies_and_errors() {
    let catalog = ComponentCatalog::builtin();
    let records = vec![
        rec("a", "basic.basic").input("x").depends_on("b"),
        rec("b", "basic.basic").input("y"),
    ];
    let p = plan(&records, &catalog).unwrap();
    assert_eq!(p.names(&records), vec!["b", "a"]);

    let unknown = vec![rec("a", "basic.basic").depends_on("ghost")];
    assert!(matches!(
        plan(&unknown, &catalog).unwrap_err(),
        RigError::Construction(_)
    ));

    let cycle = vec![
        rec("a", "basic.basic").rig_parent("b_ctl"),
        rec("b", "basic.basic").rig_parent("a_ctl"),
    ];
    let err = plan(&cycle, &catalog).unwrap_err();
    assert!(err.to_string().contains("cycle"));

    let dup = vec![rec("a", "basic.basic"), rec("a", "chain.chain")];
    assert!(matches!(
        plan(&dup, &catalog).unwrap_err(),
        RigError::DuplicateName(_)
    ));
}
