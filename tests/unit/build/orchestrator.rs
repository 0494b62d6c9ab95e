use super::*;
use crate::foundation::core::EntityKind;
use crate::persist::store::MemoryStore;
use crate::scene::{DRIVEN_BY_ATTR, MemoryScene, SceneGraph};

fn r(name: &str) -> EntityRef {
    EntityRef::new(name)
}

fn joint(scene: &mut MemoryScene, name: &str) {
    scene.create_entity(EntityKind::Joint, name, None).unwrap();
}

fn basic(name: &str, input: &str) -> ComponentRecord {
    ComponentRecord::new(name, "basic.basic").input(input)
}

#[test]
fn run_builds_every_component_in_plan_order() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "neck");
    joint(&mut scene, "head");
    let mut cx = BuildContext::new(&mut scene);
    let records = vec![
        basic("head", "head").rig_parent("neck_ctl"),
        basic("neck", "neck"),
        ComponentRecord::new("root", "main.main"),
    ];
    let mut orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        records,
        &mut cx,
    )
    .unwrap();
    assert_eq!(orch.order(), vec!["root", "neck", "head"]);

    let summary = orch.run(&mut cx);
    assert!(summary.is_success(), "{summary}");
    assert_eq!(summary.reports.len(), 4);
    for c in orch.components() {
        assert_eq!(c.stage(), BuildStage::Finalized);
    }
    assert_eq!(cx.scene().parent_of(&r("neck_cmpt")), Some(r("rig")));
    assert_eq!(cx.scene().parent_of(&r("head_cmpt")), Some(r("rig")));
    assert_eq!(
        cx.get_attr(&r("head_rigParent_cns"), "driver").unwrap(),
        Some(Value::from("neck_ctl"))
    );
}

#[test]
fn failure_blocks_dependents_but_not_siblings() {
    let mut scene = MemoryScene::new();
    for j in ["neck", "head", "tail"] {
        joint(&mut scene, j);
    }
    let mut cx = BuildContext::new(&mut scene);
    let records = vec![
        basic("neck", "neck").rig_parent("ghost_anchor"),
        basic("head", "head").rig_parent("neck_ctl"),
        basic("tail", "tail"),
    ];
    let mut orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        records,
        &mut cx,
    )
    .unwrap();

    let summary = orch.run(&mut cx);
    assert!(!summary.is_success());

    let connect = summary.report(BuildStage::Connected).unwrap();
    assert!(matches!(connect.status("neck"), Some(StageStatus::Failed(_))));
    match connect.status("head") {
        Some(StageStatus::Blocked(why)) => assert!(why.contains("neck"), "{why}"),
        other => panic!("head should be blocked, got {other:?}"),
    }
    assert_eq!(connect.status("tail"), Some(&StageStatus::Ran));

    let finalize = summary.report(BuildStage::Finalized).unwrap();
    assert!(matches!(finalize.status("neck"), Some(StageStatus::Blocked(_))));
    assert_eq!(finalize.status("tail"), Some(&StageStatus::Ran));

    assert_eq!(orch.component("neck").unwrap().stage(), BuildStage::Built);
    assert_eq!(orch.component("tail").unwrap().stage(), BuildStage::Finalized);
    let failed: Vec<&str> = orch.failed().collect();
    assert_eq!(failed, vec!["head", "neck"]);
}

#[test]
fn build_single_retries_a_failed_component() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "neck");
    let mut cx = BuildContext::new(&mut scene);
    let mut orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        vec![basic("neck", "neck").rig_parent("chest_anchor")],
        &mut cx,
    )
    .unwrap();
    assert!(!orch.run(&mut cx).is_success());

    cx.scene_mut()
        .create_entity(EntityKind::Transform, "chest_anchor", None)
        .unwrap();
    let outcomes = orch.build_single("neck", &mut cx).unwrap();
    assert_eq!(outcomes.len(), 5);
    assert_eq!(outcomes[0], (BuildStage::Initialized, StageOutcome::Skipped));
    assert_eq!(outcomes[2], (BuildStage::Connected, StageOutcome::Ran));
    assert_eq!(orch.failed().count(), 0);

    assert!(matches!(
        orch.build_single("ghost", &mut cx).unwrap_err(),
        RigError::Construction(_)
    ));
}

#[test]
fn build_single_refuses_when_a_dependency_failed() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "neck");
    joint(&mut scene, "head");
    let mut cx = BuildContext::new(&mut scene);
    let records = vec![
        basic("neck", "neck").rig_parent("ghost_anchor"),
        basic("head", "head").rig_parent("neck_ctl"),
    ];
    let mut orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        records,
        &mut cx,
    )
    .unwrap();
    orch.run(&mut cx);

    let err = orch.build_single("head", &mut cx).unwrap_err();
    assert!(matches!(err, RigError::DependencyFailed(_)));
    assert_eq!(orch.component("head").unwrap().stage(), BuildStage::Built);
}

#[test]
fn teardown_runs_in_reverse_with_main_last() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "neck");
    joint(&mut scene, "tail");
    {
        let mut cx = BuildContext::new(&mut scene);
        let records = vec![
            ComponentRecord::new("root", "main.main"),
            basic("neck", "neck"),
            basic("tail", "tail"),
        ];
        let mut orch = BuildOrchestrator::from_records(
            ComponentCatalog::builtin(),
            BuildOptions::default(),
            records,
            &mut cx,
        )
        .unwrap();
        assert!(orch.run(&mut cx).is_success());

        let reports = orch.teardown_all(&mut cx);
        let order: Vec<&str> = reports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["tail", "neck", "root"]);
        for (name, report) in &reports {
            assert!(report.is_clean(), "{name}: {:?}", report.warnings);
        }
    }

    let names: Vec<&str> = scene.names().collect();
    assert_eq!(names, vec!["neck", "tail"]);
    assert_eq!(scene.get_attribute(&r("neck"), DRIVEN_BY_ATTR).unwrap(), None);
}

#[test]
fn components_round_trip_through_a_store() {
    let mut scene = MemoryScene::new();
    let mut cx = BuildContext::new(&mut scene);
    let records = vec![
        ComponentRecord::new("root", "main.main"),
        basic("neck", "neck")
            .size(1.5)
            .param("controlShape", "square"),
    ];
    let orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        records,
        &mut cx,
    )
    .unwrap();

    let mut store = MemoryStore::new();
    let path = Path::new("rigs/biped.json");
    assert_eq!(orch.save_components(&mut store, path).unwrap(), 2);

    let loaded = BuildOrchestrator::load_components(&store, path).unwrap();
    let neck = loaded.iter().find(|rec| rec.name == "neck").unwrap();
    assert_eq!(neck.type_tag, "basic.basic");
    assert_eq!(neck.inputs, vec![r("neck")]);
    assert_eq!(neck.size, 1.5);
    assert_eq!(neck.parameters["controlShape"], Value::from("square"));

    assert!(matches!(
        BuildOrchestrator::load_components(&store, Path::new("nope.json")).unwrap_err(),
        RigError::Persist(_)
    ));
}

#[test]
fn load_fills_missing_names_from_keys() {
    let mut store = MemoryStore::new();
    let mut data = Map::new();
    data.insert(
        "jaw".to_owned(),
        serde_json::json!({"type": "basic.basic", "input": "jaw"}),
    );
    store.write(Path::new("c.json"), &data).unwrap();

    let loaded = BuildOrchestrator::load_components(&store, Path::new("c.json")).unwrap();
    assert_eq!(loaded[0].name, "jaw");
    assert_eq!(loaded[0].inputs, vec![r("jaw")]);
}

#[test]
fn from_scene_resumes_top_level_components_only() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "toe_a");
    joint(&mut scene, "neck");
    {
        let mut cx = BuildContext::new(&mut scene);
        let records = vec![
            basic("neck", "neck"),
            ComponentRecord::new("toes", "basic.basicArray").input("toe_a"),
        ];
        let mut orch = BuildOrchestrator::from_records(
            ComponentCatalog::builtin(),
            BuildOptions::default(),
            records,
            &mut cx,
        )
        .unwrap();
        orch.initialize_all(&mut cx);
        orch.build_all(&mut cx);
        orch.connect_all(&mut cx);
    }

    let mut cx = BuildContext::new(&mut scene);
    let mut orch =
        BuildOrchestrator::from_scene(ComponentCatalog::builtin(), BuildOptions::default(), &mut cx)
            .unwrap();
    let mut names = orch.order();
    names.sort_unstable();
    assert_eq!(names, vec!["neck", "toes"]);
    assert_eq!(orch.component("toes").unwrap().stage(), BuildStage::Connected);
    assert_eq!(orch.component("toes").unwrap().children().len(), 1);

    let count = cx.scene().entity_count();
    let report = orch.build_all(&mut cx);
    assert_eq!(report.status("neck"), Some(&StageStatus::Skipped));
    assert_eq!(cx.scene().entity_count(), count);

    let report = orch.finalize_all(&mut cx);
    assert!(report.is_clean(), "{report}");
}

#[test]
fn optimize_runs_only_when_enabled() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "neck");
    let mut cx = BuildContext::new(&mut scene);
    let options = BuildOptions {
        optimize: true,
        ..BuildOptions::default()
    };
    let mut orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        options,
        vec![basic("neck", "neck")],
        &mut cx,
    )
    .unwrap();
    let summary = orch.run(&mut cx);
    assert_eq!(summary.reports.len(), 5);
    assert_eq!(
        orch.component("neck").unwrap().stage(),
        BuildStage::Optimized
    );
}

#[test]
fn failed_construction_releases_names_for_a_retry() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "j1");
    joint(&mut scene, "j2");
    let mut cx = BuildContext::new(&mut scene);

    let err = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        vec![
            basic("a", "j1"),
            ComponentRecord::new("b", "limb.limb").input("j2"),
        ],
        &mut cx,
    )
    .unwrap_err();
    assert!(matches!(err, RigError::Construction(_)), "{err}");
    assert!(!cx.containers().is_claimed("a"));

    let orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        vec![basic("a", "j1"), basic("b", "j2")],
        &mut cx,
    )
    .unwrap();
    assert_eq!(orch.order(), vec!["a", "b"]);
}

#[test]
fn failed_construction_releases_restored_children() {
    let mut scene = MemoryScene::new();
    joint(&mut scene, "toe_a");
    joint(&mut scene, "j2");
    {
        let mut cx = BuildContext::new(&mut scene);
        let mut orch = BuildOrchestrator::from_records(
            ComponentCatalog::builtin(),
            BuildOptions::default(),
            vec![ComponentRecord::new("toes", "basic.basicArray").input("toe_a")],
            &mut cx,
        )
        .unwrap();
        orch.initialize_all(&mut cx);
        orch.build_all(&mut cx);
    }

    let mut cx = BuildContext::new(&mut scene);
    let records = vec![
        ComponentRecord::new("toes", "basic.basicArray").input("toe_a"),
        ComponentRecord::new("b", "limb.limb").input("j2"),
    ];
    assert!(
        BuildOrchestrator::from_records(
            ComponentCatalog::builtin(),
            BuildOptions::default(),
            records,
            &mut cx,
        )
        .is_err()
    );
    assert!(!cx.containers().is_claimed("toes"));
    assert!(!cx.containers().is_claimed("toes_0"));

    let orch = BuildOrchestrator::from_records(
        ComponentCatalog::builtin(),
        BuildOptions::default(),
        vec![ComponentRecord::new("toes", "basic.basicArray").input("toe_a")],
        &mut cx,
    )
    .unwrap();
    assert_eq!(orch.component("toes").unwrap().stage(), BuildStage::Built);
    assert_eq!(orch.component("toes").unwrap().children().len(), 1);
}
