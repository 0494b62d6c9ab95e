use super::*;

fn sample() -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("arm_l".to_owned(), serde_json::json!({"type": "limb.limb"}));
    m
}

#[test]
fn json_store_round_trips_through_disk() {
    let dir = std::env::temp_dir().join(format!("rigstage-persist-{}", std::process::id()));
    let path = dir.join("nested").join("components.json");
    let mut store = JsonFileStore;

    store.write(&path, &sample()).unwrap();
    assert_eq!(store.read(&path).unwrap(), sample());

    std::fs::write(&path, "[1, 2]").unwrap();
    let err = store.read(&path).unwrap_err();
    assert!(err.to_string().contains("expected a mapping"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_paths_are_persist_errors() {
    let missing = Path::new("/definitely/not/here.json");
    assert!(matches!(
        JsonFileStore.read(missing).unwrap_err(),
        RigError::Persist(_)
    ));
    assert!(matches!(
        MemoryStore::new().read(missing).unwrap_err(),
        RigError::Persist(_)
    ));
}

#[test]
fn memory_store_keeps_writes_by_path() {
    let mut store = MemoryStore::new();
    store.write(Path::new("a.json"), &sample()).unwrap();
    assert_eq!(store.read(Path::new("a.json")).unwrap(), sample());
    assert_eq!(store.paths().count(), 1);
}
