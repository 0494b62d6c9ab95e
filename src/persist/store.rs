use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::foundation::error::{RigError, RigResult};

/// Reads and writes mappings by path. Format and location belong to the implementation.
pub trait Persistence {
    fn read(&self, path: &Path) -> RigResult<Map<String, Value>>;

    fn write(&mut self, path: &Path, data: &Map<String, Value>) -> RigResult<()>;
}

/// Pretty-printed JSON files on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFileStore;

impl Persistence for JsonFileStore {
    fn read(&self, path: &Path) -> RigResult<Map<String, Value>> {
        let f = File::open(path)
            .map_err(|e| RigError::persist(format!("open '{}': {e}", path.display())))?;
        let v: Value = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| RigError::serde(format!("parse '{}': {e}", path.display())))?;
        match v {
            Value::Object(m) => Ok(m),
            other => Err(RigError::persist(format!(
                "'{}' holds {}, expected a mapping",
                path.display(),
                kind_name(&other)
            ))),
        }
    }

    fn write(&mut self, path: &Path, data: &Map<String, Value>) -> RigResult<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| {
                RigError::persist(format!("create directory '{}': {e}", dir.display()))
            })?;
        }
        let f = File::create(path)
            .map_err(|e| RigError::persist(format!("create '{}': {e}", path.display())))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, data)?;
        w.write_all(b"\n")
            .and_then(|()| w.flush())
            .map_err(|e| RigError::persist(format!("write '{}': {e}", path.display())))
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// In-memory store, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

impl Persistence for MemoryStore {
    fn read(&self, path: &Path) -> RigResult<Map<String, Value>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RigError::persist(format!("nothing stored at '{}'", path.display())))
    }

    fn write(&mut self, path: &Path, data: &Map<String, Value>) -> RigResult<()> {
        self.files.insert(path.to_path_buf(), data.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/store.rs"]
mod tests;
