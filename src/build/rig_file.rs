use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::build::options::BuildOptions;
use crate::component::record::ComponentRecord;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::scene::SceneGraph;

/// An external entity the rig is built on, usually a skeleton joint.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkeletonEntity {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

fn default_kind() -> EntityKind {
    EntityKind::Joint
}

/// Declarative description of a whole rig.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigFile {
    pub rig_name: String,
    #[serde(default)]
    pub options: BuildOptions,
    #[serde(default)]
    pub skeleton: Vec<SkeletonEntity>,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl RigFile {
    pub fn from_reader<R: std::io::Read>(r: R) -> RigResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| RigError::serde(format!("parse rig JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> RigResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RigError::persist(format!("open rig JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Create the skeleton entities in declaration order. Parents must come first.
    pub fn seed_scene<S: SceneGraph + ?Sized>(&self, scene: &mut S) -> RigResult<usize> {
        for e in &self.skeleton {
            let parent = e.parent.as_ref().map(EntityRef::new);
            scene.create_entity(e.kind, &e.name, parent.as_ref())?;
        }
        Ok(self.skeleton.len())
    }
}
