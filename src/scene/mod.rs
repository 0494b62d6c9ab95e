//! Scene-graph collaborator interfaces.
//!
//! The build engine never owns scene state. Everything it emits goes through [`SceneGraph`],
//! and cross-component discovery goes through [`TagIndex`]. [`MemoryScene`] is a reference
//! adapter used for headless runs and tests.

pub mod memory;

use serde_json::Value;

use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::RigResult;

pub use memory::MemoryScene;

/// Attribute holding the list of locked attribute names on an entity.
pub const LOCKED_ATTR: &str = "locked";
/// Attribute naming the component currently driving an input entity.
pub const DRIVEN_BY_ATTR: &str = "drivenBy";
/// Transform channels locked by the default lock policy.
pub const TRANSFORM_ATTRS: [&str; 3] = ["t", "r", "s"];

/// Create, query and delete entities in the external scene.
pub trait SceneGraph {
    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<&EntityRef>,
    ) -> RigResult<EntityRef>;

    fn set_attribute(&mut self, entity: &EntityRef, attr: &str, value: Value) -> RigResult<()>;

    /// Missing attributes read as `None`; a missing entity is an error.
    fn get_attribute(&self, entity: &EntityRef, attr: &str) -> RigResult<Option<Value>>;

    /// Deletes the given entities and their descendants. Unknown names are ignored.
    fn delete_entities(&mut self, refs: &[EntityRef]) -> RigResult<()>;

    fn list_children(&self, entity: &EntityRef) -> RigResult<Vec<EntityRef>>;

    fn exists(&self, name: &str) -> bool;

    fn kind_of(&self, entity: &EntityRef) -> Option<EntityKind>;

    fn parent_of(&self, entity: &EntityRef) -> Option<EntityRef>;

    /// Move `entity` under `parent`, or to the scene root when `parent` is `None`.
    fn reparent(&mut self, entity: &EntityRef, parent: Option<&EntityRef>) -> RigResult<()>;

    fn entity_count(&self) -> usize;
}

/// External inverted index over entity roles.
pub trait TagIndex {
    fn tag(&mut self, entity: &EntityRef, label: &str) -> RigResult<()>;

    fn untag(&mut self, entity: &EntityRef, label: &str);

    fn get_tagged(&self, label: &str) -> Vec<EntityRef>;

    fn has_tag(&self, entity: &EntityRef, label: &str) -> bool {
        self.get_tagged(label).iter().any(|e| e == entity)
    }
}

/// Everything the build engine needs from the host application.
pub trait Scene: SceneGraph + TagIndex {}

impl<T: SceneGraph + TagIndex + ?Sized> Scene for T {}

pub fn locked_attributes<S: SceneGraph + ?Sized>(
    scene: &S,
    entity: &EntityRef,
) -> RigResult<Vec<String>> {
    let Some(value) = scene.get_attribute(entity, LOCKED_ATTR)? else {
        return Ok(Vec::new());
    };
    Ok(value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default())
}

pub fn lock_attributes<S: SceneGraph + ?Sized>(
    scene: &mut S,
    entity: &EntityRef,
    attrs: &[&str],
) -> RigResult<()> {
    let mut locked = locked_attributes(scene, entity)?;
    for a in attrs {
        if !locked.iter().any(|l| l == a) {
            locked.push((*a).to_owned());
        }
    }
    scene.set_attribute(entity, LOCKED_ATTR, Value::from(locked))
}

pub fn unlock_attributes<S: SceneGraph + ?Sized>(
    scene: &mut S,
    entity: &EntityRef,
    attrs: &[&str],
) -> RigResult<()> {
    let mut locked = locked_attributes(scene, entity)?;
    locked.retain(|l| !attrs.contains(&l.as_str()));
    scene.set_attribute(entity, LOCKED_ATTR, Value::from(locked))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/memory.rs"]
mod tests;
