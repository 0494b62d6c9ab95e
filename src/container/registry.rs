use std::collections::{BTreeMap, BTreeSet};

use crate::container::metadata::ContainerMetadata;
use crate::container::{COMPONENT_TAG, CONTAINER_ATTR, METADATA_ATTR};
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::scene::Scene;

/// Namespace owning the entities one component produced.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub members: BTreeSet<EntityRef>,
    /// Upstream attach point.
    #[serde(default)]
    pub parent_anchor: Option<EntityRef>,
    /// Downstream attach point.
    #[serde(default)]
    pub child_anchor: Option<EntityRef>,
    #[serde(default)]
    pub published: BTreeSet<EntityRef>,
    /// Published alias -> `entity.attribute` plug.
    #[serde(default)]
    pub published_attrs: BTreeMap<String, String>,
    /// Containers of composite children, in nesting order.
    #[serde(default)]
    pub nested: Vec<String>,
}

impl Container {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.name.clone())
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.members.contains(entity)
    }
}

/// In-session view of every container, mirrored into the scene after each mutation.
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    containers: BTreeMap<String, Container>,
    owners: BTreeMap<EntityRef, String>,
    claims: BTreeSet<String>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a component name for this session.
    pub fn claim(&mut self, component: &str) -> RigResult<()> {
        if !self.claims.insert(component.to_owned()) {
            return Err(RigError::duplicate_name(format!(
                "a component named '{component}' already exists in this build"
            )));
        }
        Ok(())
    }

    pub fn release(&mut self, component: &str) {
        self.claims.remove(component);
    }

    pub fn is_claimed(&self, component: &str) -> bool {
        self.claims.contains(component)
    }

    pub fn get(&self, name: &str) -> Option<&Container> {
        self.containers.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    pub fn members(&self, name: &str) -> RigResult<Vec<EntityRef>> {
        Ok(self.require(name)?.members.iter().cloned().collect())
    }

    /// The container owning `entity`, if any.
    pub fn container_of(&self, entity: &EntityRef) -> Option<&str> {
        self.owners.get(entity).map(String::as_str)
    }

    /// Create a new container. Collides with any existing entity or container name.
    pub fn create(&mut self, scene: &mut dyn Scene, name: &str) -> RigResult<&Container> {
        if self.containers.contains_key(name) || scene.exists(name) {
            return Err(RigError::duplicate_name(format!(
                "cannot create container '{name}': name already in use"
            )));
        }
        scene.create_entity(EntityKind::Container, name, None)?;
        scene.tag(&EntityRef::new(name), COMPONENT_TAG)?;
        self.containers.insert(name.to_owned(), Container::new(name));
        self.sync(scene, name)?;
        tracing::debug!(container = name, "container created");
        self.require(name)
    }

    /// Register a container that already exists in the scene, e.g. from an earlier session.
    pub fn adopt(&mut self, scene: &mut dyn Scene, name: &str) -> RigResult<&Container> {
        if self.containers.contains_key(name) {
            return self.require(name);
        }
        let entity = EntityRef::new(name);
        if scene.kind_of(&entity) != Some(EntityKind::Container) {
            return Err(RigError::scene(format!("'{name}' is not a container")));
        }
        let container = match scene.get_attribute(&entity, CONTAINER_ATTR)? {
            Some(v) => serde_json::from_value::<Container>(v)?,
            None => Container::new(name),
        };
        for m in &container.members {
            self.owners.insert(m.clone(), name.to_owned());
        }
        for nested in container.nested.clone() {
            if scene.exists(&nested) {
                self.adopt(scene, &nested)?;
            }
        }
        self.containers.insert(name.to_owned(), container);
        tracing::debug!(container = name, "container adopted");
        self.require(name)
    }

    /// Every container in the scene carrying the component tag.
    pub fn discover(scene: &dyn Scene) -> Vec<String> {
        scene
            .get_tagged(COMPONENT_TAG)
            .into_iter()
            .filter(|e| scene.kind_of(e) == Some(EntityKind::Container))
            .map(|e| e.0)
            .collect()
    }

    /// Add entities (and their shape children) to `name`, taking them from any previous owner.
    pub fn add_entities(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        refs: &[EntityRef],
    ) -> RigResult<Vec<EntityRef>> {
        self.require(name)?;
        let mut added = Vec::new();
        for r in refs {
            if !scene.exists(r.as_str()) {
                return Err(RigError::missing_input(format!(
                    "cannot add '{r}' to container '{name}': entity does not exist"
                )));
            }
            added.push(r.clone());
            for child in scene.list_children(r)? {
                if scene.kind_of(&child).is_some_and(EntityKind::is_shape) {
                    added.push(child);
                }
            }
        }

        let mut touched = BTreeSet::new();
        touched.insert(name.to_owned());
        for e in &added {
            if let Some(prev) = self.owners.insert(e.clone(), name.to_owned())
                && prev != name
            {
                if let Some(c) = self.containers.get_mut(&prev) {
                    c.members.remove(e);
                }
                touched.insert(prev);
            }
            if let Some(c) = self.containers.get_mut(name) {
                c.members.insert(e.clone());
            }
        }
        for c in touched {
            self.sync(scene, &c)?;
        }
        Ok(added)
    }

    /// Remove entities (and their shape children) from `name`.
    pub fn remove_entities(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        refs: &[EntityRef],
    ) -> RigResult<()> {
        self.require(name)?;
        let mut removed = Vec::new();
        for r in refs {
            removed.push(r.clone());
            if scene.exists(r.as_str()) {
                for child in scene.list_children(r)? {
                    if scene.kind_of(&child).is_some_and(EntityKind::is_shape) {
                        removed.push(child);
                    }
                }
            }
        }
        if let Some(c) = self.containers.get_mut(name) {
            for e in &removed {
                if c.members.remove(e) {
                    self.owners.remove(e);
                }
                c.published.remove(e);
            }
        }
        self.sync(scene, name)
    }

    pub fn set_parent_anchor(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        entity: &EntityRef,
    ) -> RigResult<()> {
        self.ensure_member(scene, name, entity)?;
        self.require_mut(name)?.parent_anchor = Some(entity.clone());
        self.sync(scene, name)
    }

    pub fn set_child_anchor(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        entity: &EntityRef,
    ) -> RigResult<()> {
        self.ensure_member(scene, name, entity)?;
        self.require_mut(name)?.child_anchor = Some(entity.clone());
        self.sync(scene, name)
    }

    pub fn publish_node(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        entity: &EntityRef,
    ) -> RigResult<()> {
        self.ensure_member(scene, name, entity)?;
        if self.require_mut(name)?.published.insert(entity.clone()) {
            self.sync(scene, name)?;
        }
        Ok(())
    }

    /// Publish `entity.attr` on the container under `alias` (defaults to `entity_attr`).
    ///
    /// Returns the published plug on the container.
    pub fn publish_attr(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        entity: &EntityRef,
        attr: &str,
        alias: Option<&str>,
    ) -> RigResult<String> {
        if scene.get_attribute(entity, attr)?.is_none() {
            return Err(RigError::missing_input(format!(
                "attribute '{entity}.{attr}' does not exist, cannot publish it"
            )));
        }
        let alias = alias.map_or_else(|| format!("{entity}_{attr}"), str::to_owned);
        self.require_mut(name)?
            .published_attrs
            .insert(alias.clone(), format!("{entity}.{attr}"));
        self.sync(scene, name)?;
        Ok(format!("{name}.{alias}"))
    }

    /// Record `child` as a nested container of `parent`.
    pub fn nest(&mut self, scene: &mut dyn Scene, parent: &str, child: &str) -> RigResult<()> {
        self.require(child)?;
        let p = self.require_mut(parent)?;
        if !p.nested.iter().any(|n| n == child) {
            p.nested.push(child.to_owned());
            self.sync(scene, parent)?;
        }
        Ok(())
    }

    /// Move every member of `from` into `into`, then delete `discard` (the child's redundant
    /// root) if given. Anchors and published nodes of `from` are cleared.
    pub fn absorb(
        &mut self,
        scene: &mut dyn Scene,
        from: &str,
        into: &str,
        discard: Option<&EntityRef>,
    ) -> RigResult<Vec<EntityRef>> {
        self.require(into)?;
        let moved: Vec<EntityRef> = {
            let src = self.require_mut(from)?;
            let moved = std::mem::take(&mut src.members).into_iter().collect();
            src.parent_anchor = None;
            src.child_anchor = None;
            src.published.clear();
            moved
        };

        let keep: Vec<EntityRef> = moved
            .into_iter()
            .filter(|e| Some(e) != discard && scene.exists(e.as_str()))
            .collect();
        for e in &keep {
            self.owners.insert(e.clone(), into.to_owned());
        }
        if let Some(dst) = self.containers.get_mut(into) {
            dst.members.extend(keep.iter().cloned());
        }

        if let Some(root) = discard {
            self.owners.remove(root);
            if scene.exists(root.as_str()) {
                let doomed = self.subtree(scene, root)?;
                scene.delete_entities(std::slice::from_ref(root))?;
                self.forget(&doomed);
            }
        }

        self.sync(scene, from)?;
        self.sync(scene, into)?;
        tracing::debug!(from, into, moved = keep.len(), "container members re-homed");
        Ok(keep)
    }

    /// Delete a container, its nested containers (first), and every member still in the scene.
    ///
    /// Returns the deleted container names, innermost first.
    pub fn delete(&mut self, scene: &mut dyn Scene, name: &str) -> RigResult<Vec<String>> {
        let Some(container) = self.containers.get(name).cloned() else {
            return Ok(Vec::new());
        };

        let mut deleted = Vec::new();
        for nested in container.nested.iter().rev() {
            deleted.extend(self.delete(scene, nested)?);
        }

        let live: Vec<EntityRef> = container
            .members
            .iter()
            .filter(|m| scene.exists(m.as_str()))
            .cloned()
            .collect();
        scene.delete_entities(&live)?;
        scene.delete_entities(&[container.entity()])?;

        for m in &container.members {
            self.owners.remove(m);
        }
        self.containers.remove(name);
        for other in self.containers.values_mut() {
            other.nested.retain(|n| n != name);
        }
        deleted.push(name.to_owned());
        tracing::debug!(container = name, members = live.len(), "container deleted");
        Ok(deleted)
    }

    pub fn write_metadata(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        metadata: &ContainerMetadata,
    ) -> RigResult<()> {
        self.require(name)?;
        let value = serde_json::to_value(metadata)?;
        scene.set_attribute(&EntityRef::new(name), METADATA_ATTR, value)
    }

    /// Read the metadata blob straight from the scene. Works for unregistered containers.
    pub fn read_metadata(scene: &dyn Scene, name: &str) -> RigResult<Option<ContainerMetadata>> {
        if !scene.exists(name) {
            return Ok(None);
        }
        match scene.get_attribute(&EntityRef::new(name), METADATA_ATTR)? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    fn ensure_member(
        &mut self,
        scene: &mut dyn Scene,
        name: &str,
        entity: &EntityRef,
    ) -> RigResult<()> {
        if !scene.exists(entity.as_str()) {
            return Err(RigError::missing_input(format!(
                "'{entity}' does not exist, cannot publish it on '{name}'"
            )));
        }
        if self.container_of(entity).is_none() {
            self.add_entities(scene, name, std::slice::from_ref(entity))?;
        }
        Ok(())
    }

    fn subtree(&self, scene: &dyn Scene, root: &EntityRef) -> RigResult<Vec<EntityRef>> {
        let mut out = vec![root.clone()];
        let mut i = 0;
        while i < out.len() {
            let children = scene.list_children(&out[i])?;
            out.extend(children);
            i += 1;
        }
        Ok(out)
    }

    fn forget(&mut self, entities: &[EntityRef]) {
        for e in entities {
            if let Some(owner) = self.owners.remove(e)
                && let Some(c) = self.containers.get_mut(&owner)
            {
                c.members.remove(e);
                c.published.remove(e);
            }
        }
    }

    fn sync(&self, scene: &mut dyn Scene, name: &str) -> RigResult<()> {
        let container = self.require(name)?;
        if !scene.exists(name) {
            return Ok(());
        }
        let value = serde_json::to_value(container)?;
        scene.set_attribute(&container.entity(), CONTAINER_ATTR, value)
    }

    fn require(&self, name: &str) -> RigResult<&Container> {
        self.containers
            .get(name)
            .ok_or_else(|| RigError::scene(format!("'{name}' is not a registered container")))
    }

    fn require_mut(&mut self, name: &str) -> RigResult<&mut Container> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| RigError::scene(format!("'{name}' is not a registered container")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/registry.rs"]
mod tests;
