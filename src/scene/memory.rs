use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::scene::{SceneGraph, TagIndex};

#[derive(Clone, Debug, serde::Serialize)]
struct EntityNode {
    kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
}

/// In-memory scene graph.
///
/// Deleting an entity deletes its whole subtree, children first. Every deleted name is
/// appended to [`MemoryScene::deletion_log`] in that order.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct MemoryScene {
    entities: BTreeMap<String, EntityNode>,
    tags: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip)]
    deletions: Vec<EntityRef>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deletion_log(&self) -> &[EntityRef] {
        &self.deletions
    }

    pub fn clear_deletion_log(&mut self) {
        self.deletions.clear();
    }

    /// Top-level entities, in name order.
    pub fn roots(&self) -> Vec<EntityRef> {
        self.entities
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(name, _)| EntityRef::new(name.clone()))
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    fn node(&self, entity: &EntityRef) -> RigResult<&EntityNode> {
        self.entities
            .get(entity.as_str())
            .ok_or_else(|| RigError::scene(format!("entity '{entity}' does not exist")))
    }

    fn node_mut(&mut self, entity: &EntityRef) -> RigResult<&mut EntityNode> {
        self.entities
            .get_mut(entity.as_str())
            .ok_or_else(|| RigError::scene(format!("entity '{entity}' does not exist")))
    }

    fn detach(&mut self, name: &str) {
        let parent = self.entities.get(name).and_then(|n| n.parent.clone());
        if let Some(p) = parent
            && let Some(pn) = self.entities.get_mut(&p)
        {
            pn.children.retain(|c| c != name);
        }
    }

    fn delete_subtree(&mut self, name: &str) {
        let Some(node) = self.entities.get(name) else {
            return;
        };
        for child in node.children.clone() {
            self.delete_subtree(&child);
        }
        self.detach(name);
        self.entities.remove(name);
        for members in self.tags.values_mut() {
            members.remove(name);
        }
        self.deletions.push(EntityRef::new(name));
    }

    fn is_descendant(&self, name: &str, ancestor: &str) -> bool {
        let mut cur = self.entities.get(name).and_then(|n| n.parent.clone());
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.entities.get(&p).and_then(|n| n.parent.clone());
        }
        false
    }
}

impl SceneGraph for MemoryScene {
    fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<&EntityRef>,
    ) -> RigResult<EntityRef> {
        if name.trim().is_empty() {
            return Err(RigError::scene("entity name must be non-empty"));
        }
        if self.entities.contains_key(name) {
            return Err(RigError::duplicate_name(format!(
                "entity '{name}' already exists"
            )));
        }
        if let Some(p) = parent {
            let pn = self.entities.get_mut(p.as_str()).ok_or_else(|| {
                RigError::missing_input(format!("parent '{p}' of '{name}' does not exist"))
            })?;
            pn.children.push(name.to_owned());
        }
        self.entities.insert(
            name.to_owned(),
            EntityNode {
                kind,
                parent: parent.map(|p| p.0.clone()),
                children: Vec::new(),
                attributes: BTreeMap::new(),
            },
        );
        Ok(EntityRef::new(name))
    }

    fn set_attribute(&mut self, entity: &EntityRef, attr: &str, value: Value) -> RigResult<()> {
        let node = self.node_mut(entity)?;
        if value.is_null() {
            node.attributes.remove(attr);
        } else {
            node.attributes.insert(attr.to_owned(), value);
        }
        Ok(())
    }

    fn get_attribute(&self, entity: &EntityRef, attr: &str) -> RigResult<Option<Value>> {
        Ok(self.node(entity)?.attributes.get(attr).cloned())
    }

    fn delete_entities(&mut self, refs: &[EntityRef]) -> RigResult<()> {
        for r in refs {
            self.delete_subtree(r.as_str());
        }
        Ok(())
    }

    fn list_children(&self, entity: &EntityRef) -> RigResult<Vec<EntityRef>> {
        Ok(self
            .node(entity)?
            .children
            .iter()
            .map(|c| EntityRef::new(c.clone()))
            .collect())
    }

    fn exists(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    fn kind_of(&self, entity: &EntityRef) -> Option<EntityKind> {
        self.entities.get(entity.as_str()).map(|n| n.kind)
    }

    fn parent_of(&self, entity: &EntityRef) -> Option<EntityRef> {
        self.entities
            .get(entity.as_str())
            .and_then(|n| n.parent.clone())
            .map(EntityRef::new)
    }

    fn reparent(&mut self, entity: &EntityRef, parent: Option<&EntityRef>) -> RigResult<()> {
        self.node(entity)?;
        if let Some(p) = parent {
            self.node(p)?;
            if p == entity || self.is_descendant(p.as_str(), entity.as_str()) {
                return Err(RigError::scene(format!(
                    "cannot parent '{entity}' under its own descendant '{p}'"
                )));
            }
        }
        self.detach(entity.as_str());
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(entity.0.clone());
        }
        self.node_mut(entity)?.parent = parent.map(|p| p.0.clone());
        Ok(())
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl TagIndex for MemoryScene {
    fn tag(&mut self, entity: &EntityRef, label: &str) -> RigResult<()> {
        self.node(entity)?;
        self.tags
            .entry(label.to_owned())
            .or_default()
            .insert(entity.0.clone());
        Ok(())
    }

    fn untag(&mut self, entity: &EntityRef, label: &str) {
        if let Some(members) = self.tags.get_mut(label) {
            members.remove(entity.as_str());
        }
    }

    fn get_tagged(&self, label: &str) -> Vec<EntityRef> {
        self.tags
            .get(label)
            .map(|m| m.iter().map(|n| EntityRef::new(n.clone())).collect())
            .unwrap_or_default()
    }

    fn has_tag(&self, entity: &EntityRef, label: &str) -> bool {
        self.tags
            .get(label)
            .is_some_and(|m| m.contains(entity.as_str()))
    }
}
