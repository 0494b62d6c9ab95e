use serde_json::Value;

use crate::container::registry::ContainerRegistry;
use crate::container::scope::ActiveContainerStack;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::params::store::CoercionPolicy;
use crate::scene::Scene;

/// Session state threaded through every stage call.
///
/// Holds the scene collaborator, the container registry and the active-container stack.
/// Entities created through [`BuildContext::create_entity`] land in whatever container is
/// currently active.
pub struct BuildContext<'a> {
    pub(crate) scene: &'a mut dyn Scene,
    pub(crate) containers: ContainerRegistry,
    pub(crate) scope: ActiveContainerStack,
    coercion: CoercionPolicy,
}

impl<'a> BuildContext<'a> {
    pub fn new(scene: &'a mut dyn Scene) -> Self {
        Self::with_coercion(scene, CoercionPolicy::default())
    }

    pub fn with_coercion(scene: &'a mut dyn Scene, coercion: CoercionPolicy) -> Self {
        Self {
            scene,
            containers: ContainerRegistry::new(),
            scope: ActiveContainerStack::new(),
            coercion,
        }
    }

    pub fn scene(&self) -> &dyn Scene {
        &*self.scene
    }

    pub fn scene_mut(&mut self) -> &mut dyn Scene {
        &mut *self.scene
    }

    pub fn containers(&self) -> &ContainerRegistry {
        &self.containers
    }

    pub fn containers_mut(&mut self) -> &mut ContainerRegistry {
        &mut self.containers
    }

    pub fn scope(&self) -> &ActiveContainerStack {
        &self.scope
    }

    pub fn coercion(&self) -> CoercionPolicy {
        self.coercion
    }

    pub fn active_container(&self) -> Option<String> {
        self.scope.current()
    }

    /// Create an entity and capture it into the active container.
    ///
    /// An entity of the same name and kind that the active container already owns is reused,
    /// so a stage retried after a failure does not trip over its own leftovers.
    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<&EntityRef>,
    ) -> RigResult<EntityRef> {
        let entity = EntityRef::new(name);
        let active = self.scope.current();

        if self.scene.exists(name) {
            let owned = active
                .as_deref()
                .is_some_and(|c| self.containers.container_of(&entity) == Some(c));
            if !owned || self.scene.kind_of(&entity) != Some(kind) {
                return Err(RigError::duplicate_name(format!(
                    "cannot create {kind:?} '{name}': name already in use"
                )));
            }
            tracing::debug!(entity = name, "reusing entity left by an earlier attempt");
            if self.scene.parent_of(&entity).as_ref() != parent {
                self.scene.reparent(&entity, parent)?;
            }
            return Ok(entity);
        }

        self.scene.create_entity(kind, name, parent)?;
        if let Some(c) = active {
            self.containers
                .add_entities(&mut *self.scene, &c, std::slice::from_ref(&entity))?;
        }
        Ok(entity)
    }

    pub fn set_attr(
        &mut self,
        entity: &EntityRef,
        attr: &str,
        value: impl Into<Value>,
    ) -> RigResult<()> {
        self.scene.set_attribute(entity, attr, value.into())
    }

    pub fn get_attr(&self, entity: &EntityRef, attr: &str) -> RigResult<Option<Value>> {
        self.scene.get_attribute(entity, attr)
    }

    pub fn tag(&mut self, entity: &EntityRef, label: &str) -> RigResult<()> {
        self.scene.tag(entity, label)
    }

    /// Fail with `MissingInput` unless `entity` exists.
    pub fn require(&self, entity: &EntityRef, role: &str) -> RigResult<()> {
        if self.scene.exists(entity.as_str()) {
            Ok(())
        } else {
            Err(RigError::missing_input(format!(
                "{role} '{entity}' does not exist in the scene"
            )))
        }
    }
}

impl std::fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("entities", &self.scene.entity_count())
            .field("containers", &self.containers)
            .field("active", &self.scope.current())
            .finish()
    }
}
