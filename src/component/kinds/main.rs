use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ComponentKind};
use crate::component::lifecycle::ComponentCore;
use crate::component::rig;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

/// Top of every rig: `rig`, `bind` and `model` groups plus global and local controls.
///
/// Every other component's root ends up under the rig group, so this one is built first and
/// torn down last.
#[derive(Debug, Default)]
pub struct Main;

impl ComponentKind for Main {
    fn type_tag(&self) -> &'static str {
        "main.main"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define("rigGroupName", "rig", ParamType::String)?;
        params.define("bindGroupName", "bind", ParamType::String)?;
        params.define("modelGroupName", "model", ParamType::String)?;
        params.set_tooltip("rigGroupName", "group collecting every component root")?;
        Ok(())
    }

    fn initial_hierarchy(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        let rig_group = cx.create_entity(
            EntityKind::Transform,
            core.params.get_str("rigGroupName")?,
            None,
        )?;
        for key in ["bindGroupName", "modelGroupName"] {
            cx.create_entity(EntityKind::Transform, core.params.get_str(key)?, Some(&rig_group))?;
        }
        let root = core.root();
        if cx.scene.parent_of(&root).as_ref() != Some(&rig_group) {
            cx.scene.reparent(&root, Some(&rig_group))?;
        }
        Ok(())
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let size = core.size()?;
        let global = rig::create_control(
            cx,
            &format!("{}_global_ctl", core.name),
            &core.control_group(),
            "circle",
            size * 2.0,
        )?;
        let local = rig::create_control(
            cx,
            &format!("{}_local_ctl", core.name),
            &global,
            "circle",
            size * 1.6,
        )?;
        cx.containers
            .set_child_anchor(&mut *cx.scene, &core.container, &local)
    }

    fn setup_anim_attrs(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        let global = EntityRef::new(format!("{}_global_ctl", core.name));
        rig::add_anim_attr(cx, &global, "rigScale", 1.0)
    }

    fn publish_attributes(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        let global = EntityRef::new(format!("{}_global_ctl", core.name));
        cx.containers.publish_attr(
            &mut *cx.scene,
            &core.container,
            &global,
            "rigScale",
            Some("rigScale"),
        )?;
        Ok(())
    }
}
