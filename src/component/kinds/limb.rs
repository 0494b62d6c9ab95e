use serde_json::{Map, json};

use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ComponentKind};
use crate::component::lifecycle::ComponentCore;
use crate::component::rig;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

pub const IKFK_ATTR: &str = "ikfk";

/// Clavicle-to-wrist limb with FK and IK chains blended by an `ikfk` attribute.
///
/// Inputs are `[base, upper, middle, end]`. Only the first four inputs are read, so kinds
/// with longer input lists can delegate to these hooks.
#[derive(Debug, Default)]
pub struct Limb;

/// Names of the entities a limb emits.
pub(crate) struct LimbRig {
    pub base: EntityRef,
    pub swing: EntityRef,
    pub fk: [EntityRef; 3],
    pub ik: EntityRef,
    pub pv: EntityRef,
    pub blend: EntityRef,
}

impl LimbRig {
    pub(crate) fn of(core: &ComponentCore) -> Self {
        let n = &core.name;
        Self {
            base: EntityRef::new(format!("{n}_limbBase")),
            swing: EntityRef::new(format!("{n}_limbSwing")),
            fk: [1, 2, 3].map(|i| EntityRef::new(format!("{n}_fk{i}"))),
            ik: EntityRef::new(format!("{n}_ikControl")),
            pv: EntityRef::new(format!("{n}_pvControl")),
            blend: EntityRef::new(format!("{n}_ikfkBlend")),
        }
    }
}

impl ComponentKind for Limb {
    fn type_tag(&self) -> &'static str {
        "limb.limb"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(4)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define("ikSpaces", Map::new(), ParamType::Mapping)?;
        params.define("pvSpaces", Map::new(), ParamType::Mapping)?;
        params.define("ikfkDefault", 0.0, ParamType::Float)?;
        params.set_tooltip("ikSpaces", "space label -> target entity for the IK control")?;
        params.set_tooltip("pvSpaces", "space label -> target entity for the pole vector")?;
        Ok(())
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let names = LimbRig::of(core);
        let size = core.size()?;
        let control_group = core.control_group();

        let base = rig::create_control(cx, names.base.as_str(), &control_group, "square", size)?;
        rig::drive_input(cx, &core.name, core.input(0)?, &base)?;
        let swing = rig::create_control(cx, names.swing.as_str(), &base, "circle", size)?;

        let mut parent = swing;
        for fk in &names.fk {
            parent = rig::create_control(cx, fk.as_str(), &parent, "circle", size)?;
        }

        let ik = rig::create_control(cx, names.ik.as_str(), &control_group, "cube", size)?;
        rig::hide_attributes(cx, &ik, &["s"])?;
        let pv = rig::create_control(cx, names.pv.as_str(), &control_group, "diamond", size * 0.5)?;
        rig::hide_attributes(cx, &pv, &["r", "s"])?;

        let blend =
            cx.create_entity(EntityKind::Network, names.blend.as_str(), Some(&core.root()))?;
        cx.set_attr(
            &blend,
            "fk",
            json!(names.fk.iter().map(EntityRef::as_str).collect::<Vec<_>>()),
        )?;
        cx.set_attr(&blend, "ik", names.ik.as_str())?;
        cx.set_attr(&blend, "poleVector", names.pv.as_str())?;
        for i in 1..4 {
            rig::drive_input(cx, &core.name, core.input(i)?, &blend)?;
        }

        let tip = cx.create_entity(
            EntityKind::Transform,
            &format!("{}_tip", core.name),
            Some(&control_group),
        )?;
        cx.containers
            .set_child_anchor(&mut *cx.scene, &core.container, &tip)
    }

    fn setup_anim_attrs(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        let default = core.params.get_float("ikfkDefault")?;
        rig::add_anim_attr(cx, &core.params_group(), IKFK_ATTR, default)?;
        rig::add_anim_attr(cx, &LimbRig::of(core).pv, "pinElbow", 0.0)
    }

    fn connect(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let names = LimbRig::of(core);
        let ik_spaces = core.params.get_mapping("ikSpaces")?.clone();
        rig::connect_spaces(core, cx, &names.ik, &ik_spaces)?;
        let pv_spaces = core.params.get_mapping("pvSpaces")?.clone();
        rig::connect_spaces(core, cx, &names.pv, &pv_spaces)?;
        Ok(())
    }

    fn publish_attributes(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        let alias = format!("{}_{IKFK_ATTR}", core.name);
        cx.containers.publish_attr(
            &mut *cx.scene,
            &core.container,
            &core.params_group(),
            IKFK_ATTR,
            Some(&alias),
        )?;
        Ok(())
    }
}
