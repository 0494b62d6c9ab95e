use serde_json::json;

use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ComponentKind};
use crate::component::lifecycle::ComponentCore;
use crate::component::rig;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::params::store::{ParamType, ParameterStore};

pub const NUMBER_MAIN_CONTROLS: &str = "numberMainControls";

/// Spline IK chain. The number of main controls governs which `mainControl{i}Name`
/// parameters exist.
#[derive(Debug, Default)]
pub struct ChainSpline;

pub(crate) fn main_control_param(i: usize) -> String {
    format!("mainControl{i}Name")
}

impl ChainSpline {
    fn main_controls(core: &ComponentCore) -> RigResult<Vec<EntityRef>> {
        let n = core.params.get_int(NUMBER_MAIN_CONTROLS)?;
        (0..n.max(0) as usize)
            .map(|i| -> RigResult<EntityRef> {
                Ok(EntityRef::new(core.params.get_str(&main_control_param(i))?))
            })
            .collect()
    }
}

impl ComponentKind for ChainSpline {
    fn type_tag(&self) -> &'static str {
        "chain.chainSpline"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define(NUMBER_MAIN_CONTROLS, 4, ParamType::Int)?;
        params.define("twistStart", 0.0, ParamType::Float)?;
        params.define("twistEnd", 0.0, ParamType::Float)?;
        params.set_tooltip(NUMBER_MAIN_CONTROLS, "spline driver count, at least 2")?;
        Ok(())
    }

    fn governing_parameters(&self) -> &'static [&'static str] {
        &[NUMBER_MAIN_CONTROLS]
    }

    fn define_dynamic(
        &self,
        name: &str,
        _inputs: &[EntityRef],
        params: &mut ParameterStore,
    ) -> RigResult<()> {
        let n = params.get_int(NUMBER_MAIN_CONTROLS)?;
        if n < 2 {
            return Err(RigError::construction(format!(
                "'{name}': {NUMBER_MAIN_CONTROLS} must be at least 2, got {n}"
            )));
        }
        for i in 0..n as usize {
            params.define_dynamic(
                &main_control_param(i),
                format!("{name}Driver_{i}"),
                ParamType::String,
            )?;
        }
        Ok(())
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let joints = rig::joint_chain(cx.scene(), core.input(0)?, core.input(1)?)?;
        let drivers = Self::main_controls(core)?;
        let size = core.size()?;

        let curve = cx.create_entity(
            EntityKind::Curve,
            &format!("{}_curve", core.name),
            Some(&core.root()),
        )?;
        cx.set_attr(&curve, "cvs", drivers.len())?;

        for d in &drivers {
            rig::create_control(cx, d.as_str(), &core.control_group(), "square", size)?;
        }
        cx.set_attr(
            &curve,
            "drivers",
            json!(drivers.iter().map(EntityRef::as_str).collect::<Vec<_>>()),
        )?;

        let spline = cx.create_entity(
            EntityKind::Network,
            &format!("{}_ikSpline", core.name),
            Some(&core.root()),
        )?;
        cx.set_attr(&spline, "curve", curve.as_str())?;
        cx.set_attr(
            &spline,
            "joints",
            json!(joints.iter().map(EntityRef::as_str).collect::<Vec<_>>()),
        )?;
        for joint in &joints {
            rig::drive_input(cx, &core.name, joint, &spline)?;
        }

        if let Some(last) = drivers.last() {
            cx.containers
                .set_child_anchor(&mut *cx.scene, &core.container, last)?;
        }
        Ok(())
    }

    fn setup_anim_attrs(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        let drivers = Self::main_controls(core)?;
        if let (Some(first), Some(last)) = (drivers.first(), drivers.last()) {
            rig::add_anim_attr(cx, first, "twist", core.params.get_float("twistStart")?)?;
            rig::add_anim_attr(cx, last, "twist", core.params.get_float("twistEnd")?)?;
        }
        Ok(())
    }
}
