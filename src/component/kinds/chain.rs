use serde_json::{Map, json};

use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ComponentKind};
use crate::component::lifecycle::ComponentCore;
use crate::component::rig;
use crate::foundation::core::EntityRef;
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

/// FK control per joint from the start input down to the end input.
#[derive(Debug, Default)]
pub struct Chain;

impl Chain {
    pub(crate) fn fk_control(core: &ComponentCore, i: usize) -> EntityRef {
        EntityRef::new(format!("{}_fk{i}", core.name))
    }
}

impl ComponentKind for Chain {
    fn type_tag(&self) -> &'static str {
        "chain.chain"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define("controlShape", "circle", ParamType::String)?;
        params.define("addFKSpace", false, ParamType::Bool)?;
        params.define("spaces", Map::new(), ParamType::Mapping)?;
        Ok(())
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let joints = rig::joint_chain(cx.scene(), core.input(0)?, core.input(1)?)?;
        let shape = core.params.get_str("controlShape")?.to_owned();
        let size = core.size()?;

        let mut parent = core.control_group();
        let mut controls = Vec::with_capacity(joints.len());
        for (i, joint) in joints.iter().enumerate() {
            let ctl = rig::create_control(
                cx,
                Self::fk_control(core, i).as_str(),
                &parent,
                &shape,
                size,
            )?;
            rig::drive_input(cx, &core.name, joint, &ctl)?;
            controls.push(ctl.as_str().to_owned());
            parent = ctl;
        }

        cx.set_attr(&core.params_group(), "fkControls", json!(controls))?;
        cx.containers
            .set_child_anchor(&mut *cx.scene, &core.container, &parent)
    }

    fn connect(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        if !core.params.get_bool("addFKSpace")? {
            return Ok(());
        }
        let spaces = core.params.get_mapping("spaces")?.clone();
        rig::connect_spaces(core, cx, &Self::fk_control(core, 0), &spaces)?;
        Ok(())
    }
}
