use serde_json::{Map, Value};

use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ComponentKind};
use crate::component::lifecycle::ComponentCore;
use crate::component::rig;
use crate::foundation::core::EntityRef;
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

/// One control driving one joint.
#[derive(Debug, Default)]
pub struct Basic;

impl Basic {
    fn control(core: &ComponentCore) -> EntityRef {
        EntityRef::new(format!("{}_ctl", core.name))
    }
}

impl ComponentKind for Basic {
    fn type_tag(&self) -> &'static str {
        "basic.basic"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define("controlShape", "circle", ParamType::String)?;
        params.define("spaces", Map::new(), ParamType::Mapping)?;
        params.define("lockAttrs", Vec::<Value>::new(), ParamType::Sequence)?;
        params.set_tooltip("spaces", "space label -> target entity")?;
        Ok(())
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let ctl = rig::create_control(
            cx,
            Self::control(core).as_str(),
            &core.control_group(),
            core.params.get_str("controlShape")?,
            core.size()?,
        )?;
        let locked: Vec<String> = core.params.get_as("lockAttrs")?;
        let locked: Vec<&str> = locked.iter().map(String::as_str).collect();
        rig::hide_attributes(cx, &ctl, &locked)?;
        rig::drive_input(cx, &core.name, core.input(0)?, &ctl)?;
        cx.containers
            .set_child_anchor(&mut *cx.scene, &core.container, &ctl)
    }

    fn connect(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let spaces = core.params.get_mapping("spaces")?.clone();
        rig::connect_spaces(core, cx, &Self::control(core), &spaces)?;
        Ok(())
    }
}
