use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ComponentKind};
use crate::component::kinds::limb::{Limb, LimbRig};
use crate::component::lifecycle::ComponentCore;
use crate::component::rig;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

const ROLL_ATTRS: [&str; 3] = ["roll", "bank", "toeTap"];

/// A limb plus foot roll. Inputs are `[hip, thigh, knee, ankle, ball, toe]`.
///
/// Every limb hook is delegated to an owned [`Limb`]; the leg only adds the foot.
#[derive(Debug, Default)]
pub struct Leg {
    limb: Limb,
}

impl ComponentKind for Leg {
    fn type_tag(&self) -> &'static str {
        "leg.leg"
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(6)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        self.limb.define_parameters(params)?;
        params.define("ballAngle", 45.0, ParamType::Float)?;
        params.define("toeStraightAngle", 70.0, ParamType::Float)?;
        Ok(())
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        self.limb.rig_setup(core, cx)?;

        let n = core.name.clone();
        let size = core.size()?;
        let ik = LimbRig::of(core).ik;

        let heel = cx.create_entity(EntityKind::Transform, &format!("{n}_heelPivot"), Some(&ik))?;
        let toe_pivot =
            cx.create_entity(EntityKind::Transform, &format!("{n}_toePivot"), Some(&heel))?;
        let ball_pivot =
            cx.create_entity(EntityKind::Transform, &format!("{n}_ballPivot"), Some(&toe_pivot))?;
        cx.set_attr(&ball_pivot, "angle", core.params.get_float("ballAngle")?)?;
        cx.set_attr(&toe_pivot, "angle", core.params.get_float("toeStraightAngle")?)?;

        let ball = rig::create_control(cx, &format!("{n}_ballFk"), &ball_pivot, "circle", size)?;
        rig::drive_input(cx, &n, core.input(4)?, &ball)?;
        let toe = rig::create_control(cx, &format!("{n}_toeFk"), &ball, "circle", size * 0.8)?;
        rig::drive_input(cx, &n, core.input(5)?, &toe)
    }

    fn setup_anim_attrs(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        self.limb.setup_anim_attrs(core, cx)?;
        let ik: EntityRef = LimbRig::of(core).ik;
        for attr in ROLL_ATTRS {
            rig::add_anim_attr(cx, &ik, attr, 0.0)?;
        }
        Ok(())
    }

    fn connect(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        self.limb.connect(core, cx)
    }

    fn publish_attributes(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        self.limb.publish_attributes(core, cx)
    }
}
