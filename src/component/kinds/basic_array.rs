use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ChildSpec, ComponentKind};
use crate::component::kinds::basic::Basic;
use crate::component::lifecycle::ComponentCore;
use crate::component::record::ComponentRecord;
use crate::foundation::core::EntityRef;
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

/// Composite: one `basic.basic` child per input, each named by a `joint{i}Name` parameter.
#[derive(Debug, Default)]
pub struct BasicArray;

pub(crate) fn joint_param(i: usize) -> String {
    format!("joint{i}Name")
}

impl ComponentKind for BasicArray {
    fn type_tag(&self) -> &'static str {
        "basic.basicArray"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define("controlShape", "circle", ParamType::String)
    }

    fn define_dynamic(
        &self,
        name: &str,
        inputs: &[EntityRef],
        params: &mut ParameterStore,
    ) -> RigResult<()> {
        for i in 0..inputs.len() {
            params.define_dynamic(&joint_param(i), format!("{name}_{i}"), ParamType::String)?;
        }
        Ok(())
    }

    fn child_specs(
        &self,
        core: &ComponentCore,
        _cx: &BuildContext<'_>,
    ) -> RigResult<Vec<ChildSpec>> {
        let shape = core.params.get_str("controlShape")?;
        let size = core.size()?;
        core.inputs
            .iter()
            .enumerate()
            .map(|(i, input)| -> RigResult<ChildSpec> {
                let name = core.params.get_str(&joint_param(i))?;
                let record = ComponentRecord::new(name, "basic.basic")
                    .input(input.clone())
                    .rig_parent(core.control_group())
                    .size(size)
                    .param("controlShape", shape);
                Ok(ChildSpec {
                    record,
                    kind: Box::new(Basic),
                })
            })
            .collect()
    }
}
