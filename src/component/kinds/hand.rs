use crate::component::context::BuildContext;
use crate::component::kind::{Arity, ChildSpec, ComponentKind};
use crate::component::kinds::chain::Chain;
use crate::component::lifecycle::ComponentCore;
use crate::component::record::ComponentRecord;
use crate::component::rig;
use crate::foundation::error::RigResult;
use crate::params::store::{ParamType, ParameterStore};

/// Composite: one `chain.chain` per finger root input.
///
/// Fingers run their whole pipeline inside the hand's build; afterwards their controls are
/// moved under the hand's control group and their containers are emptied into the hand's.
#[derive(Debug, Default)]
pub struct Hand;

impl ComponentKind for Hand {
    fn type_tag(&self) -> &'static str {
        "hand.hand"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        params.define("controlShape", "circle", ParamType::String)
    }

    fn child_specs(
        &self,
        core: &ComponentCore,
        cx: &BuildContext<'_>,
    ) -> RigResult<Vec<ChildSpec>> {
        let shape = core.params.get_str("controlShape")?;
        let size = core.size()?;
        let mut specs = Vec::with_capacity(core.inputs.len());
        for finger in &core.inputs {
            let end = rig::chain_end(cx.scene(), finger)?;
            let record = ComponentRecord::new(format!("{}_{finger}", core.name), "chain.chain")
                .inputs([finger.clone(), end])
                .rig_parent(core.control_group())
                .size(size * 0.5)
                .param("controlShape", shape);
            specs.push(ChildSpec {
                record,
                kind: Box::new(Chain),
            });
        }
        Ok(specs)
    }

    fn rig_setup(&mut self, core: &mut ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let hand_controls = core.control_group();
        let children: Vec<_> = core
            .children
            .iter()
            .map(|c| (c.container().to_owned(), c.core().root(), c.core().control_group()))
            .collect();

        for (container, root, controls) in children {
            if !cx.scene.exists(root.as_str()) {
                continue;
            }
            for ctl in cx.scene.list_children(&controls)? {
                cx.scene.reparent(&ctl, Some(&hand_controls))?;
            }
            cx.containers
                .absorb(&mut *cx.scene, &container, &core.container, Some(&root))?;
        }
        Ok(())
    }
}
