use std::fmt;

use crate::component::context::BuildContext;
use crate::component::lifecycle::ComponentCore;
use crate::component::record::ComponentRecord;
use crate::foundation::core::EntityRef;
use crate::foundation::error::RigResult;
use crate::params::store::{CoercionPolicy, ParameterStore};

/// Number of inputs a kind accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exactly(k) => n == k,
            Self::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(k) => write!(f, "exactly {k}"),
            Self::AtLeast(k) => write!(f, "at least {k}"),
        }
    }
}

/// A child a composite kind wants built inside its own build stage.
pub struct ChildSpec {
    pub record: ComponentRecord,
    pub kind: Box<dyn ComponentKind>,
}

impl fmt::Debug for ChildSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSpec")
            .field("record", &self.record)
            .field("kind", &self.kind.type_tag())
            .finish()
    }
}

/// Override points of one component kind.
///
/// Every hook defaults to a no-op. The lifecycle engine owns ordering, guards, scoping and
/// persistence; a kind only emits its own entities. Hooks receive the component's shared
/// state separately from the kind so a kind can delegate to another kind's hooks (a leg
/// calling into a limb) without inheritance.
#[allow(unused_variables)]
pub trait ComponentKind {
    /// Registry tag, `<family>.<kind>`.
    fn type_tag(&self) -> &'static str;

    fn arity(&self) -> Arity;

    fn version(&self) -> &'static str {
        "1.0"
    }

    /// Policy override for this kind's parameter store; `None` uses the session default.
    fn coercion(&self) -> Option<CoercionPolicy> {
        None
    }

    fn define_parameters(&self, params: &mut ParameterStore) -> RigResult<()> {
        Ok(())
    }

    /// Parameters read in the first hydration pass, before dynamic names are derived.
    fn governing_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    /// Declare parameters whose names depend on governing values or inputs.
    fn define_dynamic(
        &self,
        name: &str,
        inputs: &[EntityRef],
        params: &mut ParameterStore,
    ) -> RigResult<()> {
        Ok(())
    }

    // initialize

    fn set_initial_data(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn create_guides(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    // build

    fn initial_hierarchy(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    /// Children to construct and run to completion during this component's build.
    fn child_specs(
        &self,
        core: &ComponentCore,
        cx: &BuildContext<'_>,
    ) -> RigResult<Vec<ChildSpec>> {
        Ok(Vec::new())
    }

    fn pre_rig_setup(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn rig_setup(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn post_rig_setup(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn setup_anim_attrs(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    // connect

    fn pre_connect(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn connect(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn post_connect(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    // finalize

    fn publish_attributes(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn finalize(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    fn set_control_attributes(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }

    // optimize

    fn optimize(
        &mut self,
        core: &mut ComponentCore,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        Ok(())
    }
}
