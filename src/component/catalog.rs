use std::collections::BTreeMap;

use crate::component::kind::ComponentKind;
use crate::component::kinds;
use crate::foundation::error::{RigError, RigResult};

pub type KindFactory = fn() -> Box<dyn ComponentKind>;

/// Type tag to kind constructor.
///
/// Lookups accept the full `<family>.<kind>` tag or, case-insensitively, the final segment.
#[derive(Clone, Debug, Default)]
pub struct ComponentCatalog {
    kinds: BTreeMap<String, KindFactory>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in kind.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register("main.main", || Box::new(kinds::main::Main));
        catalog.register("basic.basic", || Box::new(kinds::basic::Basic));
        catalog.register("basic.basicArray", || Box::new(kinds::basic_array::BasicArray));
        catalog.register("chain.chain", || Box::new(kinds::chain::Chain));
        catalog.register("chain.chainSpline", || Box::new(kinds::chain_spline::ChainSpline));
        catalog.register("limb.limb", || Box::new(kinds::limb::Limb));
        catalog.register("leg.leg", || Box::new(kinds::leg::Leg::default()));
        catalog.register("hand.hand", || Box::new(kinds::hand::Hand));
        catalog
    }

    pub fn register(&mut self, tag: impl Into<String>, factory: KindFactory) {
        self.kinds.insert(tag.into(), factory);
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Canonical tag for `query`.
    pub fn resolve(&self, query: &str) -> RigResult<&str> {
        if let Some((tag, _)) = self.kinds.get_key_value(query) {
            return Ok(tag.as_str());
        }
        let want = query.to_ascii_lowercase();
        let mut hits = self.kinds.keys().filter(|tag| {
            tag.rsplit('.')
                .next()
                .is_some_and(|last| last.to_ascii_lowercase() == want)
        });
        match (hits.next(), hits.next()) {
            (Some(tag), None) => Ok(tag.as_str()),
            (Some(a), Some(b)) => Err(RigError::construction(format!(
                "component type '{query}' is ambiguous: '{a}' or '{b}'"
            ))),
            (None, _) => Err(RigError::construction(format!(
                "unknown component type '{query}'"
            ))),
        }
    }

    pub fn instantiate(&self, query: &str) -> RigResult<Box<dyn ComponentKind>> {
        let tag = self.resolve(query)?;
        let factory = self.kinds.get(tag).ok_or_else(|| {
            RigError::construction(format!("unknown component type '{query}'"))
        })?;
        Ok(factory())
    }
}
