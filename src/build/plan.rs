use std::collections::{BTreeMap, BTreeSet};

use crate::component::catalog::ComponentCatalog;
use crate::component::record::ComponentRecord;
use crate::foundation::error::{RigError, RigResult};

const MAIN_TAG: &str = "main.main";

/// Build order over a set of records plus the dependencies that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildPlan {
    /// Indices into the planned records.
    pub order: Vec<usize>,
    /// Component name -> names it depends on.
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl BuildPlan {
    pub fn names<'a>(&self, records: &'a [ComponentRecord]) -> Vec<&'a str> {
        self.order.iter().map(|&i| records[i].name.as_str()).collect()
    }
}

/// Longest component name that `reference` points into: equal to it or prefixed by `name_`.
fn owner_of<'a>(reference: &str, names: &[&'a str], this: &str) -> Option<&'a str> {
    names
        .iter()
        .copied()
        .filter(|n| *n != this)
        .filter(|n| {
            reference == *n
                || reference
                    .strip_prefix(n)
                    .is_some_and(|rest| rest.starts_with('_'))
        })
        .max_by_key(|n| n.len())
}

/// Order records so every component comes after the components it references.
///
/// A record depends on another when its rig parent or an input names that component or one
/// of its entities (`<other>_...`), or when it lists it in `dependsOn`. Among ready records
/// `main.main` goes first, then declaration order.
pub fn plan(records: &[ComponentRecord], catalog: &ComponentCatalog) -> RigResult<BuildPlan> {
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let mut seen = BTreeSet::new();
    for n in &names {
        if !seen.insert(*n) {
            return Err(RigError::duplicate_name(format!(
                "component '{n}' is declared more than once"
            )));
        }
    }

    let mut is_main = Vec::with_capacity(records.len());
    let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for r in records {
        is_main.push(catalog.resolve(&r.type_tag)? == MAIN_TAG);

        let mut deps = BTreeSet::new();
        let refs = r.rig_parent.iter().chain(r.inputs.iter());
        for reference in refs {
            if let Some(owner) = owner_of(reference.as_str(), &names, &r.name) {
                deps.insert(owner.to_owned());
            }
        }
        for d in &r.depends_on {
            if !seen.contains(d.as_str()) {
                return Err(RigError::construction(format!(
                    "component '{}' depends on unknown component '{d}'",
                    r.name
                )));
            }
            if d != &r.name {
                deps.insert(d.clone());
            }
        }
        dependencies.insert(r.name.clone(), deps);
    }

    let mut placed = vec![false; records.len()];
    let mut done: BTreeSet<&str> = BTreeSet::new();
    let mut order = Vec::with_capacity(records.len());
    while order.len() < records.len() {
        let ready = |i: usize| {
            !placed[i]
                && dependencies[&records[i].name]
                    .iter()
                    .all(|d| done.contains(d.as_str()))
        };
        let next = (0..records.len())
            .find(|&i| is_main[i] && ready(i))
            .or_else(|| (0..records.len()).find(|&i| ready(i)));
        let Some(i) = next else {
            let stuck: Vec<&str> = (0..records.len())
                .filter(|&i| !placed[i])
                .map(|i| names[i])
                .collect();
            return Err(RigError::construction(format!(
                "dependency cycle between components: {}",
                stuck.join(", ")
            )));
        };
        placed[i] = true;
        done.insert(names[i]);
        order.push(i);
    }

    Ok(BuildPlan {
        order,
        dependencies,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/build/plan.rs"]
mod tests;
