//! Shared building blocks for component kinds.

use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::component::context::BuildContext;
use crate::component::lifecycle::ComponentCore;
use crate::foundation::core::{EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::scene::{
    DRIVEN_BY_ATTR, SceneGraph, TRANSFORM_ATTRS, lock_attributes, locked_attributes,
    unlock_attributes,
};

/// Tag carried by every animator-facing control.
pub const CONTROL_TAG: &str = "control";
/// Attributes locked and hidden on a control at finalize.
pub const HIDDEN_ATTRS: &str = "hiddenAttrs";
pub const HISTORY_ATTR: &str = "history";
pub const VISIBILITY_ATTR: &str = "v";
/// Attribute on an input joint naming the control that drives it.
pub const DRIVER_ATTR: &str = "driver";
/// Locks an input carried before its first driver took it over.
pub const PRE_LOCKED_ATTR: &str = "preLocked";

/// `<name>_cmpt` with `_params`, `_control` and `_spaces` groups, transforms and visibility
/// locked. The root becomes the container's parent anchor, the control group its child anchor.
pub fn create_base_hierarchy(core: &ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
    let root = cx.create_entity(EntityKind::Transform, core.root().as_str(), None)?;
    cx.set_attr(&root, "size", core.size()?)?;
    for group in [core.params_group(), core.control_group(), core.spaces_group()] {
        let g = cx.create_entity(EntityKind::Transform, group.as_str(), Some(&root))?;
        lock_attributes(cx.scene_mut(), &g, &["t", "r", "s", VISIBILITY_ATTR])?;
    }
    cx.containers
        .set_parent_anchor(&mut *cx.scene, &core.container, &root)?;
    cx.containers
        .set_child_anchor(&mut *cx.scene, &core.container, &core.control_group())?;
    Ok(())
}

/// A control transform with a shape child, tagged [`CONTROL_TAG`].
pub fn create_control(
    cx: &mut BuildContext<'_>,
    name: &str,
    parent: &EntityRef,
    shape: &str,
    size: f64,
) -> RigResult<EntityRef> {
    let ctl = cx.create_entity(EntityKind::Control, name, Some(parent))?;
    let shape_node = cx.create_entity(EntityKind::Shape, &format!("{name}Shape"), Some(&ctl))?;
    cx.set_attr(&shape_node, "shape", shape)?;
    cx.set_attr(&shape_node, "size", size)?;
    cx.set_attr(&ctl, HIDDEN_ATTRS, json!([VISIBILITY_ATTR]))?;
    cx.tag(&ctl, CONTROL_TAG)?;
    Ok(ctl)
}

pub fn hide_attributes(
    cx: &mut BuildContext<'_>,
    ctl: &EntityRef,
    attrs: &[&str],
) -> RigResult<()> {
    let mut hidden: Vec<String> = cx
        .get_attr(ctl, HIDDEN_ATTRS)?
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    for a in attrs {
        if !hidden.iter().any(|h| h == a) {
            hidden.push((*a).to_owned());
        }
    }
    cx.set_attr(ctl, HIDDEN_ATTRS, json!(hidden))
}

/// Keyable float attribute on `entity`, kept if already present.
pub fn add_anim_attr(
    cx: &mut BuildContext<'_>,
    entity: &EntityRef,
    attr: &str,
    default: f64,
) -> RigResult<()> {
    if cx.get_attr(entity, attr)?.is_none() {
        cx.set_attr(entity, attr, default)?;
    }
    Ok(())
}

/// Mark an input joint as driven by `driver`, locking its transforms.
pub fn drive_input(
    cx: &mut BuildContext<'_>,
    component: &str,
    input: &EntityRef,
    driver: &EntityRef,
) -> RigResult<()> {
    cx.require(input, "input")?;
    match cx.get_attr(input, DRIVEN_BY_ATTR)? {
        Some(Value::String(owner)) if owner == component => {}
        Some(Value::String(owner)) => {
            return Err(RigError::scene(format!(
                "input '{input}' is already driven by component '{owner}'"
            )));
        }
        _ => {
            let prior = locked_attributes(cx.scene(), input)?;
            cx.set_attr(input, PRE_LOCKED_ATTR, json!(prior))?;
        }
    }
    cx.set_attr(input, DRIVEN_BY_ATTR, component)?;
    cx.set_attr(input, DRIVER_ATTR, driver.as_str())?;
    lock_attributes(cx.scene_mut(), input, &TRANSFORM_ATTRS)
}

/// Undo [`drive_input`] if `component` is still the driver. Returns whether anything changed.
///
/// Transform locks the input already had before it was driven stay in place.
pub fn release_input(
    cx: &mut BuildContext<'_>,
    component: &str,
    input: &EntityRef,
) -> RigResult<bool> {
    if !cx.scene.exists(input.as_str()) {
        return Ok(false);
    }
    match cx.get_attr(input, DRIVEN_BY_ATTR)? {
        Some(Value::String(owner)) if owner == component => {}
        _ => return Ok(false),
    }
    let prior: Vec<String> = cx
        .get_attr(input, PRE_LOCKED_ATTR)?
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let released: Vec<&str> = TRANSFORM_ATTRS
        .into_iter()
        .filter(|a| !prior.iter().any(|p| p == a))
        .collect();
    unlock_attributes(cx.scene_mut(), input, &released)?;
    cx.set_attr(input, DRIVEN_BY_ATTR, Value::Null)?;
    cx.set_attr(input, DRIVER_ATTR, Value::Null)?;
    cx.set_attr(input, PRE_LOCKED_ATTR, Value::Null)?;
    Ok(true)
}

/// Joints from `start` down to `end`, inclusive.
pub fn joint_chain<S: SceneGraph + ?Sized>(
    scene: &S,
    start: &EntityRef,
    end: &EntityRef,
) -> RigResult<Vec<EntityRef>> {
    for e in [start, end] {
        if !scene.exists(e.as_str()) {
            return Err(RigError::missing_input(format!("joint '{e}' does not exist")));
        }
    }
    let mut chain = vec![end.clone()];
    let mut cur = end.clone();
    while &cur != start {
        match scene.parent_of(&cur) {
            Some(p) => {
                chain.push(p.clone());
                cur = p;
            }
            None => {
                return Err(RigError::missing_input(format!(
                    "'{end}' is not a descendant of '{start}'"
                )));
            }
        }
    }
    chain.reverse();
    Ok(chain)
}

/// Follow the first joint child of `start` until a leaf.
pub fn chain_end<S: SceneGraph + ?Sized>(scene: &S, start: &EntityRef) -> RigResult<EntityRef> {
    let mut cur = start.clone();
    loop {
        let next = scene
            .list_children(&cur)?
            .into_iter()
            .find(|c| scene.kind_of(c) == Some(EntityKind::Joint));
        match next {
            Some(n) => cur = n,
            None => return Ok(cur),
        }
    }
}

/// One constraint per named space target, under the component's spaces group.
///
/// `spaces` maps a label to a target entity. The labels are stored on the control in order.
pub fn connect_spaces(
    core: &ComponentCore,
    cx: &mut BuildContext<'_>,
    control: &EntityRef,
    spaces: &Map<String, Value>,
) -> RigResult<Vec<EntityRef>> {
    if spaces.is_empty() {
        return Ok(Vec::new());
    }
    let mut labels = Vec::new();
    let mut out = Vec::new();
    for (label, target) in spaces {
        let target = target.as_str().ok_or_else(|| {
            RigError::parameter_type(format!("space '{label}' target must be a string"))
        })?;
        let target = EntityRef::new(target);
        cx.require(&target, "space target")?;
        let cns = cx.create_entity(
            EntityKind::Constraint,
            &format!("{control}_{label}_space"),
            Some(&core.spaces_group()),
        )?;
        cx.set_attr(&cns, "driver", target.as_str())?;
        cx.set_attr(&cns, "driven", control.as_str())?;
        labels.push(label.clone());
        out.push(cns);
    }
    cx.set_attr(control, "spaces", json!(labels))?;
    add_anim_attr(cx, control, "space", 0.0)?;
    Ok(out)
}

/// Constrain the component root to its `rigParent`, if one is set.
pub fn connect_rig_parent(core: &ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
    let Some(parent) = core.rig_parent()? else {
        return Ok(());
    };
    cx.require(&parent, "rigParent")?;
    let anchor = cx
        .containers
        .get(&core.container)
        .and_then(|c| c.parent_anchor.clone())
        .unwrap_or_else(|| core.root());
    let cns = cx.create_entity(
        EntityKind::Constraint,
        &format!("{}_rigParent_cns", core.name),
        Some(&core.root()),
    )?;
    cx.set_attr(&cns, "driver", parent.as_str())?;
    cx.set_attr(&cns, "driven", anchor.as_str())?;
    tracing::debug!(component = %core.name, rig_parent = %parent, "attached to rig parent");
    Ok(())
}

/// Publish every control owned by this container or a nested one.
pub fn publish_controls(core: &ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<usize> {
    let mut owned = BTreeSet::new();
    let mut pending = vec![core.container.clone()];
    while let Some(c) = pending.pop() {
        if let Some(container) = cx.containers.get(&c) {
            pending.extend(container.nested.iter().cloned());
        }
        owned.insert(c);
    }
    let controls: Vec<EntityRef> = cx
        .scene
        .get_tagged(CONTROL_TAG)
        .into_iter()
        .filter(|e| {
            cx.containers
                .container_of(e)
                .is_some_and(|c| owned.contains(c))
        })
        .collect();
    for ctl in &controls {
        cx.containers
            .publish_node(&mut *cx.scene, &core.container, ctl)?;
    }
    Ok(controls.len())
}

/// Lock the hidden attributes of every control published on the container.
pub fn lock_control_attributes(core: &ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
    let published: Vec<EntityRef> = cx
        .containers
        .get(&core.container)
        .map(|c| c.published.iter().cloned().collect())
        .unwrap_or_default();
    for ctl in published {
        if !cx.scene.exists(ctl.as_str()) {
            continue;
        }
        let hidden: Vec<String> = cx
            .get_attr(&ctl, HIDDEN_ATTRS)?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let hidden: Vec<&str> = hidden.iter().map(String::as_str).collect();
        lock_attributes(cx.scene_mut(), &ctl, &hidden)?;
    }
    Ok(())
}

pub fn remove_guides(core: &ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<()> {
    let guide = core.guide_root();
    if !cx.scene.exists(guide.as_str()) {
        return Ok(());
    }
    let mut doomed = vec![guide.clone()];
    doomed.extend(cx.scene.list_children(&guide)?);
    cx.containers
        .remove_entities(&mut *cx.scene, &core.container, &doomed)?;
    cx.scene.delete_entities(&[guide])
}

/// Drop construction history from every member that still exists.
pub fn clear_history(core: &ComponentCore, cx: &mut BuildContext<'_>) -> RigResult<usize> {
    let members = cx.containers.members(&core.container)?;
    let mut cleared = 0usize;
    for m in members {
        if cx.scene.exists(m.as_str()) && cx.get_attr(&m, HISTORY_ATTR)?.is_some() {
            cx.set_attr(&m, HISTORY_ATTR, Value::Null)?;
            cleared += 1;
        }
    }
    Ok(cleared)
}
