use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::component::catalog::ComponentCatalog;
use crate::component::context::BuildContext;
use crate::component::kind::{ChildSpec, ComponentKind};
use crate::component::record::ComponentRecord;
use crate::component::rig;
use crate::container::SUB_COMPONENT_TAG;
use crate::container::metadata::ContainerMetadata;
use crate::container::registry::ContainerRegistry;
use crate::foundation::core::{BuildStage, EntityKind, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::params::store::{ParamType, ParameterStore};

/// Parameters every component carries regardless of kind.
pub const CORE_PARAMETERS: [&str; 4] = ["size", "rigParent", "componentTag", "enabled"];

/// Result of invoking one stage method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Ran,
    /// The component had already reached the stage.
    Skipped,
    Disabled,
}

/// Best-effort teardown result. Failures are collected, never raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Containers deleted, innermost first.
    pub containers: Vec<String>,
    pub restored_inputs: Vec<EntityRef>,
    pub warnings: Vec<String>,
}

impl TeardownReport {
    fn merge(&mut self, other: TeardownReport) {
        self.containers.extend(other.containers);
        self.restored_inputs.extend(other.restored_inputs);
        self.warnings.extend(other.warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// State shared by every component kind: identity, inputs, parameters, progress, children.
#[derive(Debug)]
pub struct ComponentCore {
    pub name: String,
    pub type_tag: String,
    pub version: String,
    pub inputs: Vec<EntityRef>,
    pub depends_on: Vec<String>,
    pub params: ParameterStore,
    /// Name of the owned container entity.
    pub container: String,
    pub stage: BuildStage,
    pub children: Vec<Component>,
}

impl ComponentCore {
    pub fn root(&self) -> EntityRef {
        EntityRef::new(format!("{}_cmpt", self.name))
    }

    pub fn params_group(&self) -> EntityRef {
        EntityRef::new(format!("{}_params", self.name))
    }

    pub fn control_group(&self) -> EntityRef {
        EntityRef::new(format!("{}_control", self.name))
    }

    pub fn spaces_group(&self) -> EntityRef {
        EntityRef::new(format!("{}_spaces", self.name))
    }

    pub fn guide_root(&self) -> EntityRef {
        EntityRef::new(format!("{}_guide", self.name))
    }

    pub fn size(&self) -> RigResult<f64> {
        self.params.get_float("size")
    }

    pub fn rig_parent(&self) -> RigResult<Option<EntityRef>> {
        let p = self.params.get_str("rigParent")?;
        Ok((!p.is_empty()).then(|| EntityRef::new(p)))
    }

    pub fn component_tag(&self) -> RigResult<Option<String>> {
        let t = self.params.get_str("componentTag")?;
        Ok((!t.is_empty()).then(|| t.to_owned()))
    }

    pub fn enabled(&self) -> RigResult<bool> {
        self.params.get_bool("enabled")
    }

    pub fn input(&self, i: usize) -> RigResult<&EntityRef> {
        self.inputs.get(i).ok_or_else(|| {
            RigError::construction(format!("component '{}' has no input {i}", self.name))
        })
    }

    /// Parameter values plus the protected identity keys, as stored in metadata.
    fn persisted_parameters(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("name".to_owned(), Value::from(self.name.clone()));
        out.insert("type".to_owned(), Value::from(self.type_tag.clone()));
        out.insert(
            "input".to_owned(),
            Value::from(
                self.inputs
                    .iter()
                    .map(|e| Value::from(e.as_str()))
                    .collect::<Vec<_>>(),
            ),
        );
        out.extend(self.params.dump());
        out
    }

    fn metadata(&self, stage: BuildStage) -> ContainerMetadata {
        let mut meta = ContainerMetadata::new(self.type_tag.clone(), self.version.clone());
        meta.stage = stage;
        meta.parameters = self.persisted_parameters();
        meta
    }
}

/// One node of the build tree.
///
/// Stage methods are forward-only and guarded: a stage already reached returns
/// [`StageOutcome::Skipped`] without touching the scene. A failed stage leaves `stage`
/// unchanged and whatever it created in place; the retry re-runs the stage from scratch.
///
/// A stage runs only from the stage directly below it, so the container exists before
/// anything reaches `Initialized`. Skipping ahead is a [`RigError::Stage`].
pub struct Component {
    core: ComponentCore,
    kind: Box<dyn ComponentKind>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.core.name)
            .field("type", &self.core.type_tag)
            .field("stage", &self.core.stage)
            .field("children", &self.core.children)
            .finish()
    }
}

impl Component {
    /// Construct from a record, resolving the kind through `catalog`.
    pub fn new(
        catalog: &ComponentCatalog,
        record: ComponentRecord,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Self> {
        let kind = catalog.instantiate(&record.type_tag)?;
        Self::with_kind(record, kind, cx)
    }

    /// Construct with an explicit kind. Creates no entities.
    ///
    /// Validates name and input arity, claims the name for this session and adopts an
    /// existing container of the same name so a persisted build can resume.
    pub fn with_kind(
        record: ComponentRecord,
        kind: Box<dyn ComponentKind>,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Self> {
        let name = record.name.trim().to_owned();
        if name.is_empty() {
            return Err(RigError::construction("component name must be non-empty"));
        }
        let arity = kind.arity();
        if !arity.accepts(record.inputs.len()) {
            return Err(RigError::construction(format!(
                "component '{name}' ({}) takes {arity} inputs, got {}",
                kind.type_tag(),
                record.inputs.len()
            )));
        }

        let mut params = ParameterStore::new(kind.coercion().unwrap_or(cx.coercion()));
        params.define("size", record.size, ParamType::Float)?;
        params.define("rigParent", "", ParamType::String)?;
        params.define("componentTag", "", ParamType::String)?;
        params.define("enabled", true, ParamType::Bool)?;
        kind.define_parameters(&mut params)?;

        params.load_only(&record.parameters, kind.governing_parameters())?;
        kind.define_dynamic(&name, &record.inputs, &mut params)?;
        params.load_from(&record.parameters)?;

        params.set("size", record.size)?;
        params.set("enabled", record.enabled)?;
        if let Some(p) = &record.rig_parent {
            params.set("rigParent", p.as_str())?;
        }
        if let Some(t) = &record.component_tag {
            params.set("componentTag", t.as_str())?;
        }

        let container = format!("{name}_container");
        let mut stage = BuildStage::Unbuilt;
        if cx.scene.exists(&container) {
            if cx.scene.kind_of(&EntityRef::new(&container)) != Some(EntityKind::Container) {
                return Err(RigError::duplicate_name(format!(
                    "'{container}' exists and is not a container"
                )));
            }
            if let Some(meta) = ContainerRegistry::read_metadata(cx.scene(), &container)? {
                if meta.type_tag != kind.type_tag() {
                    return Err(RigError::construction(format!(
                        "container '{container}' was built by {}, not {}",
                        meta.type_tag,
                        kind.type_tag()
                    )));
                }
                stage = meta.stage;
            }
        }

        cx.containers.claim(&name)?;
        if cx.scene.exists(&container) {
            if let Err(e) = cx.containers.adopt(&mut *cx.scene, &container) {
                cx.containers.release(&name);
                return Err(e);
            }
            tracing::info!(component = %name, %stage, "resuming from existing container");
        }

        let mut component = Self {
            core: ComponentCore {
                type_tag: kind.type_tag().to_owned(),
                version: kind.version().to_owned(),
                inputs: record.inputs,
                depends_on: record.depends_on,
                name,
                params,
                container,
                stage,
                children: Vec::new(),
            },
            kind,
        };

        if component.core.stage >= BuildStage::Built
            && let Err(e) = component.restore_children(cx)
        {
            component.release_claims(&mut cx.containers);
            return Err(e);
        }
        Ok(component)
    }

    /// Rebuild a component purely from a container's durable metadata.
    pub fn from_container(
        catalog: &ComponentCatalog,
        cx: &mut BuildContext<'_>,
        container: &str,
    ) -> RigResult<Self> {
        let meta = ContainerRegistry::read_metadata(cx.scene(), container)?.ok_or_else(|| {
            RigError::missing_input(format!("'{container}' carries no component metadata"))
        })?;
        let record = record_from_parameters(&meta.type_tag, &meta.parameters)?;
        Self::new(catalog, record, cx)
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn type_tag(&self) -> &str {
        &self.core.type_tag
    }

    pub fn stage(&self) -> BuildStage {
        self.core.stage
    }

    pub fn container(&self) -> &str {
        &self.core.container
    }

    pub fn inputs(&self) -> &[EntityRef] {
        &self.core.inputs
    }

    pub fn depends_on(&self) -> &[String] {
        &self.core.depends_on
    }

    pub fn params(&self) -> &ParameterStore {
        &self.core.params
    }

    pub fn children(&self) -> &[Component] {
        &self.core.children
    }

    pub fn core(&self) -> &ComponentCore {
        &self.core
    }

    pub fn is_enabled(&self) -> bool {
        self.core.enabled().unwrap_or(true)
    }

    pub fn rig_parent(&self) -> Option<EntityRef> {
        self.core.rig_parent().ok().flatten()
    }

    /// Set a parameter and write it through to the container metadata if it exists.
    ///
    /// A governing value the kind rejects leaves the store as it was.
    pub fn set_parameter(
        &mut self,
        cx: &mut BuildContext<'_>,
        name: &str,
        value: impl Into<Value>,
    ) -> RigResult<()> {
        let mut staged = self.core.params.clone();
        staged.set(name, value)?;
        if self.kind.governing_parameters().contains(&name) {
            let source = staged.dump();
            self.derive_dynamic(&mut staged, &source)?;
        }
        self.core.params = staged;
        if cx.containers.is_registered(&self.core.container) {
            let meta = self.core.metadata(self.core.stage);
            cx.containers
                .write_metadata(&mut *cx.scene, &self.core.container, &meta)?;
        }
        Ok(())
    }

    /// The declarative record that would reproduce this component.
    pub fn record(&self) -> ComponentRecord {
        let mut parameters = self.core.params.dump();
        for k in CORE_PARAMETERS {
            parameters.remove(k);
        }
        ComponentRecord {
            name: self.core.name.clone(),
            type_tag: self.core.type_tag.clone(),
            inputs: self.core.inputs.clone(),
            size: self.core.size().unwrap_or(1.0),
            rig_parent: self.rig_parent(),
            component_tag: self.core.component_tag().ok().flatten(),
            enabled: self.is_enabled(),
            depends_on: self.core.depends_on.clone(),
            parameters,
        }
    }

    /// Human-readable parameter listing.
    pub fn help(&self) -> String {
        let mut out = format!(
            "{} ({} v{}, {})\n",
            self.core.name, self.core.type_tag, self.core.version, self.core.stage
        );
        for p in self.core.params.iter() {
            let _ = write!(out, "  {:<24} {:<8} = {}", p.name, p.ty.to_string(), p.value);
            if p.dynamic {
                out.push_str("  [dynamic]");
            }
            if let Some(t) = &p.tooltip {
                let _ = write!(out, "  # {t}");
            }
            out.push('\n');
        }
        out
    }

    pub fn initialize(&mut self, cx: &mut BuildContext<'_>) -> RigResult<StageOutcome> {
        self.run_stage(BuildStage::Initialized, cx, Self::initialize_body)
    }

    pub fn build(&mut self, cx: &mut BuildContext<'_>) -> RigResult<StageOutcome> {
        self.run_stage(BuildStage::Built, cx, Self::build_body)
    }

    pub fn connect(&mut self, cx: &mut BuildContext<'_>) -> RigResult<StageOutcome> {
        self.run_stage(BuildStage::Connected, cx, Self::connect_body)
    }

    pub fn finalize(&mut self, cx: &mut BuildContext<'_>) -> RigResult<StageOutcome> {
        self.run_stage(BuildStage::Finalized, cx, Self::finalize_body)
    }

    pub fn optimize(&mut self, cx: &mut BuildContext<'_>) -> RigResult<StageOutcome> {
        self.run_stage(BuildStage::Optimized, cx, Self::optimize_body)
    }

    /// Run a single stage by target.
    pub fn run_to(
        &mut self,
        stage: BuildStage,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<StageOutcome> {
        match stage {
            BuildStage::Unbuilt => Ok(StageOutcome::Skipped),
            BuildStage::Initialized => self.initialize(cx),
            BuildStage::Built => self.build(cx),
            BuildStage::Connected => self.connect(cx),
            BuildStage::Finalized => self.finalize(cx),
            BuildStage::Optimized => self.optimize(cx),
        }
    }

    /// All five stages back to back. Stops at the first error.
    pub fn run_all(
        &mut self,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Vec<(BuildStage, StageOutcome)>> {
        let mut outcomes = Vec::with_capacity(5);
        for stage in &BuildStage::ALL[1..] {
            outcomes.push((*stage, self.run_to(*stage, cx)?));
        }
        Ok(outcomes)
    }

    /// Delete everything this component produced, children first, and restore its inputs.
    ///
    /// Best-effort: failures are logged and collected in the report, never raised.
    pub fn teardown(&mut self, cx: &mut BuildContext<'_>) -> TeardownReport {
        let mut report = TeardownReport::default();
        for mut child in std::mem::take(&mut self.core.children).into_iter().rev() {
            report.merge(child.teardown(cx));
            cx.containers.release(child.name());
        }

        match cx.containers.delete(&mut *cx.scene, &self.core.container) {
            Ok(deleted) => report.containers.extend(deleted),
            Err(e) => {
                tracing::warn!(component = %self.core.name, error = %e, "container delete failed");
                report.warnings.push(e.to_string());
            }
        }

        for input in &self.core.inputs {
            match rig::release_input(cx, &self.core.name, input) {
                Ok(true) => report.restored_inputs.push(input.clone()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        component = %self.core.name,
                        %input,
                        error = %e,
                        "input restore failed"
                    );
                    report.warnings.push(e.to_string());
                }
            }
        }

        self.core.stage = BuildStage::Unbuilt;
        tracing::info!(component = %self.core.name, "torn down");
        report
    }

    fn run_stage(
        &mut self,
        target: BuildStage,
        cx: &mut BuildContext<'_>,
        body: fn(&mut Self, &mut BuildContext<'_>) -> RigResult<()>,
    ) -> RigResult<StageOutcome> {
        let name = self.core.name.clone();
        if self.core.stage >= target {
            tracing::debug!(component = %name, stage = %target, "stage already reached, skipping");
            return Ok(StageOutcome::Skipped);
        }
        if !self.core.enabled()? {
            tracing::debug!(component = %name, stage = %target, "component disabled");
            return Ok(StageOutcome::Disabled);
        }
        if target.previous() != Some(self.core.stage) {
            return Err(RigError::stage(format!(
                "cannot {target} '{name}': it is at {}, expected {}",
                self.core.stage,
                target.previous().unwrap_or_default()
            )));
        }

        self.rehydrate(cx)?;
        tracing::info!(component = %name, stage = %target, "running stage");
        body(self, cx)?;

        let meta = self.core.metadata(target);
        cx.containers
            .write_metadata(&mut *cx.scene, &self.core.container, &meta)?;
        self.core.stage = target;
        Ok(StageOutcome::Ran)
    }

    /// Reload parameters from the durable metadata in two passes: governing values first,
    /// then everything else once dynamic names exist.
    fn rehydrate(&mut self, cx: &BuildContext<'_>) -> RigResult<()> {
        let source = match ContainerRegistry::read_metadata(cx.scene(), &self.core.container)? {
            Some(meta) => meta.parameters,
            None => self.core.params.dump(),
        };
        let mut staged = self.core.params.clone();
        staged.load_only(&source, self.kind.governing_parameters())?;
        self.derive_dynamic(&mut staged, &source)?;
        self.core.params = staged;
        Ok(())
    }

    fn derive_dynamic(
        &self,
        params: &mut ParameterStore,
        source: &Map<String, Value>,
    ) -> RigResult<()> {
        params.clear_dynamic();
        self.kind
            .define_dynamic(&self.core.name, &self.core.inputs, params)?;
        params.load_from(source)?;
        Ok(())
    }

    /// Give back this component's session name and those of its children.
    pub(crate) fn release_claims(&self, containers: &mut ContainerRegistry) {
        for child in &self.core.children {
            child.release_claims(containers);
        }
        containers.release(&self.core.name);
    }

    fn initialize_body(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let arity = self.kind.arity();
        if !arity.accepts(self.core.inputs.len()) {
            return Err(RigError::construction(format!(
                "component '{}' takes {arity} inputs, got {}",
                self.core.name,
                self.core.inputs.len()
            )));
        }
        for input in &self.core.inputs {
            cx.require(input, "input")?;
        }
        if !cx.containers.is_registered(&self.core.container) {
            cx.containers.create(&mut *cx.scene, &self.core.container)?;
        }

        let _active = cx.scope.enter(self.core.container.clone());
        self.kind.set_initial_data(&mut self.core, cx)?;
        cx.create_entity(EntityKind::Guide, self.core.guide_root().as_str(), None)?;
        self.kind.create_guides(&mut self.core, cx)
    }

    fn build_body(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let _active = cx.scope.enter(self.core.container.clone());
        rig::create_base_hierarchy(&self.core, cx)?;
        self.kind.initial_hierarchy(&mut self.core, cx)?;

        let specs = self.kind.child_specs(&self.core, cx)?;
        self.spawn_children(specs, cx)?;

        self.kind.pre_rig_setup(&mut self.core, cx)?;
        self.build_children(cx)?;
        self.kind.rig_setup(&mut self.core, cx)?;
        self.kind.post_rig_setup(&mut self.core, cx)?;
        self.kind.setup_anim_attrs(&mut self.core, cx)
    }

    fn connect_body(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let _active = cx.scope.enter(self.core.container.clone());
        self.kind.pre_connect(&mut self.core, cx)?;
        rig::connect_rig_parent(&self.core, cx)?;
        self.kind.connect(&mut self.core, cx)?;
        self.kind.post_connect(&mut self.core, cx)
    }

    fn finalize_body(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let _active = cx.scope.enter(self.core.container.clone());
        self.kind.publish_attributes(&mut self.core, cx)?;
        rig::publish_controls(&self.core, cx)?;
        self.kind.finalize(&mut self.core, cx)?;
        rig::remove_guides(&self.core, cx)?;
        rig::lock_control_attributes(&self.core, cx)?;
        self.kind.set_control_attributes(&mut self.core, cx)?;
        if let Some(tag) = self.core.component_tag()? {
            cx.tag(&EntityRef::new(&self.core.container), &tag)?;
        }
        Ok(())
    }

    fn optimize_body(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let _active = cx.scope.enter(self.core.container.clone());
        self.kind.optimize(&mut self.core, cx)?;
        let cleared = rig::clear_history(&self.core, cx)?;
        tracing::debug!(component = %self.core.name, cleared, "history cleared");
        for child in &mut self.core.children {
            child.optimize(cx)?;
        }
        Ok(())
    }

    /// A resumed composite gets its children back from their own containers.
    fn restore_children(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        self.rehydrate(cx)?;
        let specs = self.kind.child_specs(&self.core, cx)?;
        self.spawn_children(specs, cx)
    }

    /// Construct children the kind asks for that do not exist yet.
    fn spawn_children(
        &mut self,
        specs: Vec<ChildSpec>,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<()> {
        for spec in specs {
            if self.core.children.iter().any(|c| c.name() == spec.record.name) {
                continue;
            }
            let child = Component::with_kind(spec.record, spec.kind, cx)?;
            self.core.children.push(child);
        }
        Ok(())
    }

    /// Each child runs its whole pipeline here, inside this component's build stage.
    fn build_children(&mut self, cx: &mut BuildContext<'_>) -> RigResult<()> {
        let parent_container = self.core.container.clone();
        let parent_root = self.core.root();
        for child in &mut self.core.children {
            child.run_all(cx)?;
            if !cx.containers.is_registered(&child.core.container) {
                continue;
            }
            cx.containers
                .nest(&mut *cx.scene, &parent_container, &child.core.container)?;
            cx.scene
                .tag(&EntityRef::new(&child.core.container), SUB_COMPONENT_TAG)?;
            let child_root = child.core.root();
            if cx.scene.exists(child_root.as_str())
                && cx.scene.parent_of(&child_root).is_none()
            {
                cx.scene.reparent(&child_root, Some(&parent_root))?;
            }
        }
        Ok(())
    }
}

/// Recover a record from persisted parameters, inverse of what stages write.
pub(crate) fn record_from_parameters(
    type_tag: &str,
    params: &Map<String, Value>,
) -> RigResult<ComponentRecord> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RigError::persist("metadata has no component name"))?;
    let mut record = ComponentRecord::new(name, type_tag);
    if let Some(inputs) = params.get("input").and_then(Value::as_array) {
        record.inputs = inputs
            .iter()
            .filter_map(Value::as_str)
            .map(EntityRef::new)
            .collect();
    }
    if let Some(size) = params.get("size").and_then(Value::as_f64) {
        record.size = size;
    }
    if let Some(enabled) = params.get("enabled").and_then(Value::as_bool) {
        record.enabled = enabled;
    }
    record.rig_parent = params
        .get("rigParent")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(EntityRef::new);
    record.component_tag = params
        .get("componentTag")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);
    record.parameters = params
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "name" | "type" | "input"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(record)
}

#[cfg(test)]
#[path = "../../tests/unit/component/lifecycle.rs"]
mod tests;
