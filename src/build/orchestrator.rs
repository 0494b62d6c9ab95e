use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::{Map, Value};

use crate::build::options::BuildOptions;
use crate::build::plan::plan;
use crate::build::report::{BuildSummary, StageReport, StageStatus};
use crate::build::rig_file::RigFile;
use crate::component::catalog::ComponentCatalog;
use crate::component::context::BuildContext;
use crate::component::lifecycle::{
    Component, StageOutcome, TeardownReport, record_from_parameters,
};
use crate::component::record::ComponentRecord;
use crate::container::SUB_COMPONENT_TAG;
use crate::container::registry::ContainerRegistry;
use crate::foundation::core::{BuildStage, EntityRef};
use crate::foundation::error::{RigError, RigResult};
use crate::persist::store::Persistence;

const MAIN_TAG: &str = "main.main";

/// Drives every top-level component of a rig through the stage passes.
///
/// Composites recurse on their own during `build`, so a pass here only visits top-level
/// components. A component that fails is reported and blocks its dependents; siblings keep
/// going.
#[derive(Debug)]
pub struct BuildOrchestrator {
    catalog: ComponentCatalog,
    options: BuildOptions,
    components: Vec<Component>,
    dependencies: BTreeMap<String, BTreeSet<String>>,
    failed: BTreeSet<String>,
}

impl BuildOrchestrator {
    pub fn new(catalog: ComponentCatalog, options: BuildOptions) -> Self {
        Self {
            catalog,
            options,
            components: Vec::new(),
            dependencies: BTreeMap::new(),
            failed: BTreeSet::new(),
        }
    }

    /// Plan `records` and construct every component in dependency order.
    pub fn from_records(
        catalog: ComponentCatalog,
        options: BuildOptions,
        records: Vec<ComponentRecord>,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Self> {
        let plan = plan(&records, &catalog)?;
        let mut slots: Vec<Option<ComponentRecord>> = records.into_iter().map(Some).collect();
        let mut me = Self::new(catalog, options);
        for i in plan.order {
            let Some(record) = slots[i].take() else {
                continue;
            };
            match Component::new(&me.catalog, record, cx) {
                Ok(component) => me.components.push(component),
                Err(e) => {
                    for built in &me.components {
                        built.release_claims(cx.containers_mut());
                    }
                    return Err(e);
                }
            }
        }
        me.dependencies = plan.dependencies;
        tracing::info!(components = me.components.len(), "rig planned");
        Ok(me)
    }

    pub fn from_rig_file(
        catalog: ComponentCatalog,
        rig: &RigFile,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Self> {
        Self::from_records(catalog, rig.options.clone(), rig.components.clone(), cx)
    }

    /// Resume every top-level component whose container is already in the scene.
    pub fn from_scene(
        catalog: ComponentCatalog,
        options: BuildOptions,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Self> {
        let mut records = Vec::new();
        for container in ContainerRegistry::discover(cx.scene()) {
            if cx
                .scene()
                .has_tag(&EntityRef::new(&container), SUB_COMPONENT_TAG)
            {
                continue;
            }
            if let Some(meta) = ContainerRegistry::read_metadata(cx.scene(), &container)? {
                records.push(record_from_parameters(&meta.type_tag, &meta.parameters)?);
            }
        }
        Self::from_records(catalog, options, records, cx)
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    /// Components in build order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn order(&self) -> Vec<&str> {
        self.components.iter().map(Component::name).collect()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name() == name)
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.name() == name)
    }

    /// Names that failed (or were blocked) in any pass so far.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }

    pub fn initialize_all(&mut self, cx: &mut BuildContext<'_>) -> StageReport {
        self.run_pass(BuildStage::Initialized, cx)
    }

    pub fn build_all(&mut self, cx: &mut BuildContext<'_>) -> StageReport {
        let report = self.run_pass(BuildStage::Built, cx);
        self.collect_roots(cx);
        report
    }

    pub fn connect_all(&mut self, cx: &mut BuildContext<'_>) -> StageReport {
        self.run_pass(BuildStage::Connected, cx)
    }

    pub fn finalize_all(&mut self, cx: &mut BuildContext<'_>) -> StageReport {
        self.run_pass(BuildStage::Finalized, cx)
    }

    pub fn optimize_all(&mut self, cx: &mut BuildContext<'_>) -> StageReport {
        self.run_pass(BuildStage::Optimized, cx)
    }

    /// Every pass in order. Optimize runs only when enabled in the options.
    pub fn run(&mut self, cx: &mut BuildContext<'_>) -> BuildSummary {
        let mut summary = BuildSummary::default();
        summary.reports.push(self.initialize_all(cx));
        summary.reports.push(self.build_all(cx));
        summary.reports.push(self.connect_all(cx));
        summary.reports.push(self.finalize_all(cx));
        if self.options.optimize {
            summary.reports.push(self.optimize_all(cx));
        }
        if summary.is_success() {
            tracing::info!("rig built");
        } else {
            tracing::warn!(failed = self.failed.len(), "rig built with failures");
        }
        summary
    }

    /// All five stages for one component. Refuses while one of its dependencies is failed.
    pub fn build_single(
        &mut self,
        name: &str,
        cx: &mut BuildContext<'_>,
    ) -> RigResult<Vec<(BuildStage, StageOutcome)>> {
        if let Some(dep) = self
            .dependencies
            .get(name)
            .into_iter()
            .flatten()
            .find(|d| self.failed.contains(*d))
        {
            return Err(RigError::dependency_failed(format!(
                "'{name}' depends on '{dep}', which failed"
            )));
        }
        let component = self
            .component_mut(name)
            .ok_or_else(|| RigError::construction(format!("no component named '{name}'")))?;
        let outcomes = component.run_all(cx);
        if outcomes.is_ok() {
            self.failed.remove(name);
        }
        outcomes
    }

    /// Tear everything down in reverse build order, `main.main` last.
    pub fn teardown_all(&mut self, cx: &mut BuildContext<'_>) -> Vec<(String, TeardownReport)> {
        let (mains, others): (Vec<usize>, Vec<usize>) = (0..self.components.len())
            .rev()
            .partition(|&i| self.components[i].type_tag() == MAIN_TAG);

        let mut reports = Vec::with_capacity(self.components.len());
        for i in others.into_iter().chain(mains) {
            let c = &mut self.components[i];
            let report = c.teardown(cx);
            for w in &report.warnings {
                tracing::warn!(component = c.name(), warning = %w, "teardown incomplete");
            }
            reports.push((c.name().to_owned(), report));
        }
        self.failed.clear();
        reports
    }

    pub fn records(&self) -> Vec<ComponentRecord> {
        self.components.iter().map(Component::record).collect()
    }

    /// Write every record as a mapping of component name to record.
    pub fn save_components(&self, store: &mut dyn Persistence, path: &Path) -> RigResult<usize> {
        let mut out = Map::new();
        for record in self.records() {
            out.insert(record.name.clone(), serde_json::to_value(&record)?);
        }
        store.write(path, &out)?;
        tracing::info!(path = %path.display(), components = out.len(), "components saved");
        Ok(out.len())
    }

    pub fn load_components(
        store: &dyn Persistence,
        path: &Path,
    ) -> RigResult<Vec<ComponentRecord>> {
        let data = store.read(path)?;
        let mut records = Vec::with_capacity(data.len());
        for (name, value) in data {
            let mut value = value;
            if let Value::Object(m) = &mut value
                && !m.contains_key("name")
            {
                m.insert("name".to_owned(), Value::from(name.clone()));
            }
            let record: ComponentRecord = serde_json::from_value(value).map_err(|e| {
                RigError::persist(format!("component '{name}' in '{}': {e}", path.display()))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    #[tracing::instrument(skip_all, fields(stage = %stage))]
    fn run_pass(&mut self, stage: BuildStage, cx: &mut BuildContext<'_>) -> StageReport {
        let mut report = StageReport::new(stage);
        for component in &mut self.components {
            let name = component.name().to_owned();
            if self.failed.contains(&name) {
                report.push(name, StageStatus::Blocked("failed in an earlier pass".to_owned()));
                continue;
            }
            let broken: Vec<&str> = self
                .dependencies
                .get(&name)
                .into_iter()
                .flatten()
                .filter(|d| self.failed.contains(*d))
                .map(String::as_str)
                .collect();
            if !broken.is_empty() {
                let why = format!("dependency failed: {}", broken.join(", "));
                tracing::warn!(component = %name, %why, "blocked");
                self.failed.insert(name.clone());
                report.push(name, StageStatus::Blocked(why));
                continue;
            }

            match component.run_to(stage, cx) {
                Ok(outcome) => report.push(name, outcome.into()),
                Err(e) => {
                    tracing::error!(component = %name, error = %e, "stage failed");
                    self.failed.insert(name.clone());
                    report.push(name, StageStatus::Failed(e.to_string()));
                }
            }
        }
        report
    }

    /// Move component roots left at the scene root under the rig group.
    fn collect_roots(&self, cx: &mut BuildContext<'_>) {
        let Some(group) = self.options.rig_group.as_deref() else {
            return;
        };
        if !cx.scene().exists(group) {
            return;
        }
        let group = EntityRef::new(group);
        for c in &self.components {
            let root = c.core().root();
            if !cx.scene().exists(root.as_str()) || cx.scene().parent_of(&root).is_some() {
                continue;
            }
            if let Err(e) = cx.scene_mut().reparent(&root, Some(&group)) {
                tracing::warn!(root = %root, error = %e, "could not move root under rig group");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/orchestrator.rs"]
mod tests;
