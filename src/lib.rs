//! Rigstage is the staged build engine of a character-rig assembly tool.
//!
//! A rig is a tree of components. Each component emits entities into an external scene graph
//! through five forward-only stages, owns the entities it emits through a container, and
//! writes its progress into that container so a later session can pick up where it left off.
//!
//! - Describe components with [`ComponentRecord`]s (or a whole [`RigFile`])
//! - Build them through a [`BuildOrchestrator`] against any [`Scene`] implementation
//! - Inspect the per-stage [`StageReport`]s, tear down with [`BuildOrchestrator::teardown_all`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod build;
pub(crate) mod component;
pub(crate) mod container;
pub(crate) mod params;
pub(crate) mod persist;
/// Scene-graph collaborator traits and the in-memory adapter.
pub mod scene;

pub use crate::foundation::core::{BuildStage, EntityKind, EntityRef};
pub use crate::foundation::error::{RigError, RigResult};

pub use crate::build::options::BuildOptions;
pub use crate::build::orchestrator::BuildOrchestrator;
pub use crate::build::plan::{BuildPlan, plan};
pub use crate::build::report::{BuildSummary, StageReport, StageStatus};
pub use crate::build::rig_file::{RigFile, SkeletonEntity};
pub use crate::component::catalog::{ComponentCatalog, KindFactory};
pub use crate::component::context::BuildContext;
pub use crate::component::kind::{Arity, ChildSpec, ComponentKind};
pub use crate::component::kinds;
pub use crate::component::lifecycle::{
    CORE_PARAMETERS, Component, ComponentCore, StageOutcome, TeardownReport,
};
pub use crate::component::record::ComponentRecord;
pub use crate::component::rig;
pub use crate::container::metadata::ContainerMetadata;
pub use crate::container::registry::{Container, ContainerRegistry};
pub use crate::container::scope::{ActiveContainerGuard, ActiveContainerStack};
pub use crate::container::{COMPONENT_TAG, CONTAINER_ATTR, METADATA_ATTR, SUB_COMPONENT_TAG};
pub use crate::params::store::{
    CoercionPolicy, PROTECTED_KEYS, ParamType, Parameter, ParameterStore,
};
pub use crate::persist::store::{JsonFileStore, MemoryStore, Persistence};
pub use crate::scene::{MemoryScene, Scene, SceneGraph, TagIndex};
