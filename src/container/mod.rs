//! Exclusively-owned namespaces for generated entities.

pub(crate) mod metadata;
pub(crate) mod registry;
pub(crate) mod scope;

/// Scene attribute holding a container's serialized membership and anchors.
pub const CONTAINER_ATTR: &str = "container";
/// Scene attribute holding a container's [`metadata::ContainerMetadata`] blob.
pub const METADATA_ATTR: &str = "metadata";
/// Tag applied to every component container for discovery.
pub const COMPONENT_TAG: &str = "component";
/// Tag applied to containers owned by a composite parent.
pub const SUB_COMPONENT_TAG: &str = "subComponent";
