use serde_json::{Map, Value};

use crate::foundation::core::BuildStage;

/// Durable progress record written onto a container entity.
///
/// This is what lets a later session resume a component: the stage it reached, the kind that
/// produced it, and every parameter value at the time the last stage completed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetadata {
    pub version: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub stage: BuildStage,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ContainerMetadata {
    pub fn new(type_tag: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            type_tag: type_tag.into(),
            stage: BuildStage::Unbuilt,
            parameters: Map::new(),
        }
    }
}
