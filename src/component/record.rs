use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::foundation::core::EntityRef;

/// Declarative description of one component instance.
///
/// `input` may be a single reference or a list; `inputs` is accepted as an alias.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(
        rename = "input",
        alias = "inputs",
        default,
        deserialize_with = "one_or_many"
    )]
    pub inputs: Vec<EntityRef>,
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rig_parent: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_tag: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_size() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<EntityRef>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(EntityRef),
        Many(Vec<EntityRef>),
    }
    Ok(match Option::<OneOrMany>::deserialize(d)? {
        None => Vec::new(),
        Some(OneOrMany::One(e)) => vec![e],
        Some(OneOrMany::Many(v)) => v,
    })
}

impl ComponentRecord {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            inputs: Vec::new(),
            size: default_size(),
            rig_parent: None,
            component_tag: None,
            enabled: true,
            depends_on: Vec::new(),
            parameters: Map::new(),
        }
    }

    pub fn input(mut self, entity: impl Into<EntityRef>) -> Self {
        self.inputs.push(entity.into());
        self
    }

    pub fn inputs<I, E>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityRef>,
    {
        self.inputs.extend(entities.into_iter().map(Into::into));
        self
    }

    pub fn rig_parent(mut self, entity: impl Into<EntityRef>) -> Self {
        self.rig_parent = Some(entity.into());
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn component_tag(mut self, tag: impl Into<String>) -> Self {
        self.component_tag = Some(tag.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}
