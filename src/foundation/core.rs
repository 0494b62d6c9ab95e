use std::fmt;

use crate::foundation::error::{RigError, RigResult};

/// Name-based reference to an entity in the external scene graph.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntityRef(pub String);

impl EntityRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EntityRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EntityRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Entity categories the build engine emits or consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Transform,
    Joint,
    Control,
    Shape,
    Guide,
    Constraint,
    Curve,
    Container,
    Network,
}

impl EntityKind {
    /// Shape entities ride along with their transform when containers capture members.
    pub fn is_shape(self) -> bool {
        matches!(self, Self::Shape)
    }
}

/// Monotonic lifecycle position of a component.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildStage {
    #[default]
    Unbuilt = 0,
    Initialized = 1,
    Built = 2,
    Connected = 3,
    Finalized = 4,
    Optimized = 5,
}

impl BuildStage {
    pub const ALL: [BuildStage; 6] = [
        BuildStage::Unbuilt,
        BuildStage::Initialized,
        BuildStage::Built,
        BuildStage::Connected,
        BuildStage::Finalized,
        BuildStage::Optimized,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> RigResult<Self> {
        Self::ALL
            .get(usize::from(v))
            .copied()
            .ok_or_else(|| RigError::serde(format!("invalid build stage {v}")))
    }

    /// The stage directly below this one. `Unbuilt` has none.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Unbuilt => None,
            other => Self::from_u8(other.as_u8() - 1).ok(),
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_u8(self.as_u8() + 1).ok()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unbuilt => "unbuilt",
            Self::Initialized => "initialize",
            Self::Built => "build",
            Self::Connected => "connect",
            Self::Finalized => "finalize",
            Self::Optimized => "optimize",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
