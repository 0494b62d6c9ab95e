pub type RigResult<T> = Result<T, RigError>;

#[derive(thiserror::Error, Debug)]
pub enum RigError {
    /// Invalid inputs at construction time. Raised before any entity exists.
    #[error("construction error: {0}")]
    Construction(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A referenced external entity is absent when a stage runs.
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("parameter type error: {0}")]
    ParameterType(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A stage was requested out of order.
    #[error("stage error: {0}")]
    Stage(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error("persistence error: {0}")]
    Persist(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("dependency failed: {0}")]
    DependencyFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RigError {
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    pub fn duplicate_name(msg: impl Into<String>) -> Self {
        Self::DuplicateName(msg.into())
    }

    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    pub fn parameter_type(msg: impl Into<String>) -> Self {
        Self::ParameterType(msg.into())
    }

    pub fn unknown_parameter(msg: impl Into<String>) -> Self {
        Self::UnknownParameter(msg.into())
    }

    pub fn stage(msg: impl Into<String>) -> Self {
        Self::Stage(msg.into())
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn dependency_failed(msg: impl Into<String>) -> Self {
        Self::DependencyFailed(msg.into())
    }
}

impl From<serde_json::Error> for RigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
