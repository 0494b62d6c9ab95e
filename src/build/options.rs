use crate::params::store::CoercionPolicy;

/// Session-wide build options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Run the optimize pass at the end of [`run`](crate::BuildOrchestrator::run).
    pub optimize: bool,
    /// After the build pass, component roots left at the scene root are moved under this
    /// group when it exists. `None` leaves them in place.
    pub rig_group: Option<String>,
    /// Default policy for parameter type mismatches.
    pub coercion: CoercionPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            rig_group: Some("rig".to_owned()),
            coercion: CoercionPolicy::Widen,
        }
    }
}
