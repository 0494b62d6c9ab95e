use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::foundation::error::{RigError, RigResult};

/// Keys that external data may never overwrite.
pub const PROTECTED_KEYS: [&str; 3] = ["name", "type", "input"];

/// Declared type of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Mapping,
}

impl ParamType {
    /// Infer the declared type from a value. `null` has no type.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_f64() => Some(Self::Float),
            Value::Number(_) => Some(Self::Int),
            Value::String(_) => Some(Self::String),
            Value::Array(_) => Some(Self::Sequence),
            Value::Object(_) => Some(Self::Mapping),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        };
        f.write_str(s)
    }
}

/// What to do when a stored value does not match the declared type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Widen integers to floats with a warning; fail everything else.
    #[default]
    Widen,
    /// Fail on any mismatch.
    Strict,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub default: Value,
    pub value: Value,
    pub tooltip: Option<String>,
    /// Declared from another parameter's value; dropped and re-derived on every hydrate.
    pub dynamic: bool,
}

/// Typed, named settings of one component, kept in declaration order.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    params: Vec<Parameter>,
    index: BTreeMap<String, usize>,
    policy: CoercionPolicy,
}

impl ParameterStore {
    pub fn new(policy: CoercionPolicy) -> Self {
        Self {
            params: Vec::new(),
            index: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CoercionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: CoercionPolicy) {
        self.policy = policy;
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Register a parameter. Re-defining an existing parameter with the same type is a no-op.
    pub fn define(
        &mut self,
        name: &str,
        default: impl Into<Value>,
        ty: ParamType,
    ) -> RigResult<()> {
        self.define_inner(name, default.into(), ty, false)
    }

    /// Register a parameter derived from a governing parameter.
    pub fn define_dynamic(
        &mut self,
        name: &str,
        default: impl Into<Value>,
        ty: ParamType,
    ) -> RigResult<()> {
        self.define_inner(name, default.into(), ty, true)
    }

    fn define_inner(
        &mut self,
        name: &str,
        default: Value,
        ty: ParamType,
        dynamic: bool,
    ) -> RigResult<()> {
        if name.trim().is_empty() {
            return Err(RigError::parameter_type("parameter name must be non-empty"));
        }
        if let Some(existing) = self.parameter(name) {
            if existing.ty != ty {
                return Err(RigError::parameter_type(format!(
                    "parameter '{name}' already defined as {}, cannot redefine as {ty}",
                    existing.ty
                )));
            }
            tracing::debug!(parameter = name, "parameter already defined");
            return Ok(());
        }

        let default = self.check(name, ty, default)?;
        tracing::debug!(parameter = name, %ty, value = %default, "defining parameter");
        self.index.insert(name.to_owned(), self.params.len());
        self.params.push(Parameter {
            name: name.to_owned(),
            ty,
            value: default.clone(),
            default,
            tooltip: None,
            dynamic,
        });
        Ok(())
    }

    pub fn set_tooltip(&mut self, name: &str, tooltip: impl Into<String>) -> RigResult<()> {
        let i = self.position(name)?;
        self.params[i].tooltip = Some(tooltip.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> RigResult<&Value> {
        self.parameter(name)
            .map(|p| &p.value)
            .ok_or_else(|| RigError::unknown_parameter(name.to_owned()))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> RigResult<()> {
        let i = self.position(name)?;
        let ty = self.params[i].ty;
        let value = self.check(name, ty, value.into())?;
        self.params[i].value = value;
        Ok(())
    }

    pub fn get_bool(&self, name: &str) -> RigResult<bool> {
        self.typed(name, ParamType::Bool, Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> RigResult<i64> {
        self.typed(name, ParamType::Int, Value::as_i64)
    }

    pub fn get_float(&self, name: &str) -> RigResult<f64> {
        self.typed(name, ParamType::Float, Value::as_f64)
    }

    pub fn get_str(&self, name: &str) -> RigResult<&str> {
        let v = self.get(name)?;
        v.as_str()
            .ok_or_else(|| Self::mismatch(name, ParamType::String, v))
    }

    pub fn get_sequence(&self, name: &str) -> RigResult<&[Value]> {
        let v = self.get(name)?;
        v.as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| Self::mismatch(name, ParamType::Sequence, v))
    }

    pub fn get_mapping(&self, name: &str) -> RigResult<&Map<String, Value>> {
        let v = self.get(name)?;
        v.as_object()
            .ok_or_else(|| Self::mismatch(name, ParamType::Mapping, v))
    }

    /// Deserialize a parameter into any serde type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> RigResult<T> {
        let v = self.get(name)?.clone();
        serde_json::from_value(v).map_err(|e| {
            RigError::parameter_type(format!("parameter '{name}' cannot be read: {e}"))
        })
    }

    /// Merge external values. Protected keys and undeclared names are skipped.
    ///
    /// Returns the number of parameters updated.
    pub fn load_from(&mut self, data: &Map<String, Value>) -> RigResult<usize> {
        let mut loaded = 0usize;
        for (key, value) in data {
            if PROTECTED_KEYS.contains(&key.as_str()) {
                continue;
            }
            if !self.contains(key) {
                tracing::debug!(parameter = %key, "skipping value for undeclared parameter");
                continue;
            }
            self.set(key, value.clone())?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Merge only the named keys from external data.
    pub fn load_only(&mut self, data: &Map<String, Value>, names: &[&str]) -> RigResult<usize> {
        let mut loaded = 0usize;
        for name in names {
            if PROTECTED_KEYS.contains(name) {
                continue;
            }
            if let Some(value) = data.get(*name)
                && self.contains(name)
            {
                self.set(name, value.clone())?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Drop every dynamic parameter so a fresh derivation starts clean.
    pub fn clear_dynamic(&mut self) {
        self.params.retain(|p| !p.dynamic);
        self.reindex();
    }

    pub fn dynamic_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.dynamic)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Current values for persistence, in declaration order.
    pub fn dump(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for p in &self.params {
            out.insert(p.name.clone(), p.value.clone());
        }
        out
    }

    fn reindex(&mut self) {
        self.index = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
    }

    fn position(&self, name: &str) -> RigResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RigError::unknown_parameter(name.to_owned()))
    }

    fn typed<T>(&self, name: &str, ty: ParamType, read: fn(&Value) -> Option<T>) -> RigResult<T> {
        let v = self.get(name)?;
        read(v).ok_or_else(|| Self::mismatch(name, ty, v))
    }

    fn mismatch(name: &str, ty: ParamType, v: &Value) -> RigError {
        RigError::parameter_type(format!("parameter '{name}' is not a {ty}: {v}"))
    }

    fn check(&self, name: &str, ty: ParamType, value: Value) -> RigResult<Value> {
        let actual = ParamType::of(&value);
        if actual == Some(ty) {
            return Ok(value);
        }

        if ty == ParamType::Float
            && actual == Some(ParamType::Int)
            && self.policy == CoercionPolicy::Widen
        {
            if let Some(f) = value.as_f64() {
                tracing::warn!(parameter = name, %value, "widening int value to float");
                return Ok(Value::from(f));
            }
        }

        Err(RigError::parameter_type(format!(
            "parameter '{name}' declared {ty}, got {}",
            actual.map_or_else(|| "null".to_owned(), |t| t.to_string())
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/store.rs"]
mod tests;
