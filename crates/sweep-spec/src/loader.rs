//! Spec loading from plain data
//!
//! JSON / YAML templates describe grids and domains with single-key objects:
//!
//! - `{"grid_search": [..]}` → [`Spec::Grid`]
//! - `{"eval": "name"}` → [`Spec::Domain`] looked up in a [`FunctionRegistry`]
//! - `{"eval": {"fn": "name", "depends_on": ["a.b"], ...}}` → the same, with
//!   declared dependencies and the remaining fields as parameters
//!
//! Everything else maps structurally onto [`Spec::Map`], [`Spec::List`] and
//! [`Spec::Value`].

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::SpecError;
use crate::path::SpecPath;
use crate::registry::{EvalArgs, FunctionRegistry};
use crate::spec::{GridAxis, Spec, GRID_SEARCH_KEY};

/// Key of the plain-data domain descriptor `{"eval": "name"}`
pub const EVAL_KEY: &str = "eval";

/// Function name field of the long `eval` form
pub const EVAL_FN_KEY: &str = "fn";

/// Dependency list field of the long `eval` form
pub const DEPENDS_ON_KEY: &str = "depends_on";

/// Builds [`Spec`]s from JSON / YAML documents
#[derive(Debug, Clone, Default)]
pub struct SpecLoader {
    registry: FunctionRegistry,
}

impl SpecLoader {
    /// Loader with an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader resolving `eval` descriptors against `registry`
    #[inline]
    #[must_use]
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Registry used for `eval` descriptors
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or a descriptor is malformed
    pub fn from_json_str(&self, json: &str) -> Result<Spec, SpecError> {
        let value: JsonValue = serde_json::from_str(json)?;
        self.load_value(value)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or a descriptor is malformed
    pub fn from_yaml_str(&self, yaml: &str) -> Result<Spec, SpecError> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        self.load_value(value)
    }

    /// Read a template file; `.yaml` / `.yml` are YAML, anything else JSON
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(&self, path: &Path) -> Result<Spec, SpecError> {
        let text = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => self.from_yaml_str(&text),
            _ => self.from_json_str(&text),
        }
    }

    /// Convert a parsed JSON value
    ///
    /// # Errors
    /// Returns error if a descriptor is malformed or names an unknown function
    pub fn load_value(&self, value: JsonValue) -> Result<Spec, SpecError> {
        self.convert(value, &mut SpecPath::root())
    }

    /// Convert the items of a JSON array found at `path`
    pub(crate) fn load_items(&self, items: Vec<JsonValue>, path: &SpecPath) -> Result<Vec<Spec>, SpecError> {
        self.convert_items(items, &mut path.clone())
    }

    fn convert(&self, value: JsonValue, path: &mut SpecPath) -> Result<Spec, SpecError> {
        match value {
            JsonValue::Object(map) => {
                if map.len() == 1 {
                    if let Some(candidates) = map.get(GRID_SEARCH_KEY) {
                        return self.grid_axis(candidates.clone(), path);
                    }
                    if let Some(target) = map.get(EVAL_KEY) {
                        return self.eval(target, path);
                    }
                }
                let mut out = IndexMap::with_capacity(map.len());
                for (key, child) in map {
                    path.push(key.as_str());
                    let spec = self.convert(child, path)?;
                    path.pop();
                    out.insert(key, spec);
                }
                Ok(Spec::Map(out))
            }
            JsonValue::Array(items) => self.convert_items(items, path).map(Spec::List),
            scalar => Ok(Spec::Value(scalar)),
        }
    }

    fn convert_items(&self, items: Vec<JsonValue>, path: &mut SpecPath) -> Result<Vec<Spec>, SpecError> {
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            path.push(idx);
            out.push(self.convert(item, path)?);
            path.pop();
        }
        Ok(out)
    }

    fn grid_axis(&self, candidates: JsonValue, path: &mut SpecPath) -> Result<Spec, SpecError> {
        match candidates {
            JsonValue::Array(items) => {
                let values = self.convert_items(items, path)?;
                Ok(Spec::Grid(GridAxis::new(values).validated(path)?))
            }
            other => Err(SpecError::malformed_grid(
                path,
                format!(
                    "expected a list of candidate values, got {}",
                    Spec::Value(other).type_name()
                ),
            )),
        }
    }

    fn eval(&self, target: &JsonValue, path: &SpecPath) -> Result<Spec, SpecError> {
        let (name, args) = match target {
            JsonValue::String(name) => (name.as_str(), EvalArgs::new(path.clone())),
            JsonValue::Object(fields) => eval_args(fields, path)?,
            other => {
                return Err(SpecError::InvalidDescriptor {
                    path: path.clone(),
                    reason: format!("`{EVAL_KEY}` expects a function name or an object, got {other}"),
                })
            }
        };
        self.registry.build(name, &args).map(Spec::Domain)
    }
}

fn eval_args<'v>(fields: &'v JsonMap<String, JsonValue>, path: &SpecPath) -> Result<(&'v str, EvalArgs), SpecError> {
    let invalid = |reason: String| SpecError::InvalidDescriptor {
        path: path.clone(),
        reason,
    };
    let name = fields
        .get(EVAL_FN_KEY)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid(format!("`{EVAL_KEY}` object needs a string `{EVAL_FN_KEY}` field")))?;

    let mut args = EvalArgs::new(path.clone());
    for (key, value) in fields {
        match key.as_str() {
            EVAL_FN_KEY => {}
            DEPENDS_ON_KEY => {
                let Some(items) = value.as_array() else {
                    return Err(invalid(format!("`{DEPENDS_ON_KEY}` must be a list of paths, got {value}")));
                };
                for item in items {
                    let dep = item
                        .as_str()
                        .ok_or_else(|| invalid(format!("dependency must be a path string, got {item}")))?
                        .parse::<SpecPath>()
                        .map_err(|e| invalid(format!("dependency {item}: {e}")))?;
                    args = args.with_dependency(dep);
                }
            }
            _ => args = args.with_param(key.clone(), value.clone()),
        }
    }
    Ok((name, args))
}
