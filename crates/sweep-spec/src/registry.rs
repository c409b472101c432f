//! Registry of named sampling functions
//!
//! Plain-data templates refer to domains by name. The short form
//! `{"eval": "name"}` takes a registered domain as is; the long form
//! `{"eval": {"fn": "name", "depends_on": [..], ..}}` passes the remaining
//! fields as parameters to a [`DomainBuilder`] and declares dependency paths
//! that must be resolved before the domain is sampled.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rand::{Rng, RngCore};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::builtins;
use crate::domain::{Domain, FnDomain, SampleError, Uniform};
use crate::error::SpecError;
use crate::guard::SpecGuard;
use crate::loader::SpecLoader;
use crate::path::SpecPath;
use crate::spec::Spec;

/// Builds a domain from descriptor parameters
pub type DomainBuilder = Arc<dyn Fn(&EvalArgs) -> Result<Arc<dyn Domain>, SpecError> + Send + Sync>;

/// Parameters of an `eval` descriptor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalArgs {
    path: SpecPath,
    depends_on: Vec<SpecPath>,
    params: JsonMap<String, JsonValue>,
}

impl EvalArgs {
    /// Arguments of a descriptor found at `path`
    #[inline]
    #[must_use]
    pub fn new(path: SpecPath) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Declare a dependency path
    #[must_use]
    pub fn with_dependency(mut self, path: SpecPath) -> Self {
        self.depends_on.push(path);
        self
    }

    /// Location of the descriptor
    #[inline]
    #[must_use]
    pub fn path(&self) -> &SpecPath {
        &self.path
    }

    /// Declared dependency paths
    #[inline]
    #[must_use]
    pub fn depends_on(&self) -> &[SpecPath] {
        &self.depends_on
    }

    /// Raw parameter
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&JsonValue> {
        self.params.get(name)
    }

    /// Parameter names in document order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Required numeric parameter
    ///
    /// # Errors
    /// Returns error if missing or not a number
    pub fn f64(&self, name: &str) -> Result<f64, SpecError> {
        self.f64_opt(name)?
            .ok_or_else(|| self.invalid(format!("missing parameter `{name}`")))
    }

    /// Numeric parameter with a default
    ///
    /// # Errors
    /// Returns error if present but not a number
    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, SpecError> {
        Ok(self.f64_opt(name)?.unwrap_or(default))
    }

    fn f64_opt(&self, name: &str) -> Result<Option<f64>, SpecError> {
        self.param(name)
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| self.invalid(format!("parameter `{name}` must be a number, got {v}")))
            })
            .transpose()
    }

    /// Required integer parameter
    ///
    /// # Errors
    /// Returns error if missing or not an integer
    pub fn i64(&self, name: &str) -> Result<i64, SpecError> {
        let value = self
            .param(name)
            .ok_or_else(|| self.invalid(format!("missing parameter `{name}`")))?;
        value
            .as_i64()
            .ok_or_else(|| self.invalid(format!("parameter `{name}` must be an integer, got {value}")))
    }

    /// Required path parameter, written as a dotted string
    ///
    /// # Errors
    /// Returns error if missing, not a string, or not a valid path
    pub fn spec_path(&self, name: &str) -> Result<SpecPath, SpecError> {
        let value = self
            .param(name)
            .ok_or_else(|| self.invalid(format!("missing parameter `{name}`")))?;
        let text = value
            .as_str()
            .ok_or_else(|| self.invalid(format!("parameter `{name}` must be a path string, got {value}")))?;
        text.parse()
            .map_err(|e| self.invalid(format!("parameter `{name}`: {e}")))
    }

    /// Required sequence parameter, each item converted like a template node
    ///
    /// # Errors
    /// Returns error if missing, not a sequence, or an item is malformed
    pub fn specs(&self, name: &str) -> Result<Vec<Spec>, SpecError> {
        match self.param(name) {
            Some(JsonValue::Array(items)) => {
                SpecLoader::new().load_items(items.clone(), &self.path.child(name))
            }
            Some(other) => Err(self.invalid(format!("parameter `{name}` must be a list, got {other}"))),
            None => Err(self.invalid(format!("missing parameter `{name}`"))),
        }
    }

    /// Reject parameters outside `allowed`
    ///
    /// # Errors
    /// Returns error naming the first unexpected parameter
    pub fn expect_only(&self, allowed: &[&str]) -> Result<(), SpecError> {
        match self.param_names().find(|name| !allowed.contains(name)) {
            Some(name) => Err(self.invalid(format!("unexpected parameter `{name}`"))),
            None => Ok(()),
        }
    }

    /// Descriptor error at this location
    #[must_use]
    pub fn invalid(&self, reason: impl Into<String>) -> SpecError {
        SpecError::InvalidDescriptor {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

/// Named domains available to `{"eval": ...}` descriptors
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Arc<dyn Domain>>,
    builders: IndexMap<String, DomainBuilder>,
}

impl FunctionRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
            builders: IndexMap::new(),
        }
    }

    /// Create registry with built-in functions
    ///
    /// - `random` → uniform float in `[0, 1)`
    /// - `coin` → fair boolean
    /// - `uniform {low, high}`, `randint {low, high}`, `normal {mean, std}`
    /// - `choice {options}` → one of `options`
    /// - `ref {path}` → copy of the subtree at `path`
    /// - `scale {path, factor, offset}` → `value * factor + offset`
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("random", Uniform::unit());
        registry.register_fn("coin", Vec::new(), |_spec, rng| {
            Ok(Spec::from(rng.random_bool(0.5)))
        });
        registry.register_builder("uniform", builtins::uniform);
        registry.register_builder("randint", builtins::randint);
        registry.register_builder("normal", builtins::normal);
        registry.register_builder("choice", builtins::choice);
        registry.register_builder("ref", builtins::reference);
        registry.register_builder("scale", builtins::scale);
        registry
    }

    /// Register a domain under a name, returning any domain it replaces
    pub fn register(
        &mut self,
        name: impl Into<String>,
        domain: impl Domain + 'static,
    ) -> Option<Arc<dyn Domain>> {
        let name = name.into();
        self.builders.shift_remove(&name);
        self.functions.insert(name, Arc::new(domain))
    }

    /// Register a sampling function with declared dependencies
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        depends_on: Vec<SpecPath>,
        func: F,
    ) -> Option<Arc<dyn Domain>>
    where
        F: Fn(&SpecGuard<'_>, &mut dyn RngCore) -> Result<Spec, SampleError> + Send + Sync + 'static,
    {
        let name = name.into();
        let domain = depends_on
            .into_iter()
            .fold(FnDomain::new(name.clone(), func), FnDomain::depends_on);
        self.register(name, domain)
    }

    /// Register a builder for parameterised descriptors
    pub fn register_builder<F>(&mut self, name: impl Into<String>, build: F)
    where
        F: Fn(&EvalArgs) -> Result<Arc<dyn Domain>, SpecError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.functions.shift_remove(&name);
        self.builders.insert(name, Arc::new(build));
    }

    /// Look up a registered domain by name
    ///
    /// Builders are not consulted; see [`FunctionRegistry::build`].
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Domain>> {
        self.functions.get(name).cloned()
    }

    /// Domain for an `eval` descriptor
    ///
    /// Registered domains take no parameters. Declared dependencies gate the
    /// domain: it reports not-ready until every one of them is resolved.
    ///
    /// # Errors
    /// [`SpecError::UnknownFunction`] for an unregistered name,
    /// [`SpecError::InvalidDescriptor`] for bad parameters
    pub fn build(&self, name: &str, args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
        let domain = if let Some(build) = self.builders.get(name) {
            build(args)?
        } else if let Some(domain) = self.functions.get(name) {
            args.expect_only(&[])?;
            Arc::clone(domain)
        } else {
            return Err(SpecError::UnknownFunction {
                path: args.path().clone(),
                name: name.to_string(),
            });
        };
        gate(name, domain, args)
    }

    /// Check if a name is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.builders.contains_key(name)
    }

    /// List registered names, domains first, each in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.functions
            .keys()
            .chain(self.builders.keys())
            .map(String::as_str)
            .collect()
    }

    /// Get number of registered functions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len() + self.builders.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.builders.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("builders", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn gate(name: &str, domain: Arc<dyn Domain>, args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    if args.depends_on().is_empty() {
        return Ok(domain);
    }
    if domain.is_grid() {
        return Err(args.invalid(format!("grid function `{name}` cannot declare dependencies")));
    }
    let gated = args.depends_on().iter().cloned().fold(
        FnDomain::new(name, move |spec, rng| domain.sample(spec, rng)),
        FnDomain::depends_on,
    );
    Ok(Arc::new(gated))
}
