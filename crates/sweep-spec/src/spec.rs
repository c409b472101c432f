//! Spec tree
//!
//! A [`Spec`] is a nested template of mappings and sequences whose leaves are
//! concrete values, grid axes, or sampling domains.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::domain::{Domain, NotReadyReason};
use crate::error::SpecError;
use crate::loader::SpecLoader;
use crate::path::{PathSegment, SpecPath};

/// Key of the plain-data grid descriptor `{"grid_search": [...]}`
pub const GRID_SEARCH_KEY: &str = "grid_search";

/// Node of a search-space template
///
/// Internal nodes are [`Spec::Map`] and [`Spec::List`]. Leaves are concrete
/// [`Spec::Value`]s or unresolved [`Spec::Grid`] / [`Spec::Domain`] entries.
/// A `Value` is opaque to the loader: its JSON content is not scanned for
/// descriptors, except where it is the candidate array of a grid descriptor.
///
/// A `Map` with exactly one key, `grid_search`, is also read as a grid axis.
#[derive(Debug, Clone)]
pub enum Spec {
    /// Concrete leaf
    Value(JsonValue),
    /// Mapping node, insertion ordered
    Map(IndexMap<String, Spec>),
    /// Sequence node
    List(Vec<Spec>),
    /// Grid axis to enumerate
    Grid(GridAxis),
    /// Domain to sample
    Domain(Arc<dyn Domain>),
}

impl Spec {
    /// Empty mapping node
    #[inline]
    #[must_use]
    pub fn map() -> Self {
        Self::Map(IndexMap::new())
    }

    /// Concrete leaf from anything convertible to JSON
    #[inline]
    #[must_use]
    pub fn value(value: impl Into<JsonValue>) -> Self {
        Self::Value(value.into())
    }

    /// Domain leaf
    #[inline]
    #[must_use]
    pub fn domain(domain: impl Domain + 'static) -> Self {
        Self::Domain(Arc::new(domain))
    }

    /// Build a spec from plain JSON
    ///
    /// `{"grid_search": [...]}` objects become grid axes. `{"eval": ...}`
    /// descriptors need a registry; use [`crate::SpecLoader`] for those.
    ///
    /// # Errors
    /// Returns error for malformed grid descriptors or `eval` descriptors
    pub fn from_json(value: JsonValue) -> Result<Self, SpecError> {
        SpecLoader::new().load_value(value)
    }

    /// Convert a concrete spec to JSON
    ///
    /// # Errors
    /// Returns [`SpecError::Unresolved`] if a grid or domain remains
    pub fn to_json(&self) -> Result<JsonValue, SpecError> {
        self.to_json_at(&mut SpecPath::root())
    }

    fn to_json_at(&self, path: &mut SpecPath) -> Result<JsonValue, SpecError> {
        match self {
            Self::Value(v) => Ok(v.clone()),
            Self::Map(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, child) in map {
                    path.push(key.as_str());
                    let value = child.to_json_at(path)?;
                    path.pop();
                    out.insert(key.clone(), value);
                }
                Ok(JsonValue::Object(out))
            }
            Self::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, child) in items.iter().enumerate() {
                    path.push(idx);
                    out.push(child.to_json_at(path)?);
                    path.pop();
                }
                Ok(JsonValue::Array(out))
            }
            Self::Grid(_) | Self::Domain(_) => Err(SpecError::Unresolved { path: path.clone() }),
        }
    }

    /// Candidate set of a plain-data grid descriptor, if this is one
    #[must_use]
    pub fn grid_descriptor(&self) -> Option<&Spec> {
        match self {
            Self::Map(map) if map.len() == 1 => map.get(GRID_SEARCH_KEY),
            _ => None,
        }
    }

    /// Why this node itself is unresolved, if it is
    ///
    /// Only the node is checked, not its descendants.
    #[must_use]
    pub fn pending_reason(&self) -> Option<NotReadyReason> {
        match self {
            Self::Domain(domain) if domain.is_grid() => Some(NotReadyReason::Grid),
            Self::Domain(_) => Some(NotReadyReason::Domain),
            Self::Grid(_) => Some(NotReadyReason::Grid),
            Self::Map(_) if self.grid_descriptor().is_some() => Some(NotReadyReason::Grid),
            _ => None,
        }
    }

    /// First unresolved node in this subtree, depth first
    #[must_use]
    pub fn first_unresolved(&self) -> Option<(SpecPath, NotReadyReason)> {
        let mut path = SpecPath::root();
        self.first_unresolved_at(&mut path)
            .map(|reason| (path, reason))
    }

    // On success `path` is left pointing at the unresolved node.
    fn first_unresolved_at(&self, path: &mut SpecPath) -> Option<NotReadyReason> {
        if let Some(reason) = self.pending_reason() {
            return Some(reason);
        }
        match self {
            Self::Map(map) => {
                for (key, child) in map {
                    path.push(key.as_str());
                    if let Some(reason) = child.first_unresolved_at(path) {
                        return Some(reason);
                    }
                    path.pop();
                }
                None
            }
            Self::List(items) => {
                for (idx, child) in items.iter().enumerate() {
                    path.push(idx);
                    if let Some(reason) = child.first_unresolved_at(path) {
                        return Some(reason);
                    }
                    path.pop();
                }
                None
            }
            _ => None,
        }
    }

    /// Check that no grid or domain remains anywhere in this subtree
    #[inline]
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.first_unresolved().is_none()
    }

    /// Direct child addressed by one segment
    ///
    /// An index segment on a mapping looks up the key spelled by the index.
    #[must_use]
    pub fn child(&self, segment: &PathSegment) -> Option<&Spec> {
        match (self, segment) {
            (Self::Map(map), PathSegment::Key(key)) => map.get(key),
            (Self::Map(map), PathSegment::Index(idx)) => map.get(&idx.to_string()),
            (Self::List(items), PathSegment::Index(idx)) => items.get(*idx),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Spec> {
        match (self, segment) {
            (Self::Map(map), PathSegment::Key(key)) => map.get_mut(key),
            (Self::Map(map), PathSegment::Index(idx)) => map.get_mut(&idx.to_string()),
            (Self::List(items), PathSegment::Index(idx)) => items.get_mut(*idx),
            _ => None,
        }
    }

    /// Get the node at a path
    #[must_use]
    pub fn get_path(&self, path: &SpecPath) -> Option<&Spec> {
        path.iter().try_fold(self, Spec::child)
    }

    /// Get the node at a path mutably
    #[must_use]
    pub fn get_path_mut(&mut self, path: &SpecPath) -> Option<&mut Spec> {
        let mut node = self;
        for segment in path.iter() {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// Assign a value at a path
    ///
    /// The parent must exist. Mapping parents accept new keys; sequence
    /// parents only accept existing indices. The root path replaces `self`.
    ///
    /// # Errors
    /// Returns [`SpecError::PathNotFound`] if the parent is missing or has
    /// the wrong shape
    pub fn set_path(&mut self, path: &SpecPath, value: Spec) -> Result<(), SpecError> {
        let Some(last) = path.last() else {
            *self = value;
            return Ok(());
        };
        let parent = path.parent().unwrap_or_default();
        let not_found = || SpecError::PathNotFound(path.clone());

        match (self.get_path_mut(&parent).ok_or_else(not_found)?, last) {
            (Self::Map(map), PathSegment::Key(key)) => {
                map.insert(key.clone(), value);
                Ok(())
            }
            (Self::List(items), PathSegment::Index(idx)) => {
                let slot = items.get_mut(*idx).ok_or_else(not_found)?;
                *slot = value;
                Ok(())
            }
            _ => Err(not_found()),
        }
    }

    /// Concrete JSON value of a leaf
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> Option<&JsonValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Human-readable kind name
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Value(v) => json_type_name(v),
            Self::Map(_) => "map",
            Self::List(_) => "list",
            Self::Grid(_) => "grid",
            Self::Domain(_) => "domain",
        }
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Domains compare by identity; everything else structurally.
impl PartialEq for Spec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Grid(a), Self::Grid(b)) => a == b,
            (Self::Domain(a), Self::Domain(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Spec {
    fn default() -> Self {
        Self::map()
    }
}

impl Display for Spec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, child)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {child}")?;
                }
                f.write_str("}")
            }
            Self::List(items) => {
                f.write_str("[")?;
                for (i, child) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("]")
            }
            Self::Grid(axis) => write!(f, "grid_search({})", Self::List(axis.values.clone())),
            Self::Domain(domain) => write!(f, "<{domain:?}>"),
        }
    }
}

impl From<bool> for Spec {
    fn from(v: bool) -> Self {
        Self::Value(v.into())
    }
}

impl From<i32> for Spec {
    fn from(v: i32) -> Self {
        Self::Value(v.into())
    }
}

impl From<i64> for Spec {
    fn from(v: i64) -> Self {
        Self::Value(v.into())
    }
}

impl From<f64> for Spec {
    fn from(v: f64) -> Self {
        Self::Value(v.into())
    }
}

impl From<&str> for Spec {
    fn from(v: &str) -> Self {
        Self::Value(v.into())
    }
}

impl From<String> for Spec {
    fn from(v: String) -> Self {
        Self::Value(v.into())
    }
}

impl From<Vec<Spec>> for Spec {
    fn from(items: Vec<Spec>) -> Self {
        Self::List(items)
    }
}

impl From<Arc<dyn Domain>> for Spec {
    fn from(domain: Arc<dyn Domain>) -> Self {
        Self::Domain(domain)
    }
}

impl From<GridAxis> for Spec {
    fn from(axis: GridAxis) -> Self {
        Self::Grid(axis)
    }
}

impl<K: Into<String>> FromIterator<(K, Spec)> for Spec {
    fn from_iter<I: IntoIterator<Item = (K, Spec)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Ordered candidate set of a grid axis
///
/// Emptiness is checked where the axis is discovered, see
/// [`GridAxis::validated`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    values: Vec<Spec>,
}

impl GridAxis {
    /// Create axis from candidates
    #[inline]
    #[must_use]
    pub fn new(values: Vec<Spec>) -> Self {
        Self { values }
    }

    /// Read the candidate set of a `{"grid_search": ...}` descriptor
    ///
    /// JSON array candidates are converted the way [`SpecLoader`] converts
    /// documents, so nested descriptors inside them are recognised.
    ///
    /// # Errors
    /// Returns [`SpecError::MalformedGridAxis`] unless the candidates form a
    /// non-empty sequence
    pub fn from_descriptor(candidates: &Spec, path: &SpecPath) -> Result<Self, SpecError> {
        let values = match candidates {
            Spec::List(items) => items.clone(),
            Spec::Value(JsonValue::Array(items)) => {
                SpecLoader::new().load_items(items.clone(), path)?
            }
            other => {
                return Err(SpecError::malformed_grid(
                    path,
                    format!("expected a list of candidate values, got {}", other.type_name()),
                ))
            }
        };
        Self::new(values).validated(path)
    }

    /// Reject an empty candidate set
    ///
    /// # Errors
    /// Returns [`SpecError::MalformedGridAxis`] if there are no candidates
    pub fn validated(self, path: &SpecPath) -> Result<Self, SpecError> {
        if self.values.is_empty() {
            return Err(SpecError::malformed_grid(path, "candidate list is empty"));
        }
        Ok(self)
    }

    /// Candidate values in enumeration order
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Spec] {
        &self.values
    }

    /// Number of candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if axis has no candidates
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Grid axis over `values`, for embedding in a spec
///
/// # Examples
/// ```
/// use sweep_spec::{grid_search, Spec};
///
/// let spec: Spec = [("lr", grid_search([0.1, 0.01]))].into_iter().collect();
/// assert!(!spec.is_concrete());
/// ```
pub fn grid_search<I, T>(values: I) -> Spec
where
    I: IntoIterator<Item = T>,
    T: Into<Spec>,
{
    Spec::Grid(GridAxis::new(values.into_iter().map(Into::into).collect()))
}
