//! Unresolved-access guard
//!
//! [`SpecGuard`] is the read-only view a [`crate::Domain`] samples against.
//! Every dereference checks the node it lands on: a live domain, an
//! unexpanded grid axis, or a missing child yields
//! [`SampleError::NotReady`] instead of a half-formed value.
//!
//! Concrete JSON objects and arrays stored as a single leaf are walked like
//! mappings and sequences.

use serde_json::Value as JsonValue;

use crate::domain::{DependencyNotReady, NotReadyReason, SampleError};
use crate::path::{PathSegment, SpecPath};
use crate::spec::{json_type_name, Spec};

#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Spec(&'a Spec),
    /// Inside a concrete leaf
    Json(&'a JsonValue),
}

impl<'a> Node<'a> {
    fn from_spec(spec: &'a Spec) -> Self {
        match spec {
            Spec::Value(v) => Self::Json(v),
            other => Self::Spec(other),
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Self::Spec(spec) => spec.type_name(),
            Self::Json(v) => json_type_name(v),
        }
    }
}

/// Guarded view of a spec node
#[derive(Debug, Clone)]
pub struct SpecGuard<'a> {
    node: Node<'a>,
    path: SpecPath,
}

impl<'a> SpecGuard<'a> {
    /// View over the spec root
    #[inline]
    #[must_use]
    pub fn new(spec: &'a Spec) -> Self {
        Self {
            node: Node::from_spec(spec),
            path: SpecPath::root(),
        }
    }

    /// Path of the viewed node
    #[inline]
    #[must_use]
    pub fn path(&self) -> &SpecPath {
        &self.path
    }

    /// Mapping child by key
    ///
    /// # Errors
    /// `NotReady` if the child is missing or unresolved
    pub fn get(&self, key: &str) -> Result<SpecGuard<'a>, SampleError> {
        self.step(&PathSegment::Key(key.to_string()))
    }

    /// Sequence child by index
    ///
    /// # Errors
    /// `NotReady` if the child is missing or unresolved
    pub fn index(&self, idx: usize) -> Result<SpecGuard<'a>, SampleError> {
        self.step(&PathSegment::Index(idx))
    }

    /// Descend along a path relative to this view
    ///
    /// Each intermediate node is checked, not only the target.
    ///
    /// # Errors
    /// `NotReady` at the first missing or unresolved node
    pub fn lookup(&self, path: &SpecPath) -> Result<SpecGuard<'a>, SampleError> {
        path.iter()
            .try_fold(self.clone(), |view, segment| view.step(segment))
    }

    /// Like [`SpecGuard::lookup`], but the whole target subtree must be resolved
    ///
    /// # Errors
    /// `NotReady` naming the first unresolved node found
    pub fn require(&self, path: &SpecPath) -> Result<SpecGuard<'a>, SampleError> {
        let view = self.lookup(path)?;
        view.ensure_resolved()?;
        Ok(view)
    }

    fn step(&self, segment: &PathSegment) -> Result<SpecGuard<'a>, SampleError> {
        let path = self.path.child(segment.clone());
        let node = match self.node {
            Node::Spec(spec) => {
                let Some(child) = spec.child(segment) else {
                    return Err(not_ready(path, NotReadyReason::Missing));
                };
                if let Some(reason) = child.pending_reason() {
                    return Err(not_ready(path, reason));
                }
                Node::from_spec(child)
            }
            Node::Json(value @ (JsonValue::Object(_) | JsonValue::Array(_))) => {
                let child = match (value, segment) {
                    (_, PathSegment::Key(key)) => value.get(key.as_str()),
                    (JsonValue::Object(map), PathSegment::Index(idx)) => map.get(&idx.to_string()),
                    (_, PathSegment::Index(idx)) => value.get(*idx),
                };
                match child {
                    Some(child) => Node::Json(child),
                    None => return Err(not_ready(path, NotReadyReason::Missing)),
                }
            }
            Node::Json(v) => {
                return Err(SampleError::invalid(format!(
                    "cannot descend into `{}`: {} {v}",
                    self.path,
                    json_type_name(v)
                )))
            }
        };
        Ok(SpecGuard { node, path })
    }

    fn ensure_resolved(&self) -> Result<(), SampleError> {
        let Node::Spec(spec) = self.node else {
            return Ok(());
        };
        match spec.first_unresolved() {
            None => Ok(()),
            Some((relative, reason)) => {
                let mut path = self.path.clone();
                for segment in relative.iter() {
                    path.push(segment.clone());
                }
                Err(not_ready(path, reason))
            }
        }
    }

    /// Concrete JSON value of a leaf
    ///
    /// # Errors
    /// `Invalid` if the node is a mapping or sequence
    pub fn value(&self) -> Result<&'a JsonValue, SampleError> {
        match self.node {
            Node::Json(v) => Ok(v),
            Node::Spec(spec) => Err(SampleError::invalid(format!(
                "`{}` is a {}, not a value",
                self.path,
                spec.type_name()
            ))),
        }
    }

    /// Leaf as float (integers are widened)
    ///
    /// # Errors
    /// `Invalid` if the leaf is not numeric
    pub fn as_f64(&self) -> Result<f64, SampleError> {
        self.value()?
            .as_f64()
            .ok_or_else(|| self.mismatch("number"))
    }

    /// Leaf as integer
    ///
    /// # Errors
    /// `Invalid` if the leaf is not an integer
    pub fn as_i64(&self) -> Result<i64, SampleError> {
        self.value()?
            .as_i64()
            .ok_or_else(|| self.mismatch("integer"))
    }

    /// Leaf as bool
    ///
    /// # Errors
    /// `Invalid` if the leaf is not a bool
    pub fn as_bool(&self) -> Result<bool, SampleError> {
        self.value()?
            .as_bool()
            .ok_or_else(|| self.mismatch("bool"))
    }

    /// Leaf as string
    ///
    /// # Errors
    /// `Invalid` if the leaf is not a string
    pub fn as_str(&self) -> Result<&'a str, SampleError> {
        self.value()?
            .as_str()
            .ok_or_else(|| self.mismatch("string"))
    }

    /// Deep copy of the viewed subtree
    ///
    /// # Errors
    /// `NotReady` if anything below is still unresolved
    pub fn to_spec(&self) -> Result<Spec, SampleError> {
        self.ensure_resolved()?;
        Ok(match self.node {
            Node::Spec(spec) => spec.clone(),
            Node::Json(v) => Spec::Value(v.clone()),
        })
    }

    fn mismatch(&self, expected: &str) -> SampleError {
        let found = match self.node {
            Node::Spec(spec) => spec.to_string(),
            Node::Json(v) => v.to_string(),
        };
        SampleError::invalid(format!(
            "`{}` is not a {expected}: {found} ({})",
            self.path,
            self.node.type_name()
        ))
    }
}

fn not_ready(path: SpecPath, reason: NotReadyReason) -> SampleError {
    SampleError::NotReady(DependencyNotReady { path, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Uniform;
    use crate::spec::grid_search;
    use serde_json::json;

    fn path(s: &str) -> SpecPath {
        s.parse().unwrap()
    }

    fn sample_spec() -> Spec {
        let mut spec =
            Spec::from_json(json!({"x": 5, "name": "mlp", "opt": {"lr": 0.1, "decay": 0}, "l": [1, 2]}))
                .unwrap();
        spec.set_path(&path("opt.decay"), Spec::domain(Uniform::new(0.0, 1.0).unwrap()))
            .unwrap();
        spec.set_path(&path("l.1"), grid_search([3, 4])).unwrap();
        spec
    }

    #[test]
    fn resolved_leaves_are_readable() {
        let spec = sample_spec();
        let guard = SpecGuard::new(&spec);
        assert_eq!(guard.get("x").unwrap().as_i64().unwrap(), 5);
        assert_eq!(guard.get("name").unwrap().as_str().unwrap(), "mlp");
        assert!((guard.lookup(&path("opt.lr")).unwrap().as_f64().unwrap() - 0.1).abs() < f64::EPSILON);
        assert_eq!(guard.lookup(&path("l.0")).unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn nested_views_are_guarded() {
        let spec = sample_spec();
        let guard = SpecGuard::new(&spec);
        let opt = guard.get("opt").unwrap();
        assert_eq!(opt.path(), &path("opt"));

        let err = opt.get("decay").unwrap_err();
        assert_eq!(
            err,
            SampleError::NotReady(DependencyNotReady {
                path: path("opt.decay"),
                reason: NotReadyReason::Domain,
            })
        );
    }

    #[test]
    fn grid_and_missing_are_not_ready() {
        let spec = sample_spec();
        let guard = SpecGuard::new(&spec);

        match guard.lookup(&path("l.1")) {
            Err(SampleError::NotReady(e)) => assert_eq!(e.reason, NotReadyReason::Grid),
            other => panic!("unexpected: {other:?}"),
        }
        match guard.lookup(&path("opt.momentum")) {
            Err(SampleError::NotReady(e)) => {
                assert_eq!(e.reason, NotReadyReason::Missing);
                assert_eq!(e.path, path("opt.momentum"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn require_checks_whole_subtree() {
        let spec = sample_spec();
        let guard = SpecGuard::new(&spec);

        assert!(guard.lookup(&path("opt")).is_ok());
        match guard.require(&path("opt")) {
            Err(SampleError::NotReady(e)) => assert_eq!(e.path, path("opt.decay")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(guard.get("opt").unwrap().to_spec().is_err());
        assert_eq!(guard.get("x").unwrap().to_spec().unwrap(), Spec::from(5));
    }

    #[test]
    fn type_mismatch_is_fatal() {
        let spec = sample_spec();
        let guard = SpecGuard::new(&spec);
        let err = guard.get("name").unwrap().as_f64().unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("`name` is not a number"));

        let err = guard.get("opt").unwrap().value().unwrap_err();
        assert!(!err.is_retryable());

        let err = guard.get("x").unwrap().get("deeper").unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn concrete_json_leaves_are_walked() {
        let mut spec = Spec::from_json(json!({"cfg": 0})).unwrap();
        spec.set_path(&path("cfg"), Spec::value(json!({"k": 3, "dims": [4, 8]})))
            .unwrap();
        let guard = SpecGuard::new(&spec);

        let cfg = guard.get("cfg").unwrap();
        assert_eq!(cfg.get("k").unwrap().as_i64().unwrap(), 3);
        assert_eq!(guard.lookup(&path("cfg.dims.1")).unwrap().as_i64().unwrap(), 8);
        assert_eq!(cfg.get("dims").unwrap().index(1).unwrap().path(), &path("cfg.dims.1"));
        assert_eq!(
            guard.require(&path("cfg")).unwrap().to_spec().unwrap(),
            Spec::value(json!({"k": 3, "dims": [4, 8]}))
        );

        match cfg.get("missing") {
            Err(SampleError::NotReady(e)) => {
                assert_eq!(e.reason, NotReadyReason::Missing);
                assert_eq!(e.path, path("cfg.missing"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        let err = guard.lookup(&path("cfg.k.deeper")).unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("cannot descend into `cfg.k`"));
    }
}
