//! Error types for variant generation
//!
//! Provides error handling for:
//! - Malformed templates (surfaced from [`SpecError`])
//! - Dependency cycles and references that never resolve
//! - Conflicting values for one path
//! - Domains that fail to sample

use sweep_spec::{NotReadyReason, Spec, SpecError, SpecPath};

/// Main variant generation error type
#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    /// Template could not be partitioned or substituted
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Pass cap exhausted with domains still unresolved
    #[error(
        "`{path}` could not be resolved after {passes} passes: depends on `{dependency}`, which is {reason}"
    )]
    UnresolvableDependency {
        /// Domain that could not be sampled
        path: SpecPath,
        /// Path it could not observe
        dependency: SpecPath,
        /// What was found at `dependency`
        reason: NotReadyReason,
        /// Passes attempted
        passes: usize,
    },

    /// Grid-chosen and recursively resolved values disagree
    ///
    /// Guard on the merge of nested levels. Each variant starts from fresh
    /// resolved values, so [`crate::generate_variants`] never yields it.
    #[error(
        "`{path}` could not be unambiguously resolved to a single value ({existing} vs {incoming}); consider simplifying the template"
    )]
    AmbiguousResolution {
        /// Conflicting path
        path: SpecPath,
        /// Value already recorded at this level
        existing: Box<Spec>,
        /// Value produced by the nested level
        incoming: Box<Spec>,
    },

    /// Domain failed for a reason retrying will not fix
    #[error("sampling `{path}` failed: {reason}")]
    SampleFailed {
        /// Domain that failed
        path: SpecPath,
        /// Failure reported by the domain
        reason: String,
    },
}

impl VariantError {
    /// Check if error is a dependency cycle or dangling reference
    #[inline]
    #[must_use]
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Self::UnresolvableDependency { .. })
    }

    /// Check if error is a resolution conflict
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousResolution { .. })
    }

    /// Check if error came from a malformed grid descriptor
    #[inline]
    #[must_use]
    pub fn is_malformed_grid(&self) -> bool {
        matches!(self, Self::Spec(e) if e.is_malformed_grid())
    }

    /// Path the error is about, when there is one
    #[must_use]
    pub fn path(&self) -> Option<&SpecPath> {
        match self {
            Self::Spec(
                SpecError::MalformedGridAxis { path, .. }
                | SpecError::InvalidDescriptor { path, .. }
                | SpecError::UnknownFunction { path, .. }
                | SpecError::Unresolved { path },
            )
            | Self::UnresolvableDependency { path, .. }
            | Self::AmbiguousResolution { path, .. }
            | Self::SampleFailed { path, .. } => Some(path),
            Self::Spec(SpecError::PathNotFound(path)) => Some(path),
            Self::Spec(_) => None,
        }
    }
}

/// Result type alias for variant generation
pub type VariantResult<T> = Result<T, VariantError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> SpecPath {
        s.parse().unwrap()
    }

    #[test]
    fn unresolvable_names_both_paths() {
        let err = VariantError::UnresolvableDependency {
            path: path("a"),
            dependency: path("b"),
            reason: NotReadyReason::Domain,
            passes: 20,
        };
        assert!(err.is_unresolvable());
        let msg = err.to_string();
        assert!(msg.contains("`a`"));
        assert!(msg.contains("`b`"));
        assert!(msg.contains("20 passes"));
        assert_eq!(err.path(), Some(&path("a")));
    }

    #[test]
    fn ambiguous_shows_both_values() {
        let err = VariantError::AmbiguousResolution {
            path: path("x.y"),
            existing: Box::new(Spec::from(1)),
            incoming: Box::new(Spec::from(2)),
        };
        assert!(err.is_ambiguous());
        let msg = err.to_string();
        assert!(msg.contains("`x.y`"));
        assert!(msg.contains("(1 vs 2)"));
    }

    #[test]
    fn malformed_grid_passes_through() {
        let err: VariantError = SpecError::malformed_grid(&path("lr"), "bad").into();
        assert!(err.is_malformed_grid());
        assert_eq!(err.path(), Some(&path("lr")));
        assert_eq!(err.to_string(), "malformed grid axis at `lr`: bad");
    }
}
