//! Error types for spec construction and access

use std::path::PathBuf;

use crate::path::{PathError, SpecPath};

/// Spec construction and access errors
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Grid descriptor whose candidate set is not a non-empty sequence
    #[error("malformed grid axis at `{path}`: {reason}")]
    MalformedGridAxis {
        /// Location of the descriptor
        path: SpecPath,
        /// What was wrong with it
        reason: String,
    },

    /// Plain-data descriptor that cannot be interpreted
    #[error("invalid descriptor at `{path}`: {reason}")]
    InvalidDescriptor {
        /// Location of the descriptor
        path: SpecPath,
        /// What was wrong with it
        reason: String,
    },

    /// `{"eval": name}` naming a function missing from the registry
    #[error("unknown sampling function `{name}` at `{path}`")]
    UnknownFunction {
        /// Location of the descriptor
        path: SpecPath,
        /// Requested function name
        name: String,
    },

    /// Domain constructed with invalid parameters
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// Path does not address a node
    #[error("path not found: `{0}`")]
    PathNotFound(SpecPath),

    /// Conversion of a spec that still holds grids or domains
    #[error("`{path}` is unresolved")]
    Unresolved {
        /// First unresolved location found
        path: SpecPath,
    },

    /// Path parsing failed
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// JSON input could not be parsed
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// YAML input could not be parsed
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Template file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

impl SpecError {
    /// Check if error came from a malformed grid descriptor
    #[inline]
    #[must_use]
    pub fn is_malformed_grid(&self) -> bool {
        matches!(self, Self::MalformedGridAxis { .. })
    }

    /// Create a malformed-grid error
    #[inline]
    pub fn malformed_grid(path: &SpecPath, reason: impl Into<String>) -> Self {
        Self::MalformedGridAxis {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_grid_message_names_path() {
        let err = SpecError::malformed_grid(&SpecPath::from_keys(["lr"]), "expected a list");
        assert!(err.is_malformed_grid());
        let msg = err.to_string();
        assert!(msg.contains("`lr`"));
        assert!(msg.contains("expected a list"));
    }

    #[test]
    fn path_error_converts() {
        let err: SpecError = PathError::EmptySegment.into();
        assert!(!err.is_malformed_grid());
        assert!(err.to_string().contains("empty segment"));
    }
}
