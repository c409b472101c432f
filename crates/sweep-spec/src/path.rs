//! Paths for addressing nodes within a spec
//!
//! Provides [`SpecPath`] for hierarchical addressing of leaves in a spec tree.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One step of a [`SpecPath`]
///
/// Mapping children are addressed by key, sequence children by index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl PathSegment {
    /// Key of this segment, if it addresses a mapping child
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }

    /// Index of this segment, if it addresses a sequence child
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Key(_) => None,
            Self::Index(idx) => Some(*idx),
        }
    }
}

/// Keys are escaped so that [`SpecPath`]'s `FromStr` reads them back: `.` and
/// `\` get a backslash, and so does an all-digit key.
impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                if is_index_like(key) {
                    f.write_str("\\")?;
                }
                for ch in key.chars() {
                    if matches!(ch, '.' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{ch}")?;
                }
                Ok(())
            }
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

fn is_index_like(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// Path within a spec tree
///
/// Paths are the unit of identity for resolved/unresolved tracking: two
/// leaves at different paths are independent even if structurally equal.
/// Ordering is lexicographic over segments, which fixes grid axis order.
///
/// # Examples
/// - `["model", "layers", 0, "units"]` → `model.layers.0.units`
/// - `["optimizer", "lr"]` → `optimizer.lr`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SpecPath(Vec<PathSegment>);

impl SpecPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path of mapping keys
    #[must_use]
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Append a segment in place
    #[inline]
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Remove the last segment in place
    #[inline]
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Check if this path is a prefix of another
    ///
    /// # Examples
    /// - `model.layers` is prefix of `model.layers.0`
    /// - `model.layers` is NOT prefix of `model.optimizer`
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.0.iter()
    }
}

impl Display for SpecPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Parses dotted paths
///
/// All-digit segments become [`PathSegment::Index`]. A backslash makes the
/// next character literal, and a segment containing an escape is always a
/// [`PathSegment::Key`]: `a\.b` is the single key `a.b`, `\0` is the key `0`.
impl FromStr for SpecPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut escaped = false;
        let mut chars = s.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    current.push(chars.next().ok_or(PathError::DanglingEscape)?);
                    escaped = true;
                }
                '.' => {
                    segments.push(segment(&current, escaped)?);
                    current.clear();
                    escaped = false;
                }
                other => current.push(other),
            }
        }
        segments.push(segment(&current, escaped)?);

        Ok(Self(segments))
    }
}

fn segment(text: &str, escaped: bool) -> Result<PathSegment, PathError> {
    if text.is_empty() {
        Err(PathError::EmptySegment)
    } else if !escaped && is_index_like(text) {
        text.parse::<usize>()
            .map(PathSegment::Index)
            .map_err(|_| PathError::InvalidIndex(text.to_string()))
    } else {
        Ok(PathSegment::Key(text.to_string()))
    }
}

impl From<Vec<PathSegment>> for SpecPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl From<&[PathSegment]> for SpecPath {
    fn from(segments: &[PathSegment]) -> Self {
        Self(segments.to_vec())
    }
}

/// Errors related to spec paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Numeric segment out of range
    #[error("invalid index segment: {0}")]
    InvalidIndex(String),

    /// Path ends in a lone backslash
    #[error("path ends with an unfinished escape")]
    DanglingEscape,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> SpecPath {
        s.parse().unwrap()
    }

    #[test]
    fn path_from_keys() {
        let p = SpecPath::from_keys(["a", "b"]);
        assert_eq!(p.segments(), &[PathSegment::from("a"), PathSegment::from("b")]);
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn path_root() {
        let p = SpecPath::root();
        assert!(p.is_empty());
        assert!(p.parent().is_none());
        assert_eq!(p.to_string(), "<root>");
    }

    #[test]
    fn path_parent_and_last() {
        let p = path("model.layers.0");
        assert_eq!(p.parent().unwrap(), path("model.layers"));
        assert_eq!(p.last(), Some(&PathSegment::Index(0)));
    }

    #[test]
    fn path_child_and_push_pop() {
        let base = SpecPath::from_keys(["layers"]);
        let child = base.child(2usize);
        assert_eq!(child.to_string(), "layers.2");

        let mut p = base.clone();
        p.push("units");
        assert_eq!(p.to_string(), "layers.units");
        assert_eq!(p.pop(), Some(PathSegment::from("units")));
        assert_eq!(p, base);
    }

    #[test]
    fn path_is_prefix_of() {
        let a = path("a.b");
        let b = path("a.b.c");
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(SpecPath::root().is_prefix_of(&a));
    }

    #[test]
    fn path_from_str_numeric_segments_are_indices() {
        let p = path("layers.10.units");
        assert_eq!(
            p.segments(),
            &[
                PathSegment::from("layers"),
                PathSegment::Index(10),
                PathSegment::from("units"),
            ]
        );
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<SpecPath, _> = "a..b".parse();
        assert_eq!(result, Err(PathError::EmptySegment));
    }

    #[test]
    fn path_ordering_is_lexicographic() {
        let mut paths = vec![path("b"), path("a.z"), path("a"), path("a.b")];
        paths.sort();
        let shown: Vec<_> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["a", "a.b", "a.z", "b"]);
    }

    #[test]
    fn path_display_round_trips() {
        let p = path("optimizer.schedule.3.lr");
        assert_eq!(path(&p.to_string()), p);
    }

    #[test]
    fn keys_that_look_like_paths_are_escaped() {
        let p = SpecPath::new(vec![
            PathSegment::from("a.b"),
            PathSegment::from("0"),
            PathSegment::Index(0),
            PathSegment::from("back\\slash"),
        ]);
        assert_eq!(p.to_string(), r"a\.b.\0.0.back\\slash");
        assert_eq!(path(&p.to_string()), p);

        assert_eq!(path(r"\7").last(), Some(&PathSegment::from("7")));
        assert_eq!("a\\".parse::<SpecPath>(), Err(PathError::DanglingEscape));
        assert_eq!("a.".parse::<SpecPath>(), Err(PathError::EmptySegment));
    }
}
