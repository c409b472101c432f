//! Sampling domains
//!
//! A [`Domain`] turns a read-only, guarded view of the spec plus a random
//! source into a concrete value. Domains that reference other paths report
//! [`SampleError::NotReady`] until those paths are resolved; the caller
//! retries them on a later pass.

use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};

use crate::error::SpecError;
use crate::guard::SpecGuard;
use crate::path::SpecPath;
use crate::spec::Spec;

/// Sampling capability of a spec leaf
pub trait Domain: fmt::Debug + Send + Sync {
    /// Draw a value
    ///
    /// The returned spec may itself contain grids or domains; those are
    /// expanded by the variant generator on the next level down.
    ///
    /// # Errors
    /// [`SampleError::NotReady`] when a referenced path is unresolved,
    /// [`SampleError::Invalid`] for anything that will not change on retry
    fn sample(&self, spec: &SpecGuard<'_>, rng: &mut dyn RngCore) -> Result<Spec, SampleError>;

    /// Whether this domain is enumerated rather than sampled
    fn is_grid(&self) -> bool {
        false
    }

    /// Candidates to enumerate when [`Domain::is_grid`] is true
    fn grid_values(&self) -> Option<&[Spec]> {
        None
    }
}

/// Why a referenced path could not be read yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// Target is a domain that has not been sampled
    Domain,
    /// Target is a grid axis that has not been expanded
    Grid,
    /// Target does not exist (yet)
    Missing,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Domain => "an unsampled domain",
            Self::Grid => "an unexpanded grid axis",
            Self::Missing => "missing",
        })
    }
}

/// A dereference touched an unresolved path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{path}` is {reason}")]
pub struct DependencyNotReady {
    /// Path that was dereferenced
    pub path: SpecPath,
    /// What was found there
    pub reason: NotReadyReason,
}

/// Sample failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// Dependency not resolved yet; retry on a later pass
    #[error("dependency not ready: {0}")]
    NotReady(#[from] DependencyNotReady),

    /// Sampling cannot succeed
    #[error("{reason}")]
    Invalid {
        /// What went wrong
        reason: String,
    },
}

impl SampleError {
    /// Create an invalid-sample error
    #[inline]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Check if the sample may succeed on a later pass
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }
}

/// Uniform float in `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    low: f64,
    high: f64,
}

impl Uniform {
    /// Create domain
    ///
    /// # Errors
    /// Returns error unless `low < high` and both are finite
    pub fn new(low: f64, high: f64) -> Result<Self, SpecError> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(SpecError::InvalidDomain(format!(
                "uniform bounds must satisfy low < high, got [{low}, {high})"
            )));
        }
        Ok(Self { low, high })
    }

    /// Uniform float in `[0, 1)`
    #[inline]
    #[must_use]
    pub const fn unit() -> Self {
        Self {
            low: 0.0,
            high: 1.0,
        }
    }
}

impl Domain for Uniform {
    fn sample(&self, _spec: &SpecGuard<'_>, rng: &mut dyn RngCore) -> Result<Spec, SampleError> {
        Ok(Spec::from(rng.random_range(self.low..self.high)))
    }
}

/// Uniform integer in `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandInt {
    low: i64,
    high: i64,
}

impl RandInt {
    /// Create domain
    ///
    /// # Errors
    /// Returns error unless `low < high`
    pub fn new(low: i64, high: i64) -> Result<Self, SpecError> {
        if low >= high {
            return Err(SpecError::InvalidDomain(format!(
                "randint bounds must satisfy low < high, got [{low}, {high})"
            )));
        }
        Ok(Self { low, high })
    }
}

impl Domain for RandInt {
    fn sample(&self, _spec: &SpecGuard<'_>, rng: &mut dyn RngCore) -> Result<Spec, SampleError> {
        Ok(Spec::from(rng.random_range(self.low..self.high)))
    }
}

/// Gaussian float with the given mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
}

impl Normal {
    /// Create domain
    ///
    /// # Errors
    /// Returns error unless both parameters are finite and `std_dev > 0`
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, SpecError> {
        if !(mean.is_finite() && std_dev.is_finite() && std_dev > 0.0) {
            return Err(SpecError::InvalidDomain(format!(
                "normal needs a finite mean and positive std_dev, got ({mean}, {std_dev})"
            )));
        }
        Ok(Self { mean, std_dev })
    }
}

impl Domain for Normal {
    fn sample(&self, _spec: &SpecGuard<'_>, rng: &mut dyn RngCore) -> Result<Spec, SampleError> {
        // Box-Muller; u1 in (0, 1] keeps the log finite.
        let u1 = 1.0 - rng.random::<f64>();
        let u2 = rng.random::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        Ok(Spec::from(self.mean + self.std_dev * z))
    }
}

/// Choice among fixed candidates
///
/// Sampled uniformly by default; [`Categorical::grid`] turns it into a grid
/// axis enumerating every candidate instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    categories: Vec<Spec>,
    grid: bool,
}

impl Categorical {
    /// Create domain
    ///
    /// # Errors
    /// Returns error if `categories` is empty
    pub fn new(categories: Vec<Spec>) -> Result<Self, SpecError> {
        if categories.is_empty() {
            return Err(SpecError::InvalidDomain(
                "categorical needs at least one category".to_string(),
            ));
        }
        Ok(Self {
            categories,
            grid: false,
        })
    }

    /// Enumerate candidates instead of sampling
    #[inline]
    #[must_use]
    pub fn grid(mut self) -> Self {
        self.grid = true;
        self
    }

    /// Candidates
    #[inline]
    #[must_use]
    pub fn categories(&self) -> &[Spec] {
        &self.categories
    }
}

impl Domain for Categorical {
    fn sample(&self, _spec: &SpecGuard<'_>, rng: &mut dyn RngCore) -> Result<Spec, SampleError> {
        let idx = rng.random_range(0..self.categories.len());
        Ok(self.categories[idx].clone())
    }

    fn is_grid(&self) -> bool {
        self.grid
    }

    fn grid_values(&self) -> Option<&[Spec]> {
        self.grid.then_some(self.categories.as_slice())
    }
}

/// Sampling function signature used by [`FnDomain`]
pub type SampleFn =
    Arc<dyn Fn(&SpecGuard<'_>, &mut dyn RngCore) -> Result<Spec, SampleError> + Send + Sync>;

/// Domain backed by a named function with declared dependencies
///
/// Every declared dependency must be fully resolved before the function is
/// called; undeclared reads through the guard are still checked lazily.
#[derive(Clone)]
pub struct FnDomain {
    name: String,
    depends_on: Vec<SpecPath>,
    func: SampleFn,
}

impl FnDomain {
    /// Create domain with no declared dependencies
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&SpecGuard<'_>, &mut dyn RngCore) -> Result<Spec, SampleError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            func: Arc::new(func),
        }
    }

    /// Declare a dependency path
    #[inline]
    #[must_use]
    pub fn depends_on(mut self, path: SpecPath) -> Self {
        self.depends_on.push(path);
        self
    }

    /// Function name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependencies
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[SpecPath] {
        &self.depends_on
    }
}

impl fmt::Debug for FnDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDomain")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

impl Domain for FnDomain {
    fn sample(&self, spec: &SpecGuard<'_>, rng: &mut dyn RngCore) -> Result<Spec, SampleError> {
        for dep in &self.depends_on {
            spec.require(dep)?;
        }
        (self.func)(spec, rng)
    }
}
