//! Dependency resolution
//!
//! Samples stochastic domains in place. Domains may read other paths through
//! the guard; a read of something still unresolved is retried on the next
//! pass, so forward references settle without any ordering from the caller.
//! Passes are capped; a cycle exhausts the cap instead of spinning.

use indexmap::IndexMap;
use rand::RngCore;
use sweep_spec::{DependencyNotReady, SampleError, Spec, SpecGuard, SpecPath};
use tracing::{debug, trace};

use crate::error::{VariantError, VariantResult};
use crate::partition::DomainVar;

/// Path to concrete value, in resolution order
pub type ResolvedVars = IndexMap<SpecPath, Spec>;

/// What to do when the pass cap is reached with domains left over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Fail with [`VariantError::UnresolvableDependency`]
    Strict,
    /// Report a partial [`Resolution`]
    Lenient,
}

/// Outcome of [`resolve_domain_vars`]
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Whether every domain was sampled
    pub complete: bool,
    /// Sampled values by path
    pub resolved: ResolvedVars,
}

/// Sample `domains` into `spec`
///
/// Each pass tries every domain still outstanding, in the order given.
/// Successes are written into `spec` immediately, so later domains in the
/// same pass can read them. Resolution stops after a pass with nothing left
/// waiting, or after `max_passes` passes (at least one always runs).
///
/// # Errors
/// - [`VariantError::UnresolvableDependency`] in strict mode when the cap is hit
/// - [`VariantError::SampleFailed`] when a domain fails for a non-retryable reason
pub fn resolve_domain_vars(
    spec: &mut Spec,
    domains: &[DomainVar],
    mode: ResolveMode,
    max_passes: usize,
    rng: &mut dyn RngCore,
) -> VariantResult<Resolution> {
    let max_passes = max_passes.max(1);
    let mut resolved = ResolvedVars::new();
    let mut outstanding: Vec<&DomainVar> = domains.iter().collect();
    let mut passes = 0;
    let mut blocked: Option<(SpecPath, DependencyNotReady)>;

    loop {
        passes += 1;
        blocked = None;
        let mut waiting = Vec::new();

        for var in outstanding {
            let outcome = var.domain.sample(&SpecGuard::new(spec), rng);
            match outcome {
                Ok(value) => {
                    trace!(path = %var.path, pass = passes, "domain sampled");
                    spec.set_path(&var.path, value.clone())?;
                    resolved.insert(var.path.clone(), value);
                }
                Err(SampleError::NotReady(dependency)) => {
                    trace!(path = %var.path, %dependency, pass = passes, "domain not ready");
                    blocked = Some((var.path.clone(), dependency));
                    waiting.push(var);
                }
                Err(SampleError::Invalid { reason }) => {
                    return Err(VariantError::SampleFailed {
                        path: var.path.clone(),
                        reason,
                    });
                }
            }
        }

        outstanding = waiting;
        if blocked.is_none() || passes >= max_passes {
            break;
        }
    }

    debug!(
        sampled = resolved.len(),
        outstanding = outstanding.len(),
        passes,
        "domain resolution finished"
    );

    match blocked {
        None => Ok(Resolution {
            complete: true,
            resolved,
        }),
        Some((path, dependency)) => match mode {
            ResolveMode::Strict => Err(VariantError::UnresolvableDependency {
                path,
                dependency: dependency.path,
                reason: dependency.reason,
                passes,
            }),
            ResolveMode::Lenient => Ok(Resolution {
                complete: false,
                resolved,
            }),
        },
    }
}
