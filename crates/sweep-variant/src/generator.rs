//! Variant generator
//!
//! Expands a template level by level. Each level partitions the spec, walks
//! its grid combinations, samples its domains against each combination and
//! hands the result to the next level down, until a level has nothing left to
//! expand. Levels live on an explicit stack so the generator is an ordinary
//! lazy [`Iterator`].
//!
//! ```text
//! partition ──► concrete? ──yes──► emit
//!                  │no
//!                  ▼
//!          push level ──► next combination ──► resolve domains ──► partition
//!                  ▲              │exhausted
//!                  └──── pop ◄────┘
//! ```

use std::iter::FusedIterator;

use rand::rngs::StdRng;
use rand::RngCore;
use serde_json::Value as JsonValue;
use sweep_spec::{Spec, SpecError, SpecPath};
use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::error::{VariantError, VariantResult};
use crate::format::format_vars;
use crate::grid::GridSearch;
use crate::partition::{parse_spec_vars, DomainVar};
use crate::resolve::{resolve_domain_vars, ResolveMode, ResolvedVars};

/// One concrete instantiation of a template
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Values chosen for every grid axis and domain, by path
    pub resolved: ResolvedVars,
    /// Fully substituted spec
    pub spec: Spec,
}

impl Variant {
    /// Spec as plain JSON
    ///
    /// # Errors
    /// Never fails for a variant produced by [`VariantGenerator`]
    pub fn config(&self) -> Result<JsonValue, SpecError> {
        self.spec.to_json()
    }

    /// Short `key=value,...` tag of the resolved variables
    #[must_use]
    pub fn tag(&self) -> String {
        format_vars(&self.resolved)
    }

    /// Split into resolved variables and spec
    #[must_use]
    pub fn into_parts(self) -> (ResolvedVars, Spec) {
        (self.resolved, self.spec)
    }
}

/// Expand `spec` into its variants
///
/// Sampling uses [`GeneratorConfig::rng`].
///
/// # Examples
/// ```
/// use serde_json::json;
/// use sweep_spec::Spec;
/// use sweep_variant::{generate_variants, GeneratorConfig};
///
/// let spec = Spec::from_json(json!({
///     "lr": {"grid_search": [0.1, 0.01]},
///     "epochs": 10,
/// }))
/// .unwrap();
///
/// let configs: Vec<_> = generate_variants(&spec, GeneratorConfig::new())
///     .map(|v| v.unwrap().config().unwrap())
///     .collect();
/// assert_eq!(configs, vec![
///     json!({"lr": 0.1, "epochs": 10}),
///     json!({"lr": 0.01, "epochs": 10}),
/// ]);
/// ```
pub fn generate_variants(spec: &Spec, config: GeneratorConfig) -> VariantGenerator<StdRng> {
    let rng = config.rng();
    VariantGenerator::with_rng(spec, config, rng)
}

/// One expanded level
#[derive(Debug)]
struct Frame {
    combos: GridSearch,
    grid_paths: Vec<SpecPath>,
    /// Domains sampled afresh for every combination
    domains: Vec<DomainVar>,
    /// Values fixed for the whole level (constant grid search)
    pre_resolved: ResolvedVars,
    /// Values chosen for the combination currently being expanded
    current: ResolvedVars,
}

/// Lazy iterator over the variants of a template
///
/// Yields `Err` at most once; the iterator is exhausted afterwards. Variants
/// yielded before the error remain valid.
#[derive(Debug)]
pub struct VariantGenerator<R = StdRng> {
    config: GeneratorConfig,
    rng: R,
    pending: Option<Spec>,
    stack: Vec<Frame>,
    failed: bool,
}

impl<R: RngCore> VariantGenerator<R> {
    /// Expand `spec` drawing randomness from `rng`
    ///
    /// `config.seed` is ignored; `rng` is used as given.
    pub fn with_rng(spec: &Spec, config: GeneratorConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            pending: Some(spec.clone()),
            stack: Vec::new(),
            failed: false,
        }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Current nesting depth
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn step(&mut self) -> Option<VariantResult<Variant>> {
        loop {
            if let Some(spec) = self.pending.take() {
                match self.expand(spec) {
                    Ok(Some(terminal)) => return Some(self.emit(terminal)),
                    Ok(None) => {}
                    Err(e) => return Some(Err(e)),
                }
            }

            let passes = self.config.max_resolution_passes;
            let frame = self.stack.last_mut()?;
            let Some(mut combo) = frame.combos.next() else {
                self.stack.pop();
                continue;
            };

            frame.current.clone_from(&frame.pre_resolved);
            if !frame.domains.is_empty() {
                match resolve_domain_vars(
                    &mut combo,
                    &frame.domains,
                    ResolveMode::Strict,
                    passes,
                    &mut self.rng,
                ) {
                    Ok(resolution) => frame.current.extend(resolution.resolved),
                    Err(e) => return Some(Err(e)),
                }
            }
            self.pending = Some(combo);
        }
    }

    /// Partition one level; returns the spec back when it is already concrete.
    fn expand(&mut self, spec: Spec) -> VariantResult<Option<Spec>> {
        let vars = parse_spec_vars(&spec)?;
        if vars.is_resolved() {
            return Ok(Some(spec));
        }

        debug!(
            depth = self.stack.len(),
            grids = vars.grids.len(),
            domains = vars.domains.len(),
            "expanding level"
        );

        let mut template = spec;
        let mut domains = vars.domains;
        let mut pre_resolved = ResolvedVars::new();

        if self.config.constant_grid_search && !domains.is_empty() {
            let resolution = resolve_domain_vars(
                &mut template,
                &domains,
                ResolveMode::Lenient,
                self.config.max_resolution_passes,
                &mut self.rng,
            )?;
            domains.retain(|d| !resolution.resolved.contains_key(&d.path));
            if !resolution.complete {
                debug!(
                    deferred = domains.len(),
                    "constant grid search left domains for per-combination resolution"
                );
            }
            pre_resolved = resolution.resolved;
        }

        let grid_paths = vars.grids.iter().map(|g| g.path.clone()).collect();
        let combos = GridSearch::new(template, vars.grids)?;
        self.stack.push(Frame {
            combos,
            grid_paths,
            domains,
            pre_resolved,
            current: ResolvedVars::new(),
        });
        Ok(None)
    }

    fn emit(&self, spec: Spec) -> VariantResult<Variant> {
        assert!(
            spec.is_concrete(),
            "emitted variant still has unresolved values: {spec}"
        );

        let mut resolved = ResolvedVars::new();
        for frame in self.stack.iter().rev() {
            resolved = merge_level(&frame.current, &frame.grid_paths, &spec, resolved)?;
        }
        trace!(tag = %format_vars(&resolved), "variant emitted");
        Ok(Variant { resolved, spec })
    }
}

/// Combine one level's choices with those bubbled up from below
///
/// Grid values and values that were still partial at this level are read
/// back from the final spec, so they reflect everything nested levels chose.
fn merge_level(
    current: &ResolvedVars,
    grid_paths: &[SpecPath],
    spec: &Spec,
    nested: ResolvedVars,
) -> VariantResult<ResolvedVars> {
    let mut merged = ResolvedVars::with_capacity(current.len() + grid_paths.len() + nested.len());

    for (path, value) in current {
        let value = match spec.get_path(path) {
            Some(fin) if !value.is_concrete() => fin.clone(),
            _ => value.clone(),
        };
        merged.insert(path.clone(), value);
    }
    for path in grid_paths {
        if let Some(value) = spec.get_path(path) {
            merged.insert(path.clone(), value.clone());
        }
    }

    for (path, incoming) in nested {
        if let Some(existing) = merged.get(&path) {
            if *existing != incoming && existing.is_concrete() {
                return Err(VariantError::AmbiguousResolution {
                    path,
                    existing: Box::new(existing.clone()),
                    incoming: Box::new(incoming),
                });
            }
        }
        merged.insert(path, incoming);
    }
    Ok(merged)
}

impl<R: RngCore> Iterator for VariantGenerator<R> {
    type Item = VariantResult<Variant>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.step();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
            self.pending = None;
            self.stack.clear();
        }
        item
    }
}

impl<R: RngCore> FusedIterator for VariantGenerator<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sweep_spec::Uniform;

    fn path(s: &str) -> SpecPath {
        s.parse().unwrap()
    }

    fn level(entries: &[(&str, Spec)]) -> ResolvedVars {
        entries
            .iter()
            .map(|(p, v)| (path(p), v.clone()))
            .collect()
    }

    #[test]
    fn merge_reads_grid_values_from_final_spec() {
        let spec = Spec::from_json(json!({"a": {"x": 1}, "b": 2})).unwrap();
        let merged = merge_level(
            &ResolvedVars::new(),
            &[path("a")],
            &spec,
            level(&[("a.x", Spec::from(1))]),
        )
        .unwrap();

        assert_eq!(merged.get(&path("a")).unwrap().to_json().unwrap(), json!({"x": 1}));
        assert_eq!(merged.get(&path("a.x")), Some(&Spec::from(1)));
    }

    #[test]
    fn merge_refreshes_partial_domain_values() {
        let spec = Spec::from_json(json!({"d": {"inner": 3}})).unwrap();
        let partial: Spec = [("inner", sweep_spec::grid_search([3, 4]))].into_iter().collect();
        let merged = merge_level(
            &level(&[("d", partial)]),
            &[],
            &spec,
            level(&[("d.inner", Spec::from(3))]),
        )
        .unwrap();

        assert!(merged.get(&path("d")).unwrap().is_concrete());
        assert_eq!(merged.keys().map(ToString::to_string).collect::<Vec<_>>(), ["d", "d.inner"]);
    }

    #[test]
    fn merge_rejects_conflicting_concrete_values() {
        let spec = Spec::from_json(json!({"a": 1})).unwrap();
        let err = merge_level(
            &level(&[("a", Spec::from(1))]),
            &[],
            &spec,
            level(&[("a", Spec::from(2))]),
        )
        .unwrap_err();

        assert!(err.is_ambiguous());
        assert_eq!(err.path(), Some(&path("a")));
    }

    #[test]
    fn merge_overrides_unresolved_placeholder() {
        let spec = Spec::from_json(json!({"a": 0.5})).unwrap();
        let domain = Spec::domain(Uniform::unit());
        let mut current = level(&[("a", domain)]);
        current.insert(path("b"), Spec::domain(Uniform::unit()));
        let merged = merge_level(&current, &[], &spec, level(&[("b", Spec::from(0.25))])).unwrap();

        assert_eq!(merged.get(&path("a")), Some(&Spec::from(0.5)));
        assert_eq!(merged.get(&path("b")), Some(&Spec::from(0.25)));
    }

    #[test]
    fn depth_tracks_levels() {
        let spec = Spec::from_json(json!({"a": {"grid_search": [1, 2]}})).unwrap();
        let mut variants = generate_variants(&spec, GeneratorConfig::new().with_seed(0));
        assert_eq!(variants.depth(), 0);
        variants.next().unwrap().unwrap();
        assert_eq!(variants.depth(), 1);
        variants.next().unwrap().unwrap();
        assert!(variants.next().is_none());
        assert_eq!(variants.depth(), 0);
    }
}
