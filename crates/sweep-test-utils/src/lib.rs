//! Testing utilities for sweep workspace
//!
//! Shared fixtures for building specs and domains in tests.

#![allow(missing_docs)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value as JsonValue;
use sweep_spec::{
    grid_search, FnDomain, FunctionRegistry, SampleError, Spec, SpecLoader, SpecPath, Uniform,
};

pub fn path(s: &str) -> SpecPath {
    s.parse().unwrap()
}

/// Spec from JSON; `grid_search` descriptors become axes, `eval` uses [`test_registry`].
pub fn spec(json: JsonValue) -> Spec {
    SpecLoader::with_registry(test_registry()).load_value(json).unwrap()
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn uniform() -> Spec {
    Spec::domain(Uniform::unit())
}

/// Domain yielding the integer at `source` times `factor`.
pub fn times(source: &str, factor: i64) -> Spec {
    let source = path(source);
    let dep = source.clone();
    Spec::domain(
        FnDomain::new(format!("times_{factor}"), move |spec, _rng| {
            Ok(Spec::from(spec.lookup(&source)?.as_i64()? * factor))
        })
        .depends_on(dep),
    )
}

/// Domain yielding a copy of the subtree at `source`.
pub fn copy_of(source: &str) -> Spec {
    let source = path(source);
    let dep = source.clone();
    Spec::domain(
        FnDomain::new("copy", move |spec, _rng| spec.lookup(&source)?.to_spec()).depends_on(dep),
    )
}

/// Domain whose sample is itself a grid axis over `values`.
pub fn grid_sampler(values: Vec<i64>) -> Spec {
    Spec::domain(FnDomain::new("grid_sampler", move |_spec, _rng| {
        Ok(grid_search(values.iter().copied()))
    }))
}

/// Domain that always fails with a non-retryable error.
pub fn failing(reason: &'static str) -> Spec {
    Spec::domain(FnDomain::new("failing", move |_spec, _rng| {
        Err(SampleError::invalid(reason))
    }))
}

/// Builtins plus `double_x`, which reads the integer at `x`.
pub fn test_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::with_builtins();
    let x = path("x");
    registry.register_fn("double_x", vec![x.clone()], move |spec, _rng| {
        Ok(Spec::from(spec.lookup(&x)?.as_i64()? * 2))
    });
    registry
}

pub fn assert_concrete(spec: &Spec) {
    if let Some((at, reason)) = spec.first_unresolved() {
        panic!("expected concrete spec, `{at}` is {reason}");
    }
}
