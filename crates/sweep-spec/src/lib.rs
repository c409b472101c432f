//! Sweep Spec
//!
//! Path-addressed search-space templates.
//!
//! # Core Concepts
//!
//! - [`Spec`]: Nested mapping/sequence template with concrete, grid and domain leaves
//! - [`SpecPath`]: Key/index addressing of nodes within a spec
//! - [`Domain`]: Sampling capability of a leaf (`sample`, `is_grid`)
//! - [`SpecGuard`]: Read-only view that refuses to hand out unresolved values
//! - [`SpecLoader`]: JSON / YAML templates with `grid_search` and `eval` descriptors
//! - [`FunctionRegistry`]: Named domains and parameterised builders for `eval` descriptors
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use sweep_spec::{FunctionRegistry, Spec, SpecLoader};
//!
//! let loader = SpecLoader::with_registry(FunctionRegistry::with_builtins());
//! let spec = loader
//!     .load_value(json!({
//!         "lr": {"grid_search": [0.1, 0.01]},
//!         "dropout": {"eval": "random"},
//!     }))
//!     .unwrap();
//! assert!(!spec.is_concrete());
//! ```

#![warn(unreachable_pub)]

// Core modules
mod builtins;
mod domain;
mod error;
mod guard;
mod loader;
mod path;
mod registry;
mod spec;

// Re-exports
pub use domain::{
    Categorical, DependencyNotReady, Domain, FnDomain, Normal, NotReadyReason, RandInt,
    SampleError, SampleFn, Uniform,
};
pub use error::SpecError;
pub use guard::SpecGuard;
pub use loader::{SpecLoader, DEPENDS_ON_KEY, EVAL_FN_KEY, EVAL_KEY};
pub use path::{PathError, PathSegment, SpecPath};
pub use registry::{DomainBuilder, EvalArgs, FunctionRegistry};
pub use spec::{grid_search, GridAxis, Spec, GRID_SEARCH_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
