//! Sweep Variant
//!
//! Lazy expansion of search-space templates into concrete variants.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Partition   │──►│ Grid Search  │──►│   Resolve    │
//! │ (grid/domain)│   │  (odometer)  │   │ (pass loop)  │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!         ▲                                     │
//!         └──────────── next level ◄────────────┘
//! ```
//!
//! - [`parse_spec_vars`]: classify leaves as resolved, grid or domain
//! - [`GridSearch`]: Cartesian product of grid axes, first axis fastest
//! - [`resolve_domain_vars`]: fixed-point sampling with forward references
//! - [`VariantGenerator`]: the levels above driven from an explicit stack
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use sweep_spec::{FunctionRegistry, SpecLoader};
//! use sweep_variant::{generate_variants, GeneratorConfig};
//!
//! let loader = SpecLoader::with_registry(FunctionRegistry::with_builtins());
//! let spec = loader
//!     .load_value(json!({
//!         "batch_size": {"grid_search": [16, 32, 64]},
//!         "dropout": {"eval": "random"},
//!     }))
//!     .unwrap();
//!
//! let variants: Vec<_> = generate_variants(&spec, GeneratorConfig::new().with_seed(7))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(variants.len(), 3);
//! assert!(variants.iter().all(|v| v.resolved.len() == 2));
//! ```

#![warn(unreachable_pub)]

mod config;
mod error;
mod format;
mod generator;
mod grid;
mod partition;
mod resolve;

pub use config::{GeneratorConfig, DEFAULT_MAX_RESOLUTION_PASSES};
pub use error::{VariantError, VariantResult};
pub use format::format_vars;
pub use generator::{generate_variants, Variant, VariantGenerator};
pub use grid::GridSearch;
pub use partition::{has_unresolved_values, parse_spec_vars, DomainVar, GridVar, SpecVars};
pub use resolve::{resolve_domain_vars, Resolution, ResolveMode, ResolvedVars};
pub use sweep_spec::grid_search;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
