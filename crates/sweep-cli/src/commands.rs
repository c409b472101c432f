//! Subcommand implementations
//!
//! Each command writes to the supplied writer so it can be exercised without
//! a terminal.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use sweep_spec::{FunctionRegistry, Spec, SpecLoader};
use sweep_variant::{generate_variants, parse_spec_vars, GeneratorConfig, GridSearch, Variant};
use tracing::{debug, info};

/// Flags of `sweep expand`
#[derive(Debug, Clone, Default)]
pub(crate) struct ExpandOptions {
    pub(crate) config_file: Option<std::path::PathBuf>,
    pub(crate) seed: Option<u64>,
    pub(crate) constant_grid: bool,
    pub(crate) max_passes: Option<usize>,
    pub(crate) limit: Option<usize>,
}

/// Read a template, resolving `eval` names against the built-in functions.
pub(crate) fn load_template(path: &Path) -> Result<Spec> {
    SpecLoader::with_registry(FunctionRegistry::with_builtins())
        .from_file(path)
        .with_context(|| format!("failed to load template {}", path.display()))
}

/// Read a [`GeneratorConfig`] from a JSON or YAML file.
pub(crate) fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
    };
    Ok(config)
}

fn generator_config(options: &ExpandOptions) -> Result<GeneratorConfig> {
    let mut config = match &options.config_file {
        Some(path) => load_config(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }
    if options.constant_grid {
        config = config.with_constant_grid_search(true);
    }
    if let Some(passes) = options.max_passes {
        config = config.with_max_resolution_passes(passes);
    }
    Ok(config)
}

fn variant_record(variant: &Variant) -> Result<JsonValue> {
    let mut vars = JsonMap::with_capacity(variant.resolved.len());
    for (path, value) in &variant.resolved {
        let value = value
            .to_json()
            .with_context(|| format!("resolved value at `{path}` is not concrete"))?;
        vars.insert(path.to_string(), value);
    }
    Ok(json!({
        "tag": variant.tag(),
        "vars": vars,
        "config": variant.config()?,
    }))
}

/// `sweep expand`: one JSON object per variant
///
/// Returns the number of variants written.
pub(crate) fn expand(template: &Path, options: &ExpandOptions, out: &mut dyn Write) -> Result<usize> {
    let spec = load_template(template)?;
    let config = generator_config(options)?;
    debug!(?config, "expanding template");

    let limit = options.limit.unwrap_or(usize::MAX);
    let mut written = 0;
    for variant in generate_variants(&spec, config).take(limit) {
        let variant = variant.with_context(|| format!("failed to expand {}", template.display()))?;
        serde_json::to_writer(&mut *out, &variant_record(&variant)?)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    info!(variants = written, "expansion finished");
    Ok(written)
}

/// `sweep inspect`: paths of resolved, grid and domain entries
pub(crate) fn inspect(template: &Path, out: &mut dyn Write) -> Result<()> {
    let spec = load_template(template)?;
    let vars = parse_spec_vars(&spec)?;

    writeln!(out, "resolved ({}):", vars.resolved.len())?;
    for (path, value) in &vars.resolved {
        writeln!(out, "  {path} = {value}")?;
    }
    writeln!(out, "grid ({}):", vars.grids.len())?;
    for grid in &vars.grids {
        writeln!(out, "  {} ({} candidates)", grid.path, grid.axis.len())?;
    }
    writeln!(out, "domain ({}):", vars.domains.len())?;
    for domain in &vars.domains {
        writeln!(out, "  {} {:?}", domain.path, domain.domain)?;
    }
    Ok(())
}

/// `sweep count`: number of top-level grid combinations
pub(crate) fn count(template: &Path, out: &mut dyn Write) -> Result<usize> {
    let spec = load_template(template)?;
    let vars = parse_spec_vars(&spec)?;
    let combinations = GridSearch::new(spec, vars.grids)?.len();
    writeln!(out, "{combinations}")?;
    Ok(combinations)
}
