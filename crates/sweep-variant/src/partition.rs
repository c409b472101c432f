//! Spec partitioning
//!
//! Splits a spec into concrete leaves, stochastic domains and grid axes,
//! each addressed by path.

use std::sync::Arc;

use sweep_spec::{Domain, GridAxis, Spec, SpecError, SpecPath};

/// Stochastic domain found at a path
#[derive(Debug, Clone)]
pub struct DomainVar {
    /// Location in the spec
    pub path: SpecPath,
    /// Domain to sample
    pub domain: Arc<dyn Domain>,
}

/// Grid axis found at a path
#[derive(Debug, Clone, PartialEq)]
pub struct GridVar {
    /// Location in the spec
    pub path: SpecPath,
    /// Candidates to enumerate
    pub axis: GridAxis,
}

/// Partition of a spec's leaves
#[derive(Debug, Clone, Default)]
pub struct SpecVars {
    /// Concrete leaves, in discovery order
    pub resolved: Vec<(SpecPath, Spec)>,
    /// Stochastic domains, in discovery order
    pub domains: Vec<DomainVar>,
    /// Grid axes, sorted by path
    pub grids: Vec<GridVar>,
}

impl SpecVars {
    /// Check that nothing is left to sample or enumerate
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.domains.is_empty() && self.grids.is_empty()
    }
}

/// Partition `spec` into resolved, domain and grid entries
///
/// Mappings and sequences are walked structurally. A mapping whose only key is
/// `grid_search` and a domain whose `is_grid()` holds are both grid axes.
///
/// # Errors
/// Returns [`SpecError::MalformedGridAxis`] for a grid whose candidates are not
/// a non-empty sequence
pub fn parse_spec_vars(spec: &Spec) -> Result<SpecVars, SpecError> {
    let mut vars = SpecVars::default();
    let mut path = SpecPath::root();
    collect(spec, &mut path, &mut vars)?;
    vars.grids.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(vars)
}

/// Check whether any grid or domain remains in `spec`
///
/// # Errors
/// Returns [`SpecError::MalformedGridAxis`] as [`parse_spec_vars`] does
pub fn has_unresolved_values(spec: &Spec) -> Result<bool, SpecError> {
    Ok(!parse_spec_vars(spec)?.is_resolved())
}

fn collect(node: &Spec, path: &mut SpecPath, vars: &mut SpecVars) -> Result<(), SpecError> {
    if let Some(candidates) = node.grid_descriptor() {
        let axis = GridAxis::from_descriptor(candidates, path)?;
        vars.grids.push(GridVar {
            path: path.clone(),
            axis,
        });
        return Ok(());
    }

    match node {
        Spec::Value(_) => vars.resolved.push((path.clone(), node.clone())),
        Spec::Map(map) => {
            for (key, child) in map {
                path.push(key.as_str());
                collect(child, path, vars)?;
                path.pop();
            }
        }
        Spec::List(items) => {
            for (idx, child) in items.iter().enumerate() {
                path.push(idx);
                collect(child, path, vars)?;
                path.pop();
            }
        }
        Spec::Grid(axis) => vars.grids.push(GridVar {
            path: path.clone(),
            axis: axis.clone().validated(path)?,
        }),
        Spec::Domain(domain) if domain.is_grid() => {
            let values = domain.grid_values().ok_or_else(|| {
                SpecError::malformed_grid(path, "grid domain exposes no candidate values")
            })?;
            vars.grids.push(GridVar {
                path: path.clone(),
                axis: GridAxis::new(values.to_vec()).validated(path)?,
            });
        }
        Spec::Domain(domain) => vars.domains.push(DomainVar {
            path: path.clone(),
            domain: Arc::clone(domain),
        }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sweep_spec::{grid_search, Categorical, Uniform};

    fn path(s: &str) -> SpecPath {
        s.parse().unwrap()
    }

    #[test]
    fn concrete_spec_has_only_resolved_leaves() {
        let spec = Spec::from_json(json!({"a": 1, "b": {"c": [true, "x"]}})).unwrap();
        let vars = parse_spec_vars(&spec).unwrap();

        assert!(vars.is_resolved());
        let paths: Vec<String> = vars.resolved.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, ["a", "b.c.0", "b.c.1"]);
        assert!(!has_unresolved_values(&spec).unwrap());
    }

    #[test]
    fn grids_sorted_domains_in_discovery_order() {
        let mut spec = Spec::from_json(json!({
            "z": {"grid_search": [1, 2]},
            "m": 0,
            "a": {"grid_search": ["x"]},
            "k": 0,
        }))
        .unwrap();
        spec.set_path(&path("m"), Spec::domain(Uniform::unit())).unwrap();
        spec.set_path(&path("k"), Spec::domain(Uniform::unit())).unwrap();

        let vars = parse_spec_vars(&spec).unwrap();
        let grids: Vec<String> = vars.grids.iter().map(|g| g.path.to_string()).collect();
        let domains: Vec<String> = vars.domains.iter().map(|d| d.path.to_string()).collect();
        assert_eq!(grids, ["a", "z"]);
        assert_eq!(domains, ["m", "k"]);
        assert!(has_unresolved_values(&spec).unwrap());
    }

    #[test]
    fn grid_domain_is_a_grid_axis() {
        let domain = Categorical::new(vec!["relu".into(), "tanh".into()]).unwrap().grid();
        let spec: Spec = [("act", Spec::domain(domain))].into_iter().collect();

        let vars = parse_spec_vars(&spec).unwrap();
        assert!(vars.domains.is_empty());
        assert_eq!(vars.grids.len(), 1);
        assert_eq!(vars.grids[0].axis.values()[1], Spec::from("tanh"));
    }

    #[test]
    fn descriptor_built_in_code_is_recognised() {
        let descriptor: Spec = [("grid_search", Spec::List(vec![1.into(), 2.into()]))]
            .into_iter()
            .collect();
        let spec: Spec = [("nested", [("lr", descriptor)].into_iter().collect())]
            .into_iter()
            .collect();

        let vars = parse_spec_vars(&spec).unwrap();
        assert_eq!(vars.grids[0].path, path("nested.lr"));
        assert_eq!(vars.grids[0].axis.len(), 2);
    }

    #[test]
    fn scalar_candidates_are_malformed() {
        let descriptor: Spec = [("grid_search", Spec::from(5))].into_iter().collect();
        let spec: Spec = [("lr", descriptor)].into_iter().collect();
        let err = parse_spec_vars(&spec).unwrap_err();
        assert!(err.is_malformed_grid());
        assert!(has_unresolved_values(&spec).is_err());
    }

    #[test]
    fn empty_grid_is_malformed() {
        let spec: Spec = [("lr", grid_search(Vec::<Spec>::new()))].into_iter().collect();
        let err = parse_spec_vars(&spec).unwrap_err();
        assert!(matches!(err, SpecError::MalformedGridAxis { path: p, .. } if p == path("lr")));
    }
}
