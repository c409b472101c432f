//! Short tags for resolved variables

use serde_json::Value as JsonValue;
use sweep_spec::{PathSegment, Spec};

use crate::resolve::ResolvedVars;

/// Render resolved variables as `key=value,...`
///
/// Entries are sorted by path and named by their last segment. Floats keep
/// four decimals; everything outside `[A-Za-z0-9._-]` becomes `_`, with
/// leading and trailing underscores trimmed.
///
/// # Examples
/// ```
/// use sweep_spec::{Spec, SpecPath};
/// use sweep_variant::{format_vars, ResolvedVars};
///
/// let mut vars = ResolvedVars::new();
/// vars.insert("opt.lr".parse::<SpecPath>().unwrap(), Spec::from(0.012_345));
/// vars.insert("act".parse::<SpecPath>().unwrap(), Spec::from("relu"));
/// assert_eq!(format_vars(&vars), "act=relu,lr=0.0123");
/// ```
#[must_use]
pub fn format_vars(vars: &ResolvedVars) -> String {
    let mut entries: Vec<_> = vars.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(path, value)| {
            let key = match path.last() {
                Some(PathSegment::Key(key)) => key.clone(),
                Some(PathSegment::Index(idx)) => idx.to_string(),
                None => String::new(),
            };
            format!("{}={}", clean(&key), clean(&render(value)))
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn render(value: &Spec) -> String {
    match value {
        Spec::Value(JsonValue::String(s)) => s.clone(),
        Spec::Value(JsonValue::Number(n)) if n.is_f64() => match n.as_f64() {
            Some(f) => format!("{f:.4}"),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn clean(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_spec::SpecPath;

    fn vars(entries: &[(&str, Spec)]) -> ResolvedVars {
        entries
            .iter()
            .map(|(p, v)| (p.parse::<SpecPath>().unwrap(), v.clone()))
            .collect()
    }

    #[test]
    fn empty_is_empty_string() {
        assert_eq!(format_vars(&ResolvedVars::new()), "");
    }

    #[test]
    fn sorted_by_full_path() {
        let tag = format_vars(&vars(&[
            ("z.units", Spec::from(16)),
            ("a.units", Spec::from(8)),
        ]));
        assert_eq!(tag, "units=8,units=16");
    }

    #[test]
    fn cleans_awkward_characters() {
        let tag = format_vars(&vars(&[("model", Spec::from("bert/base uncased!"))]));
        assert_eq!(tag, "model=bert_base_uncased");
    }

    #[test]
    fn lists_and_bools() {
        let tag = format_vars(&vars(&[
            ("flag", Spec::from(true)),
            ("layers.0", Spec::from(vec![Spec::from(1), Spec::from(2)])),
        ]));
        assert_eq!(tag, "flag=true,0=1__2");
    }
}
