//! Built-in domain builders for parameterised `eval` descriptors

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::domain::{Categorical, Domain, FnDomain, Normal, RandInt, SampleError, Uniform};
use crate::error::SpecError;
use crate::guard::SpecGuard;
use crate::registry::EvalArgs;
use crate::spec::Spec;

pub(crate) fn uniform(args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    args.expect_only(&["low", "high"])?;
    let domain = Uniform::new(args.f64("low")?, args.f64("high")?).map_err(|e| args.invalid(e.to_string()))?;
    Ok(Arc::new(domain))
}

pub(crate) fn randint(args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    args.expect_only(&["low", "high"])?;
    let domain = RandInt::new(args.i64("low")?, args.i64("high")?).map_err(|e| args.invalid(e.to_string()))?;
    Ok(Arc::new(domain))
}

pub(crate) fn normal(args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    args.expect_only(&["mean", "std"])?;
    let domain = Normal::new(args.f64_or("mean", 0.0)?, args.f64_or("std", 1.0)?)
        .map_err(|e| args.invalid(e.to_string()))?;
    Ok(Arc::new(domain))
}

pub(crate) fn choice(args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    args.expect_only(&["options"])?;
    let domain = Categorical::new(args.specs("options")?).map_err(|e| args.invalid(e.to_string()))?;
    Ok(Arc::new(domain))
}

/// Copy of the subtree at `path`
pub(crate) fn reference(args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    args.expect_only(&["path"])?;
    let target = args.spec_path("path")?;
    let source = target.clone();
    let domain = FnDomain::new("ref", move |spec, _rng| spec.require(&source)?.to_spec()).depends_on(target);
    Ok(Arc::new(domain))
}

/// `value * factor + offset` of the number at `path`
///
/// Integer in, integer parameters: integer out. Anything else is a float.
pub(crate) fn scale(args: &EvalArgs) -> Result<Arc<dyn Domain>, SpecError> {
    args.expect_only(&["path", "factor", "offset"])?;
    let target = args.spec_path("path")?;
    let affine = Affine {
        factor: args.param("factor").cloned().unwrap_or(JsonValue::from(1)),
        offset: args.param("offset").cloned().unwrap_or(JsonValue::from(0)),
    };
    for (name, value) in [("factor", &affine.factor), ("offset", &affine.offset)] {
        if !value.is_number() {
            return Err(args.invalid(format!("parameter `{name}` must be a number, got {value}")));
        }
    }

    let source = target.clone();
    let domain = FnDomain::new("scale", move |spec, _rng| affine.apply(&spec.lookup(&source)?))
        .depends_on(target);
    Ok(Arc::new(domain))
}

struct Affine {
    factor: JsonValue,
    offset: JsonValue,
}

impl Affine {
    fn apply(&self, value: &SpecGuard<'_>) -> Result<Spec, SampleError> {
        let ints = (value.as_i64(), self.factor.as_i64(), self.offset.as_i64());
        if let (Ok(x), Some(factor), Some(offset)) = ints {
            return x
                .checked_mul(factor)
                .and_then(|y| y.checked_add(offset))
                .map(Spec::from)
                .ok_or_else(|| SampleError::invalid(format!("`{}` overflows when scaled", value.path())));
        }
        let x = value.as_f64()?;
        let factor = self.factor.as_f64().unwrap_or(1.0);
        let offset = self.offset.as_f64().unwrap_or(0.0);
        Ok(Spec::from(x * factor + offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyNotReady, NotReadyReason};
    use crate::path::SpecPath;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn path(s: &str) -> SpecPath {
        s.parse().unwrap()
    }

    fn draw(domain: &Arc<dyn Domain>, spec: &JsonValue) -> Result<Spec, SampleError> {
        let spec = Spec::from_json(spec.clone()).unwrap();
        domain.sample(&SpecGuard::new(&spec), &mut StdRng::seed_from_u64(3))
    }

    fn args() -> EvalArgs {
        EvalArgs::new(path("x"))
    }

    #[test]
    fn bounded_builders_validate() {
        let ok = uniform(&args().with_param("low", 1).with_param("high", 2)).unwrap();
        let v = draw(&ok, &json!({})).unwrap();
        assert!((1.0..2.0).contains(&v.as_value().and_then(JsonValue::as_f64).unwrap()));

        assert!(uniform(&args().with_param("low", 2).with_param("high", 1)).is_err());
        assert!(uniform(&args().with_param("low", 0)).is_err());
        assert!(randint(&args().with_param("low", 0.5).with_param("high", 3)).is_err());
        assert!(normal(&args().with_param("std", -1)).is_err());
        assert!(normal(&args().with_param("sigma", 1)).is_err());
        assert!(normal(&args()).is_ok());
    }

    #[test]
    fn choice_converts_options() {
        let domain = choice(&args().with_param("options", json!([{"grid_search": [1, 2]}]))).unwrap();
        assert!(matches!(draw(&domain, &json!({})).unwrap(), Spec::Grid(_)));
        assert!(choice(&args().with_param("options", json!([]))).is_err());
    }

    #[test]
    fn reference_copies_resolved_subtree() {
        let domain = reference(&args().with_param("path", "config.num_workers")).unwrap();
        let v = draw(&domain, &json!({"config": {"num_workers": 4}})).unwrap();
        assert_eq!(v, Spec::from(4));

        let err = draw(&domain, &json!({"config": {}})).unwrap_err();
        assert_eq!(
            err,
            SampleError::NotReady(DependencyNotReady {
                path: path("config.num_workers"),
                reason: NotReadyReason::Missing,
            })
        );
    }

    #[test]
    fn scale_keeps_integers_integral() {
        let twice = scale(&args().with_param("path", "n").with_param("factor", 2).with_param("offset", 1)).unwrap();
        assert_eq!(draw(&twice, &json!({"n": 4})).unwrap(), Spec::from(9));
        assert_eq!(draw(&twice, &json!({"n": 0.5})).unwrap(), Spec::from(2.0));

        let half = scale(&args().with_param("path", "n").with_param("factor", 0.5)).unwrap();
        assert_eq!(draw(&half, &json!({"n": 4})).unwrap(), Spec::from(2.0));

        let err = draw(&twice, &json!({"n": "four"})).unwrap_err();
        assert!(!err.is_retryable());
        assert!(scale(&args().with_param("path", "n").with_param("factor", "2")).is_err());
        assert!(scale(&args()).is_err());
    }
}
