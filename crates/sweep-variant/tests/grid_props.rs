use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::json;
use sweep_spec::{grid_search, Spec};
use sweep_variant::{generate_variants, parse_spec_vars, GeneratorConfig, GridSearch};

// Axis `k{i}` has candidates `0..sizes[i]`.
fn grid_template(sizes: &[usize]) -> Spec {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &n)| (format!("k{i}"), grid_search((0..n).map(Spec::value))))
        .collect()
}

proptest! {
    #[test]
    fn prop_variant_count_is_product(sizes in proptest::collection::vec(1..5usize, 0..4)) {
        let template = grid_template(&sizes);
        let variants: Vec<_> = generate_variants(&template, GeneratorConfig::new().with_seed(0))
            .collect::<Result<_, _>>()
            .unwrap();

        let expected: usize = sizes.iter().product();
        prop_assert_eq!(variants.len(), expected);

        let distinct: HashSet<String> = variants
            .iter()
            .map(|v| v.config().unwrap().to_string())
            .collect();
        prop_assert_eq!(distinct.len(), expected);
    }

    #[test]
    fn prop_first_axis_changes_fastest(sizes in proptest::collection::vec(1..5usize, 1..4)) {
        let template = grid_template(&sizes);
        let variants = generate_variants(&template, GeneratorConfig::new().with_seed(0));

        for (i, variant) in variants.enumerate() {
            let config = variant.unwrap().config().unwrap();
            let mut rest = i;
            for (axis, &n) in sizes.iter().enumerate() {
                prop_assert_eq!(&config[format!("k{axis}")], &json!(rest % n));
                rest /= n;
            }
        }
    }

    #[test]
    fn prop_grid_search_len_matches_iteration(sizes in proptest::collection::vec(1..6usize, 0..4)) {
        let template = grid_template(&sizes);
        let vars = parse_spec_vars(&template).unwrap();
        let grid = GridSearch::new(template, vars.grids).unwrap();

        let len = grid.len();
        prop_assert_eq!(grid.size_hint(), (len, Some(len)));
        prop_assert_eq!(grid.count(), len);
    }
}
