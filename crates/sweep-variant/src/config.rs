//! Generator configuration

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Pass cap used when none is configured
pub const DEFAULT_MAX_RESOLUTION_PASSES: usize = 20;

/// Variant generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Sample stochastic domains once and hold them across grid combinations
    pub constant_grid_search: bool,
    /// Resolution passes before giving up on a dependency
    pub max_resolution_passes: usize,
    /// Seed for reproducible sampling; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With constant grid search
    #[inline]
    #[must_use]
    pub fn with_constant_grid_search(mut self, constant: bool) -> Self {
        self.constant_grid_search = constant;
        self
    }

    /// With pass cap (at least one pass always runs)
    #[inline]
    #[must_use]
    pub fn with_max_resolution_passes(mut self, passes: usize) -> Self {
        self.max_resolution_passes = passes.max(1);
        self
    }

    /// With fixed seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random source described by this configuration
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            constant_grid_search: false,
            max_resolution_passes: DEFAULT_MAX_RESOLUTION_PASSES,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn defaults() {
        let config = GeneratorConfig::new();
        assert!(!config.constant_grid_search);
        assert_eq!(config.max_resolution_passes, 20);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn builders_chain() {
        let config = GeneratorConfig::new()
            .with_constant_grid_search(true)
            .with_max_resolution_passes(0)
            .with_seed(9);
        assert!(config.constant_grid_search);
        assert_eq!(config.max_resolution_passes, 1);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let config = GeneratorConfig::new().with_seed(42);
        assert_eq!(config.rng().next_u64(), config.rng().next_u64());
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"seed": 3}"#).unwrap();
        assert_eq!(config, GeneratorConfig::new().with_seed(3));

        let config: GeneratorConfig =
            serde_yaml::from_str("constant_grid_search: true\nmax_resolution_passes: 5\n").unwrap();
        assert!(config.constant_grid_search);
        assert_eq!(config.max_resolution_passes, 5);
    }
}
