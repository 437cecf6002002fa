//! Engine configuration, with overrides from the environment

use std::collections::HashMap;
use thiserror::Error;

/// Root-finding limits for IRR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Hard cap on iterations for each of Newton-Raphson and bisection
    pub max_iterations: u32,

    /// Convergence tolerance on NPV, relative to the largest cash flow
    pub npv_tolerance: f64,

    /// Lowest annual rate searched (-0.99 = -99%)
    pub lower_bound: f64,

    /// Highest annual rate searched (10.0 = +1000%)
    pub upper_bound: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            npv_tolerance: 1e-6,
            lower_bound: -0.99,
            upper_bound: 10.0,
        }
    }
}

/// Configuration for a waterfall run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub solver: SolverConfig,

    /// Report the LP's IRR-to-date on every year
    pub track_lp_irr: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            track_lp_irr: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl EngineConfig {
    /// Read overrides from `WATERFALL_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let max_iterations = parse_or(&env_map, "WATERFALL_IRR_MAX_ITERATIONS", defaults.solver.max_iterations)?;
        let npv_tolerance = parse_or(&env_map, "WATERFALL_IRR_TOLERANCE", defaults.solver.npv_tolerance)?;
        let lower_bound = parse_or(&env_map, "WATERFALL_IRR_LOWER_BOUND", defaults.solver.lower_bound)?;
        let upper_bound = parse_or(&env_map, "WATERFALL_IRR_UPPER_BOUND", defaults.solver.upper_bound)?;

        let track_lp_irr = match env_map.get("WATERFALL_TRACK_LP_IRR").map(|s| s.trim().to_ascii_lowercase()) {
            None => defaults.track_lp_irr,
            Some(v) if v == "1" || v == "true" => true,
            Some(v) if v == "0" || v == "false" => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "WATERFALL_TRACK_LP_IRR".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "WATERFALL_IRR_MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if !(npv_tolerance > 0.0) {
            return Err(ConfigError::InvalidValue(
                "WATERFALL_IRR_TOLERANCE".to_string(),
                "must be positive".to_string(),
            ));
        }
        if !(lower_bound > -1.0) {
            return Err(ConfigError::InvalidValue(
                "WATERFALL_IRR_LOWER_BOUND".to_string(),
                "must be above -1.0".to_string(),
            ));
        }
        if !(upper_bound > lower_bound) {
            return Err(ConfigError::InvalidValue(
                "WATERFALL_IRR_UPPER_BOUND".to_string(),
                "must be above the lower bound".to_string(),
            ));
        }

        Ok(EngineConfig {
            solver: SolverConfig {
                max_iterations,
                npv_tolerance,
                lower_bound,
                upper_bound,
            },
            track_lp_irr,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("could not parse {:?}", raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = EngineConfig::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.solver.max_iterations, 100);
    }

    #[test]
    fn test_overrides() {
        let mut env_map = HashMap::new();
        env_map.insert("WATERFALL_IRR_MAX_ITERATIONS".to_string(), "250".to_string());
        env_map.insert("WATERFALL_IRR_UPPER_BOUND".to_string(), "5.0".to_string());
        env_map.insert("WATERFALL_TRACK_LP_IRR".to_string(), "false".to_string());

        let config = EngineConfig::from_env_map(env_map).unwrap();
        assert_eq!(config.solver.max_iterations, 250);
        assert_eq!(config.solver.upper_bound, 5.0);
        assert!(!config.track_lp_irr);
    }

    #[test]
    fn test_invalid_iterations() {
        let mut env_map = HashMap::new();
        env_map.insert("WATERFALL_IRR_MAX_ITERATIONS".to_string(), "lots".to_string());
        match EngineConfig::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "WATERFALL_IRR_MAX_ITERATIONS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_inverted_bounds() {
        let mut env_map = HashMap::new();
        env_map.insert("WATERFALL_IRR_LOWER_BOUND".to_string(), "0.5".to_string());
        env_map.insert("WATERFALL_IRR_UPPER_BOUND".to_string(), "0.1".to_string());
        match EngineConfig::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "WATERFALL_IRR_UPPER_BOUND"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
