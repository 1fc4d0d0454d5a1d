//! Walk configuration

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable consulted by [`WalkConfig::from_env`]
pub const PARALLELISM_ENV: &str = "STRATA_PARALLELISM";

/// Default number of vertex callbacks allowed to run at once
pub const DEFAULT_PARALLELISM: usize = 10;

/// Which way dependency edges are honored during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkDirection {
    /// Dependencies run before their dependents
    #[default]
    Down,
    /// Dependents run before their dependencies (cleanup-style passes)
    Up,
}

/// Configuration for a [`Walker`](super::Walker)
///
/// # Example
///
/// ```
/// use strata::walker::{WalkConfig, WalkDirection};
///
/// let config = WalkConfig::default().with_parallelism(4).reverse();
/// assert_eq!(config.parallelism, Some(4));
/// assert_eq!(config.direction, WalkDirection::Up);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Maximum concurrent callbacks; `None` means unbounded
    pub parallelism: Option<usize>,
    pub direction: WalkDirection,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            parallelism: Some(DEFAULT_PARALLELISM),
            direction: WalkDirection::Down,
        }
    }
}

impl WalkConfig {
    /// Reads the concurrency bound from `STRATA_PARALLELISM`
    ///
    /// `0` means unbounded. An unset or unparsable value falls back to the
    /// default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(PARALLELISM_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.parallelism = None,
                Ok(n) => config.parallelism = Some(n),
                Err(_) => warn!(
                    "Ignoring invalid {}={:?}; using {}",
                    PARALLELISM_ENV, raw, DEFAULT_PARALLELISM
                ),
            }
        }
        config
    }

    /// Limits the number of concurrently running callbacks
    ///
    /// A bound of zero would never run anything and is raised to one.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism.max(1));
        self
    }

    /// Removes the concurrency bound
    pub fn unbounded(mut self) -> Self {
        self.parallelism = None;
        self
    }

    pub fn direction(mut self, direction: WalkDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Shorthand for an "up" (reverse) walk
    pub fn reverse(self) -> Self {
        self.direction(WalkDirection::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WalkConfig::default();
        assert_eq!(config.parallelism, Some(DEFAULT_PARALLELISM));
        assert_eq!(config.direction, WalkDirection::Down);
    }

    #[test]
    fn test_zero_parallelism_is_raised() {
        assert_eq!(WalkConfig::default().with_parallelism(0).parallelism, Some(1));
    }

    #[test]
    fn test_deserialize() {
        let config: WalkConfig =
            serde_json::from_str(r#"{"parallelism": null, "direction": "up"}"#).unwrap();
        assert_eq!(config, WalkConfig::default().unbounded().reverse());
    }
}
