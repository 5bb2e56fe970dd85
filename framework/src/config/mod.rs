//! Configuration module
//!
//! Provides framework-wide defaults that tests rarely need to touch:
//! the leniency modes applied by `assert_lenient_eq`, the reflection depth
//! bound and the failure-report detail level. Values are read from the
//! environment once (with `.env` support) and can be overridden
//! programmatically for a whole test binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use attest::config::AttestConfig;
//! use attest::compare::CompareMode;
//!
//! AttestConfig::override_with(
//!     AttestConfig::default().with_mode(CompareMode::LenientDates),
//! );
//! ```

pub mod env;

pub use env::{env, env_optional, load_dotenv};

use std::sync::{OnceLock, RwLock};

use crate::compare::modes::CompareMode;

/// Global configuration instance
static CONFIG: OnceLock<RwLock<AttestConfig>> = OnceLock::new();

/// Framework configuration
///
/// Environment variables:
/// - `ATTEST_MAX_DEPTH`: reflection/comparison depth bound (default 64)
/// - `ATTEST_LENIENT_DATES`: `true` adds the lenient-dates mode to the
///   default lenient mode set
/// - `ATTEST_FULL_REPORT`: `true` appends the full difference tree to
///   assertion failure messages
#[derive(Debug, Clone)]
pub struct AttestConfig {
    /// Modes applied by `assert_lenient_eq` and the `len_eq` matcher
    pub lenient_modes: Vec<CompareMode>,
    /// Bound on reflection and comparison recursion depth
    pub max_depth: usize,
    /// Whether failure reports include the full difference tree
    pub full_report: bool,
}

impl Default for AttestConfig {
    fn default() -> Self {
        Self {
            lenient_modes: vec![CompareMode::LenientOrder, CompareMode::IgnoreDefaults],
            max_depth: 64,
            full_report: false,
        }
    }
}

impl AttestConfig {
    /// Build the configuration from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.max_depth = env("ATTEST_MAX_DEPTH", config.max_depth);
        config.full_report = env("ATTEST_FULL_REPORT", config.full_report);
        if env("ATTEST_LENIENT_DATES", false) {
            config.lenient_modes.push(CompareMode::LenientDates);
        }
        config
    }

    /// Add a leniency mode to the lenient mode set
    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        if !self.lenient_modes.contains(&mode) {
            self.lenient_modes.push(mode);
        }
        self
    }

    /// Set the reflection depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable the full difference-tree report
    pub fn with_full_report(mut self, full_report: bool) -> Self {
        self.full_report = full_report;
        self
    }

    /// The current global configuration (initialized from the environment on
    /// first use)
    pub fn current() -> AttestConfig {
        let lock = CONFIG.get_or_init(|| RwLock::new(AttestConfig::from_env()));
        lock.read()
            .map(|config| config.clone())
            .unwrap_or_default()
    }

    /// Replace the global configuration for the rest of the test binary
    pub fn override_with(config: AttestConfig) {
        let lock = CONFIG.get_or_init(|| RwLock::new(AttestConfig::from_env()));
        if let Ok(mut current) = lock.write() {
            *current = config;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient_order_and_ignore_defaults() {
        let config = AttestConfig::default();
        assert_eq!(
            config.lenient_modes,
            vec![CompareMode::LenientOrder, CompareMode::IgnoreDefaults]
        );
        assert_eq!(config.max_depth, 64);
        assert!(!config.full_report);
    }

    #[test]
    fn with_mode_does_not_duplicate() {
        let config = AttestConfig::default()
            .with_mode(CompareMode::LenientOrder)
            .with_mode(CompareMode::LenientDates);
        assert_eq!(config.lenient_modes.len(), 3);
    }
}
