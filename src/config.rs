// src/config.rs
//! Search configuration and embedded profiles.
//!
//! A profile is a TOML file deserialized into [`SearchConfig`]. Fields
//! omitted from a file keep the `Default` values, so profiles only state
//! what differs. Named profiles are compiled into the binary; anything that
//! looks like a path is read from disk instead.

use std::path::PathBuf;

use holesmith_ops::CandidateDomains;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// How holes pick their next configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Odometer enumeration across the holes reached in a run.
    Systematic,
    /// Independent random draws.
    #[default]
    Random,
    /// Every hole walks its own domain independently.
    Hybrid,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Systematic => "systematic",
            Strategy::Random => "random",
            Strategy::Hybrid => "hybrid",
        }
    }
}

/// Settings for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: Strategy,
    pub seed: u64,
    /// Number of variants to emit. Ignored by exhaustive systematic search.
    pub outputs: usize,
    pub exhaustive: bool,
    /// Upper bound on entry-point invocations per run.
    pub max_invocations: usize,
    /// Consecutive discarded runs tolerated before giving up.
    pub max_repeated_trials: usize,
    pub hot_fill: bool,
    pub oracle_pruning: bool,
    /// Stop a run once its state fingerprint repeats.
    pub stop_early: bool,
    /// Run every invocation and record a state checksum per variant.
    pub mimic_execution: bool,
    pub allow_non_compiling: bool,
    pub class_postfix: String,
    pub output_dir: PathBuf,
    /// Statements one invocation may execute before it is cut off.
    pub max_steps: usize,
    /// Solver command; `None` uses the default solver.
    pub solver: Option<String>,
    pub solver_timeout_ms: u64,
    /// External compiler command with `{file}` and `{dir}` placeholders;
    /// `None` uses the built-in source check.
    pub compiler: Option<String>,
    pub compile_timeout_ms: u64,
    pub domains: CandidateDomains,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Random,
            seed: 42,
            outputs: 100,
            exhaustive: false,
            max_invocations: 100_000,
            max_repeated_trials: 100,
            hot_fill: true,
            oracle_pruning: true,
            stop_early: true,
            mimic_execution: false,
            allow_non_compiling: false,
            class_postfix: "Gen".to_string(),
            output_dir: PathBuf::from(".holesmith"),
            max_steps: 10_000,
            solver: None,
            solver_timeout_ms: 10_000,
            compiler: None,
            compile_timeout_ms: 60_000,
            domains: CandidateDomains::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outputs == 0 && !self.exhaustive {
            return Err(ConfigError::ZeroOutputs);
        }
        if self.max_invocations == 0 {
            return Err(ConfigError::ZeroInvocations);
        }
        if let Some(prim) = self.domains.first_empty() {
            return Err(ConfigError::EmptyDomain {
                ty: prim.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the campaign stops at the output budget.
    pub fn bounded(&self) -> bool {
        !(self.exhaustive && self.strategy != Strategy::Random)
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

// Embedded profile TOML data (compiled into the binary).
static PROFILES: &[(&str, &str)] = &[
    ("default", include_str!("../profiles/default.toml")),
    ("quick", include_str!("../profiles/quick.toml")),
    ("systematic", include_str!("../profiles/systematic.toml")),
    ("hybrid", include_str!("../profiles/hybrid.toml")),
    ("boundary", include_str!("../profiles/boundary.toml")),
];

/// Returns a list of available profile names.
pub fn available_profiles() -> Vec<&'static str> {
    PROFILES.iter().map(|(name, _)| *name).collect()
}

fn parse_profile(name: &str, source: &str) -> Result<SearchConfig, ConfigError> {
    toml::from_str(source).map_err(|e| ConfigError::parse(name, source.to_string(), e))
}

/// Get a profile by name, or load it from a file path.
///
/// If `name_or_path` contains `/` or ends with `.toml`, it is treated as a
/// file path. Otherwise it is looked up among the embedded profiles.
pub fn get_profile(name_or_path: &str) -> Result<SearchConfig, ConfigError> {
    if name_or_path.contains('/') || name_or_path.ends_with(".toml") {
        let content = std::fs::read_to_string(name_or_path).map_err(|source| ConfigError::Io {
            path: name_or_path.to_string(),
            source,
        })?;
        return parse_profile(name_or_path, &content);
    }
    PROFILES
        .iter()
        .find(|(name, _)| *name == name_or_path)
        .map(|(name, source)| parse_profile(name, source))
        .unwrap_or_else(|| {
            Err(ConfigError::UnknownProfile {
                name: name_or_path.to_string(),
                available: available_profiles().join(", "),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn every_embedded_profile_parses_and_validates() {
        for name in available_profiles() {
            let config = get_profile(name).unwrap_or_else(|e| panic!("{name}: {e}"));
            config.validate().unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn omitted_fields_keep_defaults() {
        let config = get_profile("systematic").unwrap();
        assert_eq!(config.strategy, Strategy::Systematic);
        assert!(config.exhaustive);
        assert_eq!(config.seed, 42);
        assert_eq!(config.class_postfix, "Gen");
        assert_eq!(config.domains.booleans, vec![false, true]);
    }

    #[test]
    fn partial_domain_tables_merge() {
        let config = get_profile("boundary").unwrap();
        assert_eq!(config.domains.ints, vec![0, i32::MAX, i32::MIN]);
        assert_eq!(config.domains.chars, CandidateDomains::default().chars);
    }

    #[test]
    fn unknown_profile_lists_alternatives() {
        match get_profile("turbo") {
            Err(ConfigError::UnknownProfile { available, .. }) => {
                assert!(available.contains("systematic"));
            }
            other => panic!("expected UnknownProfile, got {other:?}"),
        }
    }

    #[test]
    fn profile_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "strategy = \"hybrid\"\nseed = 7").unwrap();
        let config = get_profile(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.strategy, Strategy::Hybrid);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn malformed_profile_is_a_parse_error() {
        let err = parse_profile("bad", "strategy = \"sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation() {
        let mut config = SearchConfig {
            outputs: 0,
            ..SearchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroOutputs)));
        config.exhaustive = true;
        config.validate().unwrap();

        config.max_invocations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInvocations)));

        let mut config = SearchConfig::default();
        config.domains.shorts.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyDomain { ty }) if ty == "short"
        ));
    }
}
