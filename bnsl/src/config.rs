//! Learner configuration.
use std::fmt::Write;

use serde::Deserialize;
use thiserror::Error;

/// How the best parents table is computed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentsStrategy {
    /// Fill the whole table in ascending parent code order before assembling the network.
    BottomUp,
    /// Compute entries on demand by memoized recursion.
    Lazy,
}

/// How the best sink table is computed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinksStrategy {
    /// Compute entries on demand by memoized recursion, starting from the set of all variables.
    Lazy,
    /// Fill the entries of all variable subsets in ascending order.
    Eager,
}

/// Possible errors when updating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The number of threads must be at least 1")]
    InvalidThreads,
}

/// Configurable parameters used during learning.
///
/// None of these change the learned network, only how the tables are computed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LearnerConfig {
    /// Strategy for the best parents table. (Default: bottom_up)
    pub parents_strategy: ParentsStrategy,

    /// Strategy for the best sink table. (Default: lazy)
    pub sinks_strategy: SinksStrategy,

    /// Number of threads filling the best parents table bottom up. (Default: 1)
    pub threads: usize,
}

impl Default for LearnerConfig {
    fn default() -> LearnerConfig {
        LearnerConfig {
            parents_strategy: ParentsStrategy::BottomUp,
            sinks_strategy: SinksStrategy::Lazy,
            threads: 1,
        }
    }
}

impl LearnerConfig {
    /// Description of all options, one per line.
    pub fn help() -> String {
        let mut help = String::new();
        let options: [(&str, &str, &str); 3] = [
            (
                "parents_strategy",
                "Strategy for the best parents table: \"bottom_up\" or \"lazy\".",
                "\"bottom_up\"",
            ),
            (
                "sinks_strategy",
                "Strategy for the best sink table: \"lazy\" or \"eager\".",
                "\"lazy\"",
            ),
            (
                "threads",
                "Number of threads filling the best parents table bottom up.",
                "1",
            ),
        ];
        for (name, description, default) in options.iter() {
            let _ = writeln!(help, "{}:\n  {} (Default: {})", name, description, default);
        }
        help
    }
}

/// A partial update of a [`LearnerConfig`].
///
/// This is what configuration files and command line options deserialize into.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearnerConfigUpdate {
    pub parents_strategy: Option<ParentsStrategy>,
    pub sinks_strategy: Option<SinksStrategy>,
    pub threads: Option<usize>,
}

impl LearnerConfigUpdate {
    /// An update that changes nothing.
    pub fn new() -> LearnerConfigUpdate {
        LearnerConfigUpdate::default()
    }

    /// Add all values set in `other`, overriding values set in `self`.
    pub fn merge(&mut self, other: LearnerConfigUpdate) {
        self.parents_strategy = other.parents_strategy.or(self.parents_strategy);
        self.sinks_strategy = other.sinks_strategy.or(self.sinks_strategy);
        self.threads = other.threads.or(self.threads);
    }

    /// Apply this update to a configuration.
    ///
    /// The configuration is left unchanged if the update is invalid.
    pub fn apply(&self, config: &mut LearnerConfig) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::InvalidThreads);
        }
        if let Some(parents_strategy) = self.parents_strategy {
            config.parents_strategy = parents_strategy;
        }
        if let Some(sinks_strategy) = self.sinks_strategy {
            config.sinks_strategy = sinks_strategy;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_from_toml() {
        let mut update: LearnerConfigUpdate =
            toml::from_str("parents_strategy = \"lazy\"\nthreads = 4").unwrap();
        update.merge(toml::from_str("threads = 2").unwrap());
        update.merge(toml::from_str("sinks_strategy = \"eager\"").unwrap());

        let mut config = LearnerConfig::default();
        update.apply(&mut config).unwrap();

        assert_eq!(
            config,
            LearnerConfig {
                parents_strategy: ParentsStrategy::Lazy,
                sinks_strategy: SinksStrategy::Eager,
                threads: 2,
            }
        );
    }

    #[test]
    fn rejects_unknown_options() {
        assert!(toml::from_str::<LearnerConfigUpdate>("vsids_decay = 0.9").is_err());
        assert!(toml::from_str::<LearnerConfigUpdate>("parents_strategy = \"top_down\"").is_err());
    }

    #[test]
    fn rejects_zero_threads() {
        let update: LearnerConfigUpdate = toml::from_str("threads = 0").unwrap();
        let mut config = LearnerConfig::default();
        assert!(matches!(
            update.apply(&mut config),
            Err(ConfigError::InvalidThreads)
        ));
        assert_eq!(config, LearnerConfig::default());
    }

    #[test]
    fn help_lists_all_options() {
        let help = LearnerConfig::help();
        for option in ["parents_strategy", "sinks_strategy", "threads"].iter() {
            assert!(help.contains(option));
        }
    }
}
