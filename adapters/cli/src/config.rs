use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use warband_system_combat::DEFAULT_TICK_INTERVAL;
use warband_system_encounters::StartingTeam;

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Defaults for an auto-played run, usually read from `warband.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunConfig {
    /// Format version of the file.
    pub(crate) version: u32,
    /// Seed for map generation, enemy draws and coin flips.
    pub(crate) seed: u64,
    /// Party picked before the first floor.
    pub(crate) starting_team: StartingTeam,
    /// Number of floors to clear before the run counts as won.
    pub(crate) floors: u32,
    /// Milliseconds between two combat exchanges.
    pub(crate) tick_interval_ms: u64,
    /// Milliseconds of simulated time per frame fed to combat.
    pub(crate) frame_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            seed: 0x5eed,
            starting_team: StartingTeam::Balanced,
            floors: 3,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            frame_ms: 100,
        }
    }
}

impl RunConfig {
    /// Reads a configuration file from disk.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read run config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid run config at {}", path.display()))
    }

    /// Parses configuration from TOML text; omitted keys keep their defaults.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse run config toml contents")?;
        if config.version != SUPPORTED_CONFIG_VERSION {
            bail!(
                "unsupported run config version {}; expected {}",
                config.version,
                SUPPORTED_CONFIG_VERSION
            );
        }
        if config.floors == 0 {
            bail!("a run needs at least one floor");
        }
        if config.tick_interval_ms == 0 || config.frame_ms == 0 {
            bail!("tick interval and frame length must be positive");
        }
        Ok(config)
    }

    pub(crate) const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub(crate) const fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = RunConfig::parse("").expect("defaults are valid");
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn keys_override_defaults() {
        let config = RunConfig::parse(
            r#"
            seed = 7
            starting_team = "aggressive"
            floors = 5
            "#,
        )
        .expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.starting_team, StartingTeam::Aggressive);
        assert_eq!(config.floors, 5);
        assert_eq!(config.frame(), Duration::from_millis(100));
    }

    #[test]
    fn unknown_versions_and_keys_are_rejected() {
        assert!(RunConfig::parse("version = 2").is_err());
        assert!(RunConfig::parse("difficulty = \"hard\"").is_err());
        assert!(RunConfig::parse("floors = 0").is_err());
        assert!(RunConfig::parse("starting_team = \"reckless\"").is_err());
    }
}
