//! Kernel configuration: defaults, environment overlay, JSON file loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const DEFAULT_TOTAL_BUDGET: u64 = 100_000;
pub const DEFAULT_HEADROOM_PERCENT: f64 = 5.0;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;
pub const DEFAULT_SLOTS_PER_ROUND: usize = 10;
pub const MAX_MAILBOX_CAPACITY: usize = 1 << 20;

/// Tunables for one kernel instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Total token budget shared by all engines (allocations plus headroom).
    #[serde(default = "default_total_budget")]
    pub total_budget: u64,
    /// Share of the total budget reserved as shared headroom, in percent.
    #[serde(default = "default_headroom_percent")]
    pub headroom_percent: f64,
    /// Bound on each engine's mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// Nominal number of slots in one scheduling round.
    #[serde(default = "default_slots_per_round")]
    pub slots_per_round: usize,
}

fn default_total_budget() -> u64 {
    DEFAULT_TOTAL_BUDGET
}
fn default_headroom_percent() -> f64 {
    DEFAULT_HEADROOM_PERCENT
}
fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}
fn default_slots_per_round() -> usize {
    DEFAULT_SLOTS_PER_ROUND
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            total_budget: DEFAULT_TOTAL_BUDGET,
            headroom_percent: DEFAULT_HEADROOM_PERCENT,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            slots_per_round: DEFAULT_SLOTS_PER_ROUND,
        }
    }
}

impl KernelConfig {
    /// Config with the given total budget and every other field defaulted.
    pub fn with_budget(total_budget: u64) -> Self {
        Self {
            total_budget,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `CONDUCTOR_*` environment variables.
    ///
    /// Variables that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("CONDUCTOR_TOTAL_BUDGET") {
            config.total_budget = v;
        }
        if let Some(v) = env_parse("CONDUCTOR_HEADROOM_PERCENT") {
            config.headroom_percent = v;
        }
        if let Some(v) = env_parse("CONDUCTOR_MAILBOX_CAPACITY") {
            config.mailbox_capacity = v;
        }
        if let Some(v) = env_parse("CONDUCTOR_SLOTS_PER_ROUND") {
            config.slots_per_round = v;
        }

        debug!(?config, "Kernel config resolved from environment");
        config
    }

    /// Load config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: KernelConfig = serde_json::from_str(&data)?;
        config.validate()?;
        info!("Loaded kernel config from {}", path.display());
        Ok(config)
    }

    /// Reject values the kernel cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.headroom_percent.is_finite()
            || self.headroom_percent < 0.0
            || self.headroom_percent >= 100.0
        {
            return Err(Error::Config(format!(
                "headroom_percent must be in [0, 100), got {}",
                self.headroom_percent
            )));
        }
        if self.mailbox_capacity == 0 || self.mailbox_capacity > MAX_MAILBOX_CAPACITY {
            return Err(Error::Config(format!(
                "mailbox_capacity must be in 1..={}, got {}",
                MAX_MAILBOX_CAPACITY, self.mailbox_capacity
            )));
        }
        if self.slots_per_round == 0 {
            return Err(Error::Config("slots_per_round must be positive".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::default();
        assert_eq!(config.total_budget, 100_000);
        assert_eq!(config.headroom_percent, 5.0);
        assert_eq!(config.mailbox_capacity, 64);
        assert_eq!(config.slots_per_round, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_budget() {
        let config = KernelConfig::with_budget(250);
        assert_eq!(config.total_budget, 250);
        assert_eq!(config.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
    }

    #[test]
    fn test_validate_rejects_bad_headroom() {
        let mut config = KernelConfig::default();
        config.headroom_percent = 100.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.headroom_percent = -1.0;
        assert!(config.validate().is_err());

        config.headroom_percent = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = KernelConfig {
            mailbox_capacity: 0,
            ..KernelConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_capacity() {
        let config = KernelConfig {
            mailbox_capacity: usize::MAX,
            ..KernelConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = KernelConfig {
            mailbox_capacity: MAX_MAILBOX_CAPACITY,
            ..KernelConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_overlays_and_ignores_garbage() {
        // Only test in this crate touching CONDUCTOR_* variables.
        const KEYS: [&str; 4] = [
            "CONDUCTOR_TOTAL_BUDGET",
            "CONDUCTOR_HEADROOM_PERCENT",
            "CONDUCTOR_MAILBOX_CAPACITY",
            "CONDUCTOR_SLOTS_PER_ROUND",
        ];

        std::env::set_var("CONDUCTOR_TOTAL_BUDGET", "5000");
        std::env::set_var("CONDUCTOR_HEADROOM_PERCENT", " 12.5 ");
        std::env::set_var("CONDUCTOR_MAILBOX_CAPACITY", "8");
        std::env::set_var("CONDUCTOR_SLOTS_PER_ROUND", "20");
        let config = KernelConfig::from_env();
        assert_eq!(config.total_budget, 5000);
        assert_eq!(config.headroom_percent, 12.5);
        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.slots_per_round, 20);

        std::env::set_var("CONDUCTOR_TOTAL_BUDGET", "lots");
        std::env::set_var("CONDUCTOR_HEADROOM_PERCENT", "five");
        std::env::set_var("CONDUCTOR_MAILBOX_CAPACITY", "-3");
        std::env::set_var("CONDUCTOR_SLOTS_PER_ROUND", "");
        assert_eq!(KernelConfig::from_env(), KernelConfig::default());

        for key in KEYS {
            std::env::remove_var(key);
        }
        assert_eq!(KernelConfig::from_env(), KernelConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernel.json");
        std::fs::write(&path, r#"{ "total_budget": 5000, "mailbox_capacity": 8 }"#).unwrap();

        let config = KernelConfig::load(&path).unwrap();
        assert_eq!(config.total_budget, 5000);
        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.headroom_percent, DEFAULT_HEADROOM_PERCENT);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernel.json");
        std::fs::write(&path, r#"{ "headroom_percent": 150 }"#).unwrap();
        assert!(matches!(KernelConfig::load(&path), Err(Error::Config(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(KernelConfig::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = KernelConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
