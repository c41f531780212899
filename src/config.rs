//! Run configuration (spec §6). Precedence, lowest to highest: built-in
//! default < TOML file < environment variable < CLI flag. Grounded on
//! `bme-wacoisd-school-scheduling-rs`'s `toml`+`serde`+`clap` configuration
//! stack for this same problem family (see DESIGN.md).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub time_budget_seconds: u64,
    pub workers: u32,
    pub late_threshold_offset: u32,
    pub late_weight: i64,
    pub capacity_weight: i64,
    pub medium_weight: i64,
    pub lunch_window: BTreeSet<u32>,
    pub days: u32,
    pub slots_per_day: u32,
    /// Open Question 1 (spec §9): whether an owner present in the
    /// availability table but lacking an entry for a given day is treated as
    /// fully unavailable (`true`) or fully available (`false`) that day.
    pub empty_day_means_unavailable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_budget_seconds: 300,
            workers: 8,
            late_threshold_offset: 20,
            late_weight: 500,
            capacity_weight: 1_000_000,
            medium_weight: 5_000,
            lunch_window: BTreeSet::from([8, 9]),
            days: 5,
            slots_per_day: 23,
            empty_day_means_unavailable: false,
        }
    }
}

impl Config {
    /// Loads defaults, then overlays a TOML file if present, then overlays
    /// recognized `SCHED_*` environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        let mut config = Config::default();

        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
            config = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        macro_rules! env_override {
            ($field:ident, $name:literal) => {
                if let Ok(raw) = std::env::var(concat!("SCHED_", $name)) {
                    if let Ok(parsed) = raw.parse() {
                        self.$field = parsed;
                    } else {
                        log::warn!("ignoring unparsable SCHED_{} = {raw:?}", $name);
                    }
                }
            };
        }
        env_override!(time_budget_seconds, "TIME_BUDGET_SECONDS");
        env_override!(workers, "WORKERS");
        env_override!(late_threshold_offset, "LATE_THRESHOLD_OFFSET");
        env_override!(late_weight, "LATE_WEIGHT");
        env_override!(capacity_weight, "CAPACITY_WEIGHT");
        env_override!(medium_weight, "MEDIUM_WEIGHT");
        env_override!(days, "DAYS");
        env_override!(slots_per_day, "SLOTS_PER_DAY");
        env_override!(empty_day_means_unavailable, "EMPTY_DAY_MEANS_UNAVAILABLE");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.time_budget_seconds, 300);
        assert_eq!(config.workers, 8);
        assert_eq!(config.capacity_weight, 1_000_000);
        assert_eq!(config.late_weight, 500);
        assert_eq!(config.lunch_window, BTreeSet::from([8, 9]));
        assert!(!config.empty_day_means_unavailable);
    }
}
