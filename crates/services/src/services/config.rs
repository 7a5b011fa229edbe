//! Runtime configuration, read once from the environment at startup.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// When false, visits are created pending and assigned manually only.
    pub auto_assign_enabled: bool,
    /// Interval of the background sweep over unassigned pending visits.
    pub sweep_interval_secs: u64,
    /// Minutes an `assigned` visit may wait before it reverts to pending.
    pub confirmation_timeout_minutes: i64,
    /// Share of the fee cleared before work starts. Remainder is paid on
    /// completion.
    pub upfront_share: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_assign_enabled: true,
            sweep_interval_secs: 30,
            confirmation_timeout_minutes: 60,
            upfront_share: 0.20,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            auto_assign_enabled: env_parse("FIELDOPS_AUTO_ASSIGN", defaults.auto_assign_enabled),
            sweep_interval_secs: env_parse(
                "FIELDOPS_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            ),
            confirmation_timeout_minutes: env_parse(
                "FIELDOPS_CONFIRMATION_TIMEOUT_MINUTES",
                defaults.confirmation_timeout_minutes,
            ),
            upfront_share: defaults.upfront_share,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
