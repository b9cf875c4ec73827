//! # Runtime configuration.
//!
//! Provides [`Config`], the settings shared by the [`Orchestrator`](crate::Orchestrator)
//! and the [`LifecycleController`](crate::LifecycleController).
//!
//! ## Sentinel values
//! - `task_timeout = 0s` → no per-task timeout
//! - `bus_capacity = 0` → clamped to 1
//!
//! `bus_capacity` above [`MAX_BUS_CAPACITY`] is rejected when loaded from the
//! environment and clamped when set in code; each ring allocates its slots up front.
//!
//! ## Environment
//! | Variable                         | Field          | Unit    |
//! |----------------------------------|----------------|---------|
//! | `MEMBERVISOR_BUS_CAPACITY`       | `bus_capacity` | events  |
//! | `MEMBERVISOR_GRACE_SECS`         | `grace`        | seconds |
//! | `MEMBERVISOR_TASK_TIMEOUT_SECS`  | `task_timeout` | seconds |

use std::time::Duration;

use crate::error::ConfigError;

/// Largest accepted event bus capacity.
pub const MAX_BUS_CAPACITY: usize = 1 << 16;

/// Global configuration for the orchestrator runtime.
///
/// ## Field semantics
/// - `bus_capacity`: size of each event bus ring; on the failures ring it is how
///   many failures an error stream may fall behind before it starts skipping them
/// - `grace`: how long shutdown waits for in-flight tasks before forcing exit
/// - `task_timeout`: per-task execution bound (`0s` = none)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Maximum time the shutdown path waits for in-flight tasks.
    ///
    /// When it elapses the runtime token is cancelled, a warning is logged and
    /// the shutdown is reported as forced.
    pub grace: Duration,

    /// Per-task timeout.
    ///
    /// - `Duration::ZERO` = tasks run until they return
    /// - `> 0` = the task's token is cancelled and `TaskError::Timeout` is reported
    pub task_timeout: Duration,
}

impl Config {
    /// Returns the per-task timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.task_timeout == Duration::ZERO {
            None
        } else {
            Some(self.task_timeout)
        }
    }

    /// Returns the bus capacity clamped to `1..=MAX_BUS_CAPACITY`.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.clamp(1, MAX_BUS_CAPACITY)
    }

    /// Loads configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("MEMBERVISOR_BUS_CAPACITY") {
            cfg.bus_capacity = parse_capacity("MEMBERVISOR_BUS_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("MEMBERVISOR_GRACE_SECS") {
            cfg.grace = Duration::from_secs(parse_number("MEMBERVISOR_GRACE_SECS", &v)?);
        }
        if let Some(v) = lookup("MEMBERVISOR_TASK_TIMEOUT_SECS") {
            cfg.task_timeout =
                Duration::from_secs(parse_number("MEMBERVISOR_TASK_TIMEOUT_SECS", &v)?);
        }
        Ok(cfg)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    /// - `task_timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
            task_timeout: Duration::ZERO,
        }
    }
}

/// Parses a non-negative integer setting.
pub(crate) fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            details: "expected a non-negative integer",
        })
}

/// Parses a bus capacity within `0..=MAX_BUS_CAPACITY`.
fn parse_capacity(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    let n = parse_number(var, value)?;
    usize::try_from(n)
        .ok()
        .filter(|n| *n <= MAX_BUS_CAPACITY)
        .ok_or_else(|| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            details: "exceeds the maximum bus capacity (65536)",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_keys_keep_defaults() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.default_timeout(), None);
    }

    #[test]
    fn reads_all_keys() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MEMBERVISOR_BUS_CAPACITY", "16"),
            ("MEMBERVISOR_GRACE_SECS", "5"),
            ("MEMBERVISOR_TASK_TIMEOUT_SECS", " 2 "),
        ]);
        let cfg = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.bus_capacity, 16);
        assert_eq!(cfg.grace, Duration::from_secs(5));
        assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn rejects_garbage() {
        let err = Config::from_lookup(|k| (k == "MEMBERVISOR_GRACE_SECS").then(|| "soon".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "MEMBERVISOR_GRACE_SECS", .. }
        ));
    }

    #[test]
    fn rejects_oversized_bus_capacity() {
        for value in ["18446744073709551615", "65537"] {
            let err = Config::from_lookup(|k| {
                (k == "MEMBERVISOR_BUS_CAPACITY").then(|| value.to_string())
            })
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { var: "MEMBERVISOR_BUS_CAPACITY", .. }
            ));
        }

        let cfg =
            Config::from_lookup(|k| (k == "MEMBERVISOR_BUS_CAPACITY").then(|| "65536".into()))
                .unwrap();
        assert_eq!(cfg.bus_capacity, MAX_BUS_CAPACITY);
    }

    #[test]
    fn oversized_capacity_set_in_code_is_clamped() {
        let cfg = Config {
            bus_capacity: usize::MAX,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), MAX_BUS_CAPACITY);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
