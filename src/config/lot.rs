//! Lot configuration structures.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::LotLimits;

/// Bounds of the randomized holding duration, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldConfig {
    /// Shortest stay.
    pub min_ms: u64,
    /// Longest stay (inclusive).
    pub max_ms: u64,
}

/// Lot configuration, supplied at construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingConfig {
    /// Number of spots.
    pub capacity: usize,
    /// How long a queued vehicle waits before timing out, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Holding-duration bounds; `None` keeps vehicles until they exit explicitly.
    #[serde(default)]
    pub hold: Option<HoldConfig>,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            wait_timeout_ms: 10_000,
            hold: Some(HoldConfig {
                min_ms: 0,
                max_ms: 10_000,
            }),
        }
    }
}

impl ParkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if self.wait_timeout_ms == 0 {
            return Err("wait_timeout_ms must be greater than 0".into());
        }
        if let Some(hold) = self.hold {
            if hold.min_ms > hold.max_ms {
                return Err(format!(
                    "hold.min_ms ({}) must not exceed hold.max_ms ({})",
                    hold.min_ms, hold.max_ms
                ));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from the environment, loading `.env` first if present.
    ///
    /// `PARKING_CAPACITY`, `PARKING_WAIT_TIMEOUT_MS`, `PARKING_HOLD_MIN_MS` and
    /// `PARKING_HOLD_MAX_MS` override the defaults. Setting either hold bound
    /// to `none` disables the holding timer.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, String>
        where
            T::Err: std::fmt::Display,
        {
            raw.trim()
                .parse()
                .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))
        }

        let mut cfg = Self::default();
        if let Some(raw) = lookup("PARKING_CAPACITY") {
            cfg.capacity = parse("PARKING_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("PARKING_WAIT_TIMEOUT_MS") {
            cfg.wait_timeout_ms = parse("PARKING_WAIT_TIMEOUT_MS", &raw)?;
        }

        let min = lookup("PARKING_HOLD_MIN_MS");
        let max = lookup("PARKING_HOLD_MAX_MS");
        let disabled = [&min, &max]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| s.trim().eq_ignore_ascii_case("none")));
        if disabled {
            cfg.hold = None;
        } else if let Some(mut hold) = cfg.hold {
            if let Some(raw) = min {
                hold.min_ms = parse("PARKING_HOLD_MIN_MS", &raw)?;
            }
            if let Some(raw) = max {
                hold.max_ms = parse("PARKING_HOLD_MAX_MS", &raw)?;
            }
            cfg.hold = Some(hold);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Runtime limits derived from this configuration.
    pub fn limits(&self) -> LotLimits {
        LotLimits {
            capacity: self.capacity,
            wait_timeout: Duration::from_millis(self.wait_timeout_ms),
            hold: self.hold.map(|h| HoldRange {
                min: Duration::from_millis(h.min_ms),
                max: Duration::from_millis(h.max_ms),
            }),
        }
    }
}

/// Inclusive range a holding duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldRange {
    /// Shortest stay.
    pub min: Duration,
    /// Longest stay.
    pub max: Duration,
}

impl HoldRange {
    /// A range that always yields `stay`.
    pub const fn fixed(stay: Duration) -> Self {
        Self {
            min: stay,
            max: stay,
        }
    }

    /// Draw a stay uniformly from `[min, max]` at millisecond resolution.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let lo = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let hi = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}
