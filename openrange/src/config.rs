//! Named policy constants for the level, reaction and signal stages.
//!
//! Every stage takes its knobs from [`AnalysisConfig`]. Defaults are usable as-is;
//! YAML documents override individual fields through [`AnalysisConfigPatch`], and
//! [`AnalysisProfileConfig`] layers a per-symbol patch over a shared default.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveTime;
use serde::Deserialize;

use crate::constant::{AnalysisError, DataError};

const DEFAULT_OPEN_TIME: NaiveTime =
    NaiveTime::from_hms_opt(9, 30, 0).expect("09:30 is a valid time");

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Local wall-clock time of the formal open; the bar stamped at this time anchors the levels.
    pub open_time: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open_time: DEFAULT_OPEN_TIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// Multiples of the opening range applied above the high and below the low.
    pub multipliers: [f64; 4],
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            multipliers: [1.0, 2.0, 3.0, 4.0],
        }
    }
}

impl LevelConfig {
    /// Multipliers must be finite, positive and strictly ascending so that the
    /// levels on each side move away from the range in key order.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let m = &self.multipliers;
        if m.iter().any(|x| !x.is_finite() || *x <= 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "multipliers must be positive".to_string(),
            ));
        }
        if m.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InvalidConfig(
                "multipliers must be strictly ascending".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionConfig {
    /// Half-width of the band around a level, in basis points of the level price.
    pub tolerance_bps: f64,
    /// Bars after a touch that may still classify it.
    pub lookahead: usize,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            tolerance_bps: 5.0,
            lookahead: 6,
        }
    }
}

impl ReactionConfig {
    pub fn tolerance_for(&self, level: f64) -> f64 {
        level.abs() * self.tolerance_bps / 10_000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopPolicy {
    /// Stop sits this fraction of the opening range beyond the entry level.
    RangeFraction(f64),
    /// Stop sits on the next level outward.
    NextLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    /// Trailing bars inspected for signals.
    pub scan_window: usize,
    pub confidence_threshold: f64,
    pub min_touches: u32,
    pub risk_reward: f64,
    pub stop_policy: StopPolicy,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            scan_window: 78,
            confidence_threshold: 0.6,
            min_touches: 1,
            risk_reward: 2.0,
            stop_policy: StopPolicy::RangeFraction(0.5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisConfig {
    pub session: SessionConfig,
    pub levels: LevelConfig,
    pub reaction: ReactionConfig,
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfigPatch {
    pub open_time: Option<String>,
    pub multipliers: Option<[f64; 4]>,
    pub tolerance_bps: Option<f64>,
    pub lookahead: Option<usize>,
    pub scan_window: Option<usize>,
    pub confidence_threshold: Option<f64>,
    pub min_touches: Option<u32>,
    pub risk_reward: Option<f64>,
    /// `range_fraction` or `next_level`.
    pub stop_policy: Option<String>,
    pub stop_range_fraction: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisProfileConfig {
    #[serde(default)]
    pub default: AnalysisConfigPatch,
    #[serde(default)]
    pub symbol: HashMap<String, AnalysisConfigPatch>,
}

impl AnalysisConfig {
    pub fn apply_patch(mut self, patch: &AnalysisConfigPatch) -> Result<Self, AnalysisError> {
        if let Some(v) = patch.open_time.as_deref() {
            self.session.open_time = parse_open_time(v)?;
        }
        if let Some(v) = patch.multipliers {
            self.levels.multipliers = v;
        }
        if let Some(v) = patch.tolerance_bps {
            self.reaction.tolerance_bps = v;
        }
        if let Some(v) = patch.lookahead {
            self.reaction.lookahead = v;
        }
        if let Some(v) = patch.scan_window {
            self.signal.scan_window = v;
        }
        if let Some(v) = patch.confidence_threshold {
            self.signal.confidence_threshold = v;
        }
        if let Some(v) = patch.min_touches {
            self.signal.min_touches = v;
        }
        if let Some(v) = patch.risk_reward {
            self.signal.risk_reward = v;
        }

        let fraction = patch.stop_range_fraction.or(match self.signal.stop_policy {
            StopPolicy::RangeFraction(f) => Some(f),
            StopPolicy::NextLevel => None,
        });
        match patch.stop_policy.as_deref().map(normalize_key).as_deref() {
            Some("next_level") => self.signal.stop_policy = StopPolicy::NextLevel,
            Some("range_fraction") => {
                self.signal.stop_policy = StopPolicy::RangeFraction(fraction.unwrap_or(0.5))
            }
            Some(other) => {
                return Err(AnalysisError::InvalidConfig(format!(
                    "unknown stop policy: {other}"
                )));
            }
            None => {
                if let (Some(f), StopPolicy::RangeFraction(_)) =
                    (patch.stop_range_fraction, self.signal.stop_policy)
                {
                    self.signal.stop_policy = StopPolicy::RangeFraction(f);
                }
            }
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.levels.validate()?;
        if !self.reaction.tolerance_bps.is_finite() || self.reaction.tolerance_bps < 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "tolerance_bps must be >= 0".to_string(),
            ));
        }
        if self.reaction.lookahead == 0 {
            return Err(AnalysisError::InvalidConfig(
                "lookahead must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.signal.confidence_threshold) {
            return Err(AnalysisError::InvalidConfig(
                "confidence_threshold must be within [0, 1]".to_string(),
            ));
        }
        if !self.signal.risk_reward.is_finite() || self.signal.risk_reward <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "risk_reward must be > 0".to_string(),
            ));
        }
        if let StopPolicy::RangeFraction(f) = self.signal.stop_policy {
            if !f.is_finite() || f <= 0.0 {
                return Err(AnalysisError::InvalidConfig(
                    "stop_range_fraction must be > 0".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        let patch: AnalysisConfigPatch = serde_yaml::from_str(yaml)?;
        let config = Self::default().apply_patch(&patch)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }
}

impl AnalysisProfileConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DataError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn resolve_for(&self, symbol: &str) -> Result<AnalysisConfig, AnalysisError> {
        let mut config = AnalysisConfig::default().apply_patch(&self.default)?;
        let symbol_norm = normalize_key(symbol);
        if let Some(patch) = self
            .symbol
            .iter()
            .find(|(k, _)| normalize_key(k) == symbol_norm)
            .map(|(_, v)| v)
        {
            config = config.apply_patch(patch)?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn parse_open_time(value: &str) -> Result<NaiveTime, AnalysisError> {
    let value = value.trim();
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|pattern| NaiveTime::parse_from_str(value, pattern).ok())
        .ok_or_else(|| AnalysisError::InvalidConfig(format!("invalid open_time: {value}")))
}
