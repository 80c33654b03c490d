//! Opening-range level engine.
//!
//! The high (`A`) and low (`B`) of a session's opening bar span the range
//! `R = A - B`. Resistance levels sit at `A + m_i * R`, support levels at
//! `B - m_i * R`, with one ascending multiplier table shared by both sides.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::bar::Bar;
use crate::config::LevelConfig;
use crate::constant::{AnalysisError, LevelKey, LevelSide};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    high: f64,
    low: f64,
    resistance: [f64; 4],
    support: [f64; 4],
}

impl Levels {
    pub fn compute(high: f64, low: f64, config: &LevelConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let range = high - low;
        if !high.is_finite() || !low.is_finite() || low <= 0.0 || range <= 0.0 {
            return Err(AnalysisError::InvalidRange { high, low });
        }

        let m = config.multipliers;
        Ok(Self {
            high,
            low,
            resistance: m.map(|x| high + x * range),
            support: m.map(|x| low - x * range),
        })
    }

    pub fn from_opening_bar(bar: &Bar, config: &LevelConfig) -> Result<Self, AnalysisError> {
        Self::compute(bar.high, bar.low, config)
    }

    /// Opening bar high (`A`).
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Opening bar low (`B`).
    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn get(&self, key: LevelKey) -> f64 {
        match key.side() {
            LevelSide::Resistance => self.resistance[key.tier()],
            LevelSide::Support => self.support[key.tier()],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LevelKey, f64)> + '_ {
        LevelKey::ALL.into_iter().map(|key| (key, self.get(key)))
    }

    /// Price of the level one tier farther from the range. Past A4/B4 the last
    /// step is repeated.
    pub fn next_outward(&self, key: LevelKey) -> f64 {
        let prices = match key.side() {
            LevelSide::Resistance => &self.resistance,
            LevelSide::Support => &self.support,
        };
        let tier = key.tier();
        if tier + 1 < prices.len() {
            return prices[tier + 1];
        }
        let step = prices[3] - prices[2];
        prices[3] + step
    }
}

impl Serialize for Levels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(10))?;
        map.serialize_entry("A", &self.high)?;
        map.serialize_entry("B", &self.low)?;
        for (key, price) in self.iter() {
            map.serialize_entry(key.as_str(), &price)?;
        }
        map.end()
    }
}

/// Levels derived for one calendar session, or the reason the session was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SessionLevels {
    pub date: chrono::NaiveDate,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub opening_time: chrono::DateTime<chrono::Utc>,
    pub levels: Option<Levels>,
    pub skipped: Option<String>,
}
