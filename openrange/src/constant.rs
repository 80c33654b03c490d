use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelKey {
    A1,
    A2,
    A3,
    A4,
    B1,
    B2,
    B3,
    B4,
}

impl LevelKey {
    /// Resistance first, nearest to farthest, then support in the same order.
    pub const ALL: [LevelKey; 8] = [
        Self::A1,
        Self::A2,
        Self::A3,
        Self::A4,
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
            Self::B4 => "B4",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AnalysisError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "A3" => Ok(Self::A3),
            "A4" => Ok(Self::A4),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "B3" => Ok(Self::B3),
            "B4" => Ok(Self::B4),
            _ => Err(AnalysisError::InvalidConfig(format!("unknown level key: {value}"))),
        }
    }

    pub fn side(self) -> LevelSide {
        match self {
            Self::A1 | Self::A2 | Self::A3 | Self::A4 => LevelSide::Resistance,
            Self::B1 | Self::B2 | Self::B3 | Self::B4 => LevelSide::Support,
        }
    }

    /// Zero-based distance from the opening range: 0 for A1/B1, 3 for A4/B4.
    pub fn tier(self) -> usize {
        match self {
            Self::A1 | Self::B1 => 0,
            Self::A2 | Self::B2 => 1,
            Self::A3 | Self::B3 => 2,
            Self::A4 | Self::B4 => 3,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self.side() {
            LevelSide::Resistance => self.tier(),
            LevelSide::Support => 4 + self.tier(),
        }
    }
}

impl Display for LevelKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelSide {
    Resistance,
    Support,
}

impl LevelSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resistance => "resistance",
            Self::Support => "support",
        }
    }
}

/// Direction of travel into a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
}

impl SignalType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchOutcome {
    Bounce,
    Break,
    Unresolved,
}

impl TouchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bounce => "bounce",
            Self::Break => "break",
            Self::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid opening range: high={high} low={low}")]
    InvalidRange { high: f64, low: f64 },
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid datetime: {0}")]
    InvalidDatetime(String),
    #[error("invalid bar at row {row}: {reason}")]
    InvalidBar { row: usize, reason: String },
    #[error("bars out of order at row {row}")]
    OutOfOrder { row: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
