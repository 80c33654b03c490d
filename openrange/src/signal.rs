//! Fade signals at levels with a favourable bounce history.
//!
//! Resistance levels produce sells and support levels produce buys. Entry is the
//! level price. The stop sits beyond the level by the configured stop distance,
//! and the target sits `risk_reward` stop distances back towards the range.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::bar::Bar;
use crate::config::{ReactionConfig, SignalConfig, StopPolicy};
use crate::constant::{AnalysisError, LevelKey, LevelSide, SignalType};
use crate::levels::Levels;
use crate::reaction::Side;
use crate::session::{Session, parse_timezone, segment_days};
use crate::stats::{LevelStat, PatternStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub index: usize,
    pub level: LevelKey,
    pub reason: String,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub bounce_rate: f64,
}

impl Signal {
    pub fn risk(&self) -> f64 {
        (self.stop_loss - self.entry).abs()
    }

    pub fn reward(&self) -> f64 {
        (self.take_profit - self.entry).abs()
    }

    /// True once `bar` trades through either the stop or the target.
    pub fn is_settled_by(&self, bar: &Bar) -> bool {
        match self.signal_type {
            SignalType::Sell => bar.high >= self.stop_loss || bar.low <= self.take_profit,
            SignalType::Buy => bar.low <= self.stop_loss || bar.high >= self.take_profit,
        }
    }
}

/// Signals still open in the current session, one slot per level.
#[derive(Debug, Default)]
struct SignalBook {
    open: [Option<Signal>; 8],
}

impl SignalBook {
    fn reset(&mut self) {
        self.open = Default::default();
    }

    fn settle(&mut self, bar: &Bar) {
        for slot in &mut self.open {
            if slot.as_ref().is_some_and(|s| s.is_settled_by(bar)) {
                *slot = None;
            }
        }
    }

    fn is_open(&self, key: LevelKey) -> bool {
        self.open[key.index()].is_some()
    }

    fn insert(&mut self, signal: Signal) {
        let idx = signal.level.index();
        self.open[idx] = Some(signal);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    config: SignalConfig,
    reaction: ReactionConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig, reaction: ReactionConfig) -> Self {
        Self { config, reaction }
    }

    /// Segments `bars` by local date in `timezone` before generating.
    pub fn generate_in(
        &self,
        bars: &[Bar],
        timezone: &str,
        levels: &Levels,
        stats: &PatternStats,
    ) -> Result<Vec<Signal>, AnalysisError> {
        let tz = parse_timezone(timezone)?;
        let sessions = segment_days(bars, tz);
        Ok(self.generate(bars, &sessions, levels, stats))
    }

    /// Session ranges reaching past `bars` are clamped to it.
    pub fn generate(
        &self,
        bars: &[Bar],
        sessions: &[Session],
        levels: &Levels,
        stats: &PatternStats,
    ) -> Vec<Signal> {
        let eligible = levels
            .iter()
            .map(|(key, price)| (key, price, stats.get(key)))
            .filter(|(_, _, stat)| self.is_eligible(stat))
            .collect::<Vec<_>>();
        if bars.is_empty() || eligible.is_empty() {
            debug!(bars = bars.len(), "no eligible levels for signals");
            return Vec::new();
        }

        let start = bars.len().saturating_sub(self.config.scan_window);
        let mut out = Vec::new();
        let mut book = SignalBook::default();
        // Last side each level was seen from; tracked over the whole history so the
        // first bars of the window know where price came from.
        let mut sides: Vec<Option<Side>> = vec![None; eligible.len()];
        for session in sessions {
            book.reset();
            let end = session.end.min(bars.len());
            for index in session.start.min(end)..end {
                let bar = &bars[index];
                book.settle(bar);
                for (slot, &(key, price, stat)) in eligible.iter().enumerate() {
                    let tol = self.reaction.tolerance_for(price);
                    if !bar.overlaps(price - tol, price + tol) {
                        sides[slot] = Some(Side::of(bar, price - tol));
                        continue;
                    }
                    if index < start
                        || book.is_open(key)
                        || !is_approaching(bar, key, price, tol, sides[slot])
                    {
                        continue;
                    }
                    if let Some(signal) = self.build(index, bar, key, price, stat, levels) {
                        info!(
                            level = key.as_str(),
                            kind = signal.signal_type.as_str(),
                            entry = signal.entry,
                            stop = signal.stop_loss,
                            target = signal.take_profit,
                            "signal emitted"
                        );
                        book.insert(signal.clone());
                        out.push(signal);
                    }
                }
            }
        }
        out
    }

    fn is_eligible(&self, stat: &LevelStat) -> bool {
        stat.touches >= self.config.min_touches.max(1)
            && stat.bounce_rate() >= self.config.confidence_threshold
    }

    fn stop_distance(&self, key: LevelKey, price: f64, levels: &Levels) -> f64 {
        match self.config.stop_policy {
            StopPolicy::RangeFraction(f) => f * levels.range(),
            StopPolicy::NextLevel => (levels.next_outward(key) - price).abs(),
        }
    }

    fn build(
        &self,
        index: usize,
        bar: &Bar,
        key: LevelKey,
        price: f64,
        stat: &LevelStat,
        levels: &Levels,
    ) -> Option<Signal> {
        let distance = self.stop_distance(key, price, levels);
        let reward = self.config.risk_reward * distance;
        if !(distance.is_finite() && distance > 0.0 && reward.is_finite() && reward > 0.0) {
            return None;
        }
        let (signal_type, stop_loss, take_profit) = match key.side() {
            LevelSide::Resistance => (SignalType::Sell, price + distance, price - reward),
            LevelSide::Support => (SignalType::Buy, price - distance, price + reward),
        };
        if stop_loss <= 0.0 || take_profit <= 0.0 {
            debug!(level = key.as_str(), stop_loss, take_profit, "signal dropped: non-positive price");
            return None;
        }

        let rate = stat.bounce_rate();
        Some(Signal {
            signal_type,
            time: bar.time,
            index,
            level: key,
            reason: format!(
                "{} {} bounce {:.0}% ({}/{})",
                key,
                key.side().as_str(),
                rate * 100.0,
                stat.bounces,
                stat.touches
            ),
            entry: price,
            stop_loss,
            take_profit,
            bounce_rate: rate,
        })
    }
}

/// A bar in the band arriving from the level's fading side that has not closed
/// through it: from below for resistance, from above for support.
fn is_approaching(bar: &Bar, key: LevelKey, price: f64, tol: f64, from: Option<Side>) -> bool {
    match (key.side(), from) {
        (LevelSide::Resistance, Some(Side::Below)) => bar.close <= price + tol,
        (LevelSide::Support, Some(Side::Above)) => bar.close >= price - tol,
        _ => false,
    }
}

pub fn generate_signals(
    bars: &[Bar],
    timezone: &str,
    levels: &Levels,
    stats: &PatternStats,
    config: &SignalConfig,
    reaction: &ReactionConfig,
) -> Result<Vec<Signal>, AnalysisError> {
    SignalGenerator::new(config.clone(), reaction.clone()).generate_in(bars, timezone, levels, stats)
}
