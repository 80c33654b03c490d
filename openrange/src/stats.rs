use serde::Serialize;

use crate::constant::{LevelKey, TouchOutcome};
use crate::reaction::TouchEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelStat {
    pub key: LevelKey,
    pub touches: u32,
    pub bounces: u32,
    pub breaks: u32,
}

impl LevelStat {
    pub fn empty(key: LevelKey) -> Self {
        Self {
            key,
            touches: 0,
            bounces: 0,
            breaks: 0,
        }
    }

    /// `bounces / max(1, touches)`; unresolved touches count against the rate.
    pub fn bounce_rate(&self) -> f64 {
        self.bounces as f64 / self.touches.max(1) as f64
    }

    pub fn unresolved(&self) -> u32 {
        self.touches - self.bounces - self.breaks
    }

    fn record(&mut self, outcome: TouchOutcome) {
        self.touches += 1;
        match outcome {
            TouchOutcome::Bounce => self.bounces += 1,
            TouchOutcome::Break => self.breaks += 1,
            TouchOutcome::Unresolved => {}
        }
    }
}

/// One row per level, always all eight, in `LevelKey::ALL` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternStats {
    rows: [LevelStat; 8],
}

impl Default for PatternStats {
    fn default() -> Self {
        Self {
            rows: LevelKey::ALL.map(LevelStat::empty),
        }
    }
}

impl PatternStats {
    pub fn from_events(events: &[TouchEvent]) -> Self {
        let mut stats = Self::default();
        for event in events {
            stats.rows[event.level.index()].record(event.outcome);
        }
        stats
    }

    pub fn get(&self, key: LevelKey) -> &LevelStat {
        &self.rows[key.index()]
    }

    pub fn rows(&self) -> &[LevelStat] {
        &self.rows
    }

    pub fn total_touches(&self) -> u32 {
        self.rows.iter().map(|x| x.touches).sum()
    }
}
