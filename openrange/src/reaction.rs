//! Touch detection and bounce/break classification around derived levels.
//!
//! Each level is scanned independently by a [`LevelScanner`], a small state
//! machine over the bar sequence:
//!
//! - `Unanchored`: no bar has been seen strictly on one side of the level yet;
//! - `Away(side)`: the last bar sat fully above or below the tolerance band;
//! - `Touching`: a bar reached the band after being away, the outcome is pending;
//! - `Resolved(outcome)`: the touch was classified (bounce, break or unresolved)
//!   and price has not left the band since.
//!
//! A bar is near a level when its high-low range intersects
//! `[level - tol, level + tol]`. Only a near bar arriving from `Away` opens a
//! touch, so bars lingering inside the band never count twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::bar::Bar;
use crate::config::ReactionConfig;
use crate::constant::{AnalysisError, Direction, LevelKey, TouchOutcome};
use crate::levels::Levels;
use crate::session::{Session, parse_timezone, segment_days};
use crate::stats::PatternStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Below,
    Above,
}

impl Side {
    /// Travel direction of price leaving this side towards the level.
    pub fn approach(self) -> Direction {
        match self {
            Self::Below => Direction::Up,
            Self::Above => Direction::Down,
        }
    }

    /// Side of a bar that stays clear of the band whose lower edge is `lower`.
    pub(crate) fn of(bar: &Bar, lower: f64) -> Self {
        if bar.high < lower {
            Self::Below
        } else {
            Self::Above
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Unanchored,
    Away(Side),
    Touching { approach: Direction, elapsed: usize },
    Resolved(TouchOutcome),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TouchEvent {
    pub level: LevelKey,
    pub price: f64,
    /// Index of the touching bar in the analysed slice.
    pub index: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub approach: Direction,
    pub outcome: TouchOutcome,
    /// Bar that settled the outcome; `None` while unresolved.
    pub resolved_index: Option<usize>,
}

pub struct LevelScanner {
    key: LevelKey,
    price: f64,
    lower: f64,
    upper: f64,
    lookahead: usize,
    state: ScanState,
    open: Option<TouchEvent>,
    events: Vec<TouchEvent>,
}

impl LevelScanner {
    pub fn new(key: LevelKey, price: f64, config: &ReactionConfig) -> Self {
        let tol = config.tolerance_for(price);
        Self {
            key,
            price,
            lower: price - tol,
            upper: price + tol,
            lookahead: config.lookahead.max(1),
            state: ScanState::Unanchored,
            open: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_near(&self, bar: &Bar) -> bool {
        bar.overlaps(self.lower, self.upper)
    }

    pub fn step(&mut self, index: usize, bar: &Bar) {
        let near = self.is_near(bar);
        let state = self.state;
        self.state = match state {
            ScanState::Unanchored | ScanState::Resolved(_) if near => state,
            ScanState::Unanchored | ScanState::Resolved(_) => ScanState::Away(self.side_of(bar)),
            ScanState::Away(side) if near => self.open_touch(index, bar, side),
            ScanState::Away(_) => ScanState::Away(self.side_of(bar)),
            ScanState::Touching { approach, elapsed } => {
                let elapsed = elapsed + 1;
                match self.classify_close(bar.close, approach) {
                    Some(outcome) => {
                        self.close_touch(outcome, Some(index));
                        if near {
                            ScanState::Resolved(outcome)
                        } else {
                            ScanState::Away(self.side_of(bar))
                        }
                    }
                    None if elapsed >= self.lookahead => {
                        self.close_touch(TouchOutcome::Unresolved, None);
                        ScanState::Resolved(TouchOutcome::Unresolved)
                    }
                    None => ScanState::Touching { approach, elapsed },
                }
            }
        };
    }

    /// Lookahead never crosses a session boundary; a pending touch stays unresolved.
    pub fn end_session(&mut self) {
        if let ScanState::Touching { .. } = self.state {
            self.close_touch(TouchOutcome::Unresolved, None);
            self.state = ScanState::Resolved(TouchOutcome::Unresolved);
        }
    }

    pub fn finish(mut self) -> Vec<TouchEvent> {
        self.end_session();
        self.events
    }

    fn open_touch(&mut self, index: usize, bar: &Bar, side: Side) -> ScanState {
        let approach = side.approach();
        let event = TouchEvent {
            level: self.key,
            price: self.price,
            index,
            time: bar.time,
            approach,
            outcome: TouchOutcome::Unresolved,
            resolved_index: None,
        };

        // A bar spanning the whole band went through the level in one print.
        if bar.low < self.lower && bar.high > self.upper {
            let through = (bar.close - self.price) * approach.sign() > 0.0;
            let outcome = if through {
                TouchOutcome::Break
            } else {
                TouchOutcome::Bounce
            };
            self.events.push(TouchEvent {
                outcome,
                resolved_index: Some(index),
                ..event
            });
            return ScanState::Resolved(outcome);
        }

        self.open = Some(event);
        ScanState::Touching {
            approach,
            elapsed: 0,
        }
    }

    fn close_touch(&mut self, outcome: TouchOutcome, resolved_index: Option<usize>) {
        if let Some(mut event) = self.open.take() {
            event.outcome = outcome;
            event.resolved_index = resolved_index;
            self.events.push(event);
        }
    }

    fn classify_close(&self, close: f64, approach: Direction) -> Option<TouchOutcome> {
        let (beyond, back) = match approach {
            Direction::Up => (close > self.upper, close < self.lower),
            Direction::Down => (close < self.lower, close > self.upper),
        };
        if beyond {
            Some(TouchOutcome::Break)
        } else if back {
            Some(TouchOutcome::Bounce)
        } else {
            None
        }
    }

    fn side_of(&self, bar: &Bar) -> Side {
        Side::of(bar, self.lower)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReactionReport {
    pub stats: PatternStats,
    pub events: Vec<TouchEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionAnalyzer {
    config: ReactionConfig,
}

impl ReactionAnalyzer {
    pub fn new(config: ReactionConfig) -> Self {
        Self { config }
    }

    /// Segments `bars` by local date in `timezone` and aggregates reactions.
    pub fn analyze(
        &self,
        bars: &[Bar],
        timezone: &str,
        levels: &Levels,
    ) -> Result<PatternStats, AnalysisError> {
        let tz = parse_timezone(timezone)?;
        let sessions = segment_days(bars, tz);
        Ok(self.analyze_sessions(bars, &sessions, levels).stats)
    }

    pub fn analyze_sessions(
        &self,
        bars: &[Bar],
        sessions: &[Session],
        levels: &Levels,
    ) -> ReactionReport {
        let mut events = Vec::new();
        for (key, price) in levels.iter() {
            let mut scanner = LevelScanner::new(key, price, &self.config);
            for session in sessions {
                for index in session.start..session.end {
                    scanner.step(index, &bars[index]);
                }
                scanner.end_session();
            }
            let found = scanner.finish();
            debug!(
                level = key.as_str(),
                price,
                touches = found.len(),
                "level scan complete"
            );
            events.extend(found);
        }
        events.sort_by_key(|e| (e.index, e.level));

        ReactionReport {
            stats: PatternStats::from_events(&events),
            events,
        }
    }
}

pub fn analyze_reactions(
    bars: &[Bar],
    timezone: &str,
    levels: &Levels,
    config: &ReactionConfig,
) -> Result<PatternStats, AnalysisError> {
    ReactionAnalyzer::new(config.clone()).analyze(bars, timezone, levels)
}
