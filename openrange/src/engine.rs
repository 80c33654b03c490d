use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bar::Bar;
use crate::config::{AnalysisConfig, AnalysisProfileConfig};
use crate::constant::AnalysisError;
use crate::levels::{Levels, SessionLevels};
use crate::reaction::{ReactionAnalyzer, TouchEvent};
use crate::session::{Session, latest_session, parse_timezone, segment_sessions};
use crate::signal::{Signal, SignalGenerator};
use crate::stats::PatternStats;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSnapshot {
    pub symbol: String,
    pub timezone: String,
    pub session_date: Option<NaiveDate>,
    pub opening_bar: Option<Bar>,
    pub levels: Option<Levels>,
    pub stats: PatternStats,
    pub touches: Vec<TouchEvent>,
    pub signals: Vec<Signal>,
    pub sessions: Vec<SessionLevels>,
    /// Why level-dependent output is missing, if it is.
    pub skipped: Option<String>,
}

impl AnalysisSnapshot {
    fn empty(symbol: &str, timezone: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            timezone: timezone.to_string(),
            session_date: None,
            opening_bar: None,
            levels: None,
            stats: PatternStats::default(),
            touches: Vec::new(),
            signals: Vec::new(),
            sessions: Vec::new(),
            skipped: None,
        }
    }
}

/// Runs bars → levels → reaction stats → signals for one symbol.
pub struct AnalysisEngine {
    symbol: String,
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(
        symbol: impl Into<String>,
        config: AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            symbol: symbol.into(),
            config,
        })
    }

    pub fn from_profile(
        symbol: impl Into<String>,
        profile: &AnalysisProfileConfig,
    ) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        let config = profile.resolve_for(&symbol)?;
        Ok(Self { symbol, config })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, bars: &[Bar], timezone: &str) -> Result<AnalysisSnapshot, AnalysisError> {
        let tz = parse_timezone(timezone)?;
        let mut snapshot = AnalysisSnapshot::empty(&self.symbol, timezone);

        let sessions = segment_sessions(bars, tz, self.config.session.open_time);
        let latest = match latest_session(&sessions) {
            Ok(session) => *session,
            Err(err) => {
                debug!(symbol = %self.symbol, %err, "nothing to analyse");
                snapshot.skipped = Some(err.to_string());
                return Ok(snapshot);
            }
        };
        snapshot.sessions = self.session_levels(bars, &sessions);

        let opening = latest.opening_bar(bars);
        snapshot.session_date = Some(latest.date);
        snapshot.opening_bar = Some(opening.clone());

        let levels = match Levels::from_opening_bar(opening, &self.config.levels) {
            Ok(levels) => levels,
            Err(err @ AnalysisError::InvalidRange { .. }) => {
                warn!(symbol = %self.symbol, date = %latest.date, %err, "latest session skipped");
                snapshot.skipped = Some(err.to_string());
                return Ok(snapshot);
            }
            Err(err) => return Err(err),
        };

        let report = ReactionAnalyzer::new(self.config.reaction.clone())
            .analyze_sessions(bars, &sessions, &levels);
        let signals = SignalGenerator::new(self.config.signal.clone(), self.config.reaction.clone())
            .generate(bars, &sessions, &levels, &report.stats);

        info!(
            symbol = %self.symbol,
            date = %latest.date,
            sessions = sessions.len(),
            bars = bars.len(),
            touches = report.stats.total_touches(),
            signals = signals.len(),
            "analysis complete"
        );

        snapshot.levels = Some(levels);
        snapshot.stats = report.stats;
        snapshot.touches = report.events;
        snapshot.signals = signals;
        Ok(snapshot)
    }

    /// Levels per session; sessions whose opening bar has no range carry the reason instead.
    pub fn session_levels(&self, bars: &[Bar], sessions: &[Session]) -> Vec<SessionLevels> {
        sessions
            .iter()
            .map(|session| {
                let opening = session.opening_bar(bars);
                let (levels, skipped) =
                    match Levels::from_opening_bar(opening, &self.config.levels) {
                        Ok(levels) => (Some(levels), None),
                        Err(err) => {
                            debug!(date = %session.date, %err, "session skipped");
                            (None, Some(err.to_string()))
                        }
                    };
                SessionLevels {
                    date: session.date,
                    opening_time: opening.time,
                    levels,
                    skipped,
                }
            })
            .collect()
    }
}
