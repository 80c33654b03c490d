//! Offline driver for the opening-range pipeline: CSV bars in, chart payload out.

use std::path::Path;

use chrono::NaiveDate;
use openrange::{
    AnalysisConfig, AnalysisEngine, AnalysisSnapshot, Bar, DataError, Levels, load_bars_csv,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ExportPayload {
    pub symbol: String,
    pub timezone: String,
    pub session_date: Option<NaiveDate>,
    pub skipped: Option<String>,
    pub candles: Vec<CandlePoint>,
    pub levels: Vec<LevelLine>,
    pub stats: Vec<StatRow>,
    pub touches: Vec<TouchMarker>,
    pub signals: Vec<SignalMarker>,
    pub sessions: Vec<SessionRow>,
}

#[derive(Debug, Serialize)]
pub struct CandlePoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Serialize)]
pub struct LevelLine {
    pub key: String,
    pub side: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct StatRow {
    pub level: String,
    pub touches: u32,
    pub bounces: u32,
    pub breaks: u32,
    pub bounce_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct TouchMarker {
    pub time: i64,
    pub level: String,
    pub price: f64,
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct SignalMarker {
    pub time: i64,
    pub kind: String,
    pub level: String,
    pub reason: String,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk: f64,
    pub reward: f64,
}

#[derive(Debug, Serialize)]
pub struct SessionRow {
    pub date: NaiveDate,
    pub opening_time: i64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub skipped: Option<String>,
}

/// Loads `csv_path` and runs the engine for `symbol` under `timezone`.
pub fn analyze_csv(
    csv_path: impl AsRef<Path>,
    symbol: &str,
    timezone: &str,
    config: AnalysisConfig,
) -> Result<(Vec<Bar>, AnalysisSnapshot), DataError> {
    let bars = load_bars_csv(csv_path)?;
    let engine = AnalysisEngine::with_config(symbol, config)?;
    let snapshot = engine.run(&bars, timezone)?;
    info!(
        symbol,
        bars = bars.len(),
        signals = snapshot.signals.len(),
        "replay analysed"
    );
    Ok((bars, snapshot))
}

pub fn build_payload(bars: &[Bar], snapshot: &AnalysisSnapshot) -> ExportPayload {
    let candles = bars
        .iter()
        .map(|bar| CandlePoint {
            time: bar.timestamp(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        })
        .collect();

    let levels = snapshot
        .levels
        .as_ref()
        .map(level_lines)
        .unwrap_or_default();

    let stats = snapshot
        .stats
        .rows()
        .iter()
        .map(|row| StatRow {
            level: row.key.to_string(),
            touches: row.touches,
            bounces: row.bounces,
            breaks: row.breaks,
            bounce_pct: (row.bounce_rate() * 1000.0).round() / 10.0,
        })
        .collect();

    let touches = snapshot
        .touches
        .iter()
        .map(|event| TouchMarker {
            time: event.time.timestamp(),
            level: event.level.to_string(),
            price: event.price,
            outcome: event.outcome.as_str().to_string(),
        })
        .collect();

    let signals = snapshot
        .signals
        .iter()
        .map(|signal| SignalMarker {
            time: signal.time.timestamp(),
            kind: signal.signal_type.as_str().to_string(),
            level: signal.level.to_string(),
            reason: signal.reason.clone(),
            entry: signal.entry,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            risk: signal.risk(),
            reward: signal.reward(),
        })
        .collect();

    let sessions = snapshot
        .sessions
        .iter()
        .map(|row| SessionRow {
            date: row.date,
            opening_time: row.opening_time.timestamp(),
            high: row.levels.map(|l| l.high()),
            low: row.levels.map(|l| l.low()),
            skipped: row.skipped.clone(),
        })
        .collect();

    ExportPayload {
        symbol: snapshot.symbol.clone(),
        timezone: snapshot.timezone.clone(),
        session_date: snapshot.session_date,
        skipped: snapshot.skipped.clone(),
        candles,
        levels,
        stats,
        touches,
        signals,
        sessions,
    }
}

fn level_lines(levels: &Levels) -> Vec<LevelLine> {
    levels
        .iter()
        .map(|(key, price)| LevelLine {
            key: key.to_string(),
            side: key.side().as_str().to_string(),
            price,
        })
        .collect()
}
