//! Tabular views of the analysis output for presentation layers.

use std::fs::{File, create_dir_all};
use std::path::Path;

use polars::prelude::*;

use crate::constant::DataError;
use crate::engine::AnalysisSnapshot;
use crate::levels::Levels;
use crate::signal::Signal;
use crate::stats::PatternStats;

pub fn levels_frame(levels: &Levels) -> PolarsResult<DataFrame> {
    let rows = levels.iter().collect::<Vec<_>>();
    df!(
        "level" => rows.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
        "side" => rows.iter().map(|(k, _)| k.side().as_str()).collect::<Vec<_>>(),
        "price" => rows.iter().map(|(_, p)| *p).collect::<Vec<_>>()
    )
}

pub fn stats_frame(stats: &PatternStats) -> PolarsResult<DataFrame> {
    let rows = stats.rows();
    df!(
        "level" => rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
        "touches" => rows.iter().map(|r| r.touches).collect::<Vec<_>>(),
        "bounces" => rows.iter().map(|r| r.bounces).collect::<Vec<_>>(),
        "breaks" => rows.iter().map(|r| r.breaks).collect::<Vec<_>>(),
        "unresolved" => rows.iter().map(|r| r.unresolved()).collect::<Vec<_>>(),
        "bounce_pct" => rows.iter().map(|r| r.bounce_rate() * 100.0).collect::<Vec<_>>()
    )
}

pub fn signals_frame(signals: &[Signal]) -> PolarsResult<DataFrame> {
    df!(
        "time" => signals.iter().map(|s| s.time.timestamp()).collect::<Vec<_>>(),
        "type" => signals.iter().map(|s| s.signal_type.as_str()).collect::<Vec<_>>(),
        "level" => signals.iter().map(|s| s.level.as_str()).collect::<Vec<_>>(),
        "reason" => signals.iter().map(|s| s.reason.clone()).collect::<Vec<_>>(),
        "entry" => signals.iter().map(|s| s.entry).collect::<Vec<_>>(),
        "stop_loss" => signals.iter().map(|s| s.stop_loss).collect::<Vec<_>>(),
        "take_profit" => signals.iter().map(|s| s.take_profit).collect::<Vec<_>>(),
        "bounce_rate" => signals.iter().map(|s| s.bounce_rate).collect::<Vec<_>>()
    )
}

/// Writes `levels.parquet` (when levels exist), `stats.parquet` and `signals.parquet`.
pub fn write_parquet_snapshot(
    snapshot: &AnalysisSnapshot,
    output_dir: impl AsRef<Path>,
) -> Result<(), DataError> {
    let output_dir = output_dir.as_ref();
    create_dir_all(output_dir)?;

    if let Some(levels) = &snapshot.levels {
        let mut levels_df = levels_frame(levels)?;
        let mut levels_file = File::create(output_dir.join("levels.parquet"))?;
        ParquetWriter::new(&mut levels_file).finish(&mut levels_df)?;
    }

    let mut stats_df = stats_frame(&snapshot.stats)?;
    let mut stats_file = File::create(output_dir.join("stats.parquet"))?;
    ParquetWriter::new(&mut stats_file).finish(&mut stats_df)?;

    let mut signals_df = signals_frame(&snapshot.signals)?;
    let mut signals_file = File::create(output_dir.join("signals.parquet"))?;
    ParquetWriter::new(&mut signals_file).finish(&mut signals_df)?;

    Ok(())
}
