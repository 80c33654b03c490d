pub mod bar;
pub mod config;
pub mod constant;
pub mod engine;
pub mod export;
pub mod levels;
pub mod logging;
pub mod reaction;
pub mod receiver;
pub mod session;
pub mod signal;
pub mod stats;

pub use bar::Bar;
pub use config::{
	AnalysisConfig, AnalysisConfigPatch, AnalysisProfileConfig, LevelConfig, ReactionConfig,
	SessionConfig, SignalConfig, StopPolicy,
};
pub use constant::{
	AnalysisError, DataError, Direction, LevelKey, LevelSide, SignalType, TouchOutcome,
};
pub use engine::{AnalysisEngine, AnalysisSnapshot};
pub use export::{levels_frame, signals_frame, stats_frame, write_parquet_snapshot};
pub use levels::{Levels, SessionLevels};
pub use logging::{init_logging, init_logging_with};
pub use reaction::{
	LevelScanner, ReactionAnalyzer, ReactionReport, ScanState, Side, TouchEvent,
	analyze_reactions,
};
pub use receiver::{load_bars_csv, parse_time, read_bars_csv, validate_bars};
pub use session::{
	Session, latest_session, local_date, parse_timezone, segment_days, segment_sessions,
};
pub use signal::{Signal, SignalGenerator, generate_signals};
pub use stats::{LevelStat, PatternStats};
