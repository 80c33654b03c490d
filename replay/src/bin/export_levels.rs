use std::fs;
use std::path::PathBuf;

use openrange::{AnalysisConfig, init_logging, init_logging_with};
use replay::{analyze_csv, build_payload};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "usage: cargo run -p replay --bin export_levels -- <csv_path> <symbol> <timezone> [output_json] [config_yaml|-] [log_filter]"
        );
        std::process::exit(2);
    }
    match args.get(6) {
        Some(directives) => init_logging_with(directives),
        None => init_logging(),
    }

    let csv_path = PathBuf::from(&args[1]);
    let symbol = args[2].clone();
    let timezone = args[3].clone();
    let output = if args.len() >= 5 {
        PathBuf::from(&args[4])
    } else {
        PathBuf::from(format!("replay/out/levels-{}.json", symbol.to_ascii_lowercase()))
    };
    let config = if args.len() >= 6 && args[5] != "-" {
        AnalysisConfig::from_yaml_file(&args[5])?
    } else {
        AnalysisConfig::default()
    };

    let (bars, snapshot) = analyze_csv(&csv_path, &symbol, &timezone, config)?;
    let payload = build_payload(&bars, &snapshot);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, serde_json::to_vec_pretty(&payload)?)?;

    println!(
        "exported {} bars to {} (sessions={}, touches={}, signals={}{})",
        payload.candles.len(),
        output.display(),
        payload.sessions.len(),
        payload.touches.len(),
        payload.signals.len(),
        payload
            .skipped
            .as_deref()
            .map(|reason| format!(", skipped: {reason}"))
            .unwrap_or_default(),
    );

    Ok(())
}
