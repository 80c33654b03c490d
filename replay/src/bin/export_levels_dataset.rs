use std::path::PathBuf;

use openrange::{AnalysisConfig, init_logging, init_logging_with, write_parquet_snapshot};
use replay::analyze_csv;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "usage: cargo run -p replay --bin export_levels_dataset -- <csv_path> <symbol> <timezone> [output_dir] [config_yaml|-] [log_filter]"
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
    let output_dir = if args.len() >= 5 {
        PathBuf::from(&args[4])
    } else {
        PathBuf::from("dataset").join(symbol.to_ascii_lowercase())
    };
    let config = if args.len() >= 6 && args[5] != "-" {
        AnalysisConfig::from_yaml_file(&args[5])?
    } else {
        AnalysisConfig::default()
    };

    let (_, snapshot) = analyze_csv(&csv_path, &symbol, &timezone, config)?;
    write_parquet_snapshot(&snapshot, &output_dir)?;

    println!(
        "wrote parquet dataset to {} (touches={}, signals={})",
        output_dir.display(),
        snapshot.stats.total_touches(),
        snapshot.signals.len(),
    );

    Ok(())
}
