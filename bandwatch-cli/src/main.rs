//! Bandwatch CLI: scan, replay, demo and config commands.
//!
//! Commands:
//! - `scan`: load a CSV history, detect band crossings, print or export them
//! - `replay`: seed from the head of a CSV, stream the rest bar by bar
//! - `demo`: synthetic minute bars for several symbols, analysed in parallel
//! - `config`: print a named preset as TOML

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use tracing::{info, warn};

use bandwatch_core::analysis::{Analysis, Analyzer};
use bandwatch_core::buffer::SeriesBuffer;
use bandwatch_core::config::BandwatchConfig;
use bandwatch_core::data::{
    analysis_json, read_bars_from_path, write_analysis_csv_file, BarFeed, SyntheticFeed,
};
use bandwatch_core::stream::{spawn_dispatcher, FeedEvent, StreamClient};

#[derive(Parser)]
#[command(
    name = "bandwatch",
    about = "Bandwatch CLI: Bollinger band crossing detection over streaming bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the detector configuration comes from.
#[derive(Args)]
struct ConfigSource {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named preset: classic, legacy.
    #[arg(long)]
    preset: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect crossings over a CSV bar history.
    Scan {
        /// CSV file with timestamp,open,high,low,close,volume.
        #[arg(long)]
        csv: PathBuf,

        /// Symbol the bars belong to.
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        source: ConfigSource,

        /// Write the trimmed analysis to this CSV file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the full analysis as JSON instead of a marker table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Seed from the first bars of a CSV, then stream the rest live.
    Replay {
        /// CSV file with timestamp,open,high,low,close,volume.
        #[arg(long)]
        csv: PathBuf,

        /// Symbol the bars belong to.
        #[arg(long)]
        symbol: String,

        /// Bars used as the starting history.
        #[arg(long, default_value_t = 60)]
        seed_bars: usize,

        #[command(flatten)]
        source: ConfigSource,
    },
    /// Synthetic minute bars for several symbols.
    Demo {
        /// Comma-separated symbols (e.g., BTC/USD,ETH/USD).
        #[arg(long, value_delimiter = ',', default_value = "BTC/USD,ETH/USD")]
        symbols: Vec<String>,

        /// Bars per symbol.
        #[arg(long, default_value_t = 240)]
        bars: usize,

        #[command(flatten)]
        source: ConfigSource,
    },
    /// Print a preset as TOML.
    Config {
        /// Named preset: classic, legacy.
        #[arg(long, default_value = "classic")]
        preset: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            csv,
            symbol,
            source,
            export,
            json,
        } => run_scan(csv, &symbol, &source, export, json),
        Commands::Replay {
            csv,
            symbol,
            seed_bars,
            source,
        } => run_replay(csv, &symbol, seed_bars, &source),
        Commands::Demo {
            symbols,
            bars,
            source,
        } => run_demo(&symbols, bars, &source),
        Commands::Config { preset } => {
            print!("{}", BandwatchConfig::preset(&preset)?.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(source: &ConfigSource) -> Result<BandwatchConfig> {
    match (&source.config, &source.preset) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (Some(path), None) => Ok(BandwatchConfig::from_file(path)?),
        (None, Some(name)) => Ok(BandwatchConfig::preset(name)?),
        (None, None) => Ok(BandwatchConfig::classic()),
    }
}

fn run_scan(
    csv: PathBuf,
    symbol: &str,
    source: &ConfigSource,
    export: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(source)?;
    let bars = read_bars_from_path(&csv)
        .with_context(|| format!("reading bars from {}", csv.display()))?;

    let buffer = SeriesBuffer::new(config.ingest.mode);
    buffer.seed(symbol, bars)?;
    let analysis = Analyzer::from_config(&config)?.analyze(&buffer, symbol)?;

    if json {
        println!("{}", analysis_json(&analysis)?);
    } else {
        print_summary(&analysis, &config);
        print_markers(&analysis);
    }

    if let Some(path) = export {
        let rows = write_analysis_csv_file(&path, &analysis)?;
        println!("Exported {rows} rows to: {}", path.display());
    }

    Ok(())
}

fn run_replay(csv: PathBuf, symbol: &str, seed_bars: usize, source: &ConfigSource) -> Result<()> {
    let config = load_config(source)?;
    let mut bars = read_bars_from_path(&csv)
        .with_context(|| format!("reading bars from {}", csv.display()))?;
    if bars.is_empty() {
        bail!("{} contains no bars", csv.display());
    }

    let live = bars.split_off(seed_bars.min(bars.len()));
    let buffer = Arc::new(SeriesBuffer::new(config.ingest.mode));
    let mut client = StreamClient::new(Arc::clone(&buffer), &config)?;
    client.start_stream(symbol, bars)?;

    let (tx, rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();
    let handle = spawn_dispatcher(client, rx, Some(update_tx))?;

    let sent = live.len();
    for bar in live {
        tx.send(FeedEvent::Bar {
            symbol: symbol.to_string(),
            bar,
        })?;
    }
    tx.send(FeedEvent::Stop {
        symbol: symbol.to_string(),
    })?;
    tx.send(FeedEvent::Shutdown)?;

    let client = match handle.join() {
        Ok(client) => client,
        Err(_) => bail!("dispatcher thread panicked"),
    };
    let live_markers: usize = update_rx.try_iter().map(|u| u.markers.len()).sum();
    info!(
        symbol,
        bars = sent,
        markers = live_markers,
        streaming = client.is_streaming(symbol),
        "replay finished"
    );

    let analysis = Analyzer::from_config(&config)?.analyze(&buffer, symbol)?;
    print_summary(&analysis, &config);
    println!("Live bars:      {sent}");
    println!("Live markers:   {live_markers}");
    print_markers(&analysis);

    Ok(())
}

fn run_demo(symbols: &[String], bars: usize, source: &ConfigSource) -> Result<()> {
    if symbols.is_empty() {
        bail!("--symbols must name at least one symbol");
    }
    if bars == 0 {
        bail!("--bars must be positive");
    }
    let config = load_config(source)?;

    let feed = SyntheticFeed::new(Utc::now());
    let buffer = SeriesBuffer::new(config.ingest.mode);
    let analyzer = Analyzer::from_config(&config)?;
    let lookback = Duration::minutes(bars as i64 - 1);

    let results: Vec<(String, Result<Analysis>)> = symbols
        .par_iter()
        .map(|symbol| {
            let result = demo_symbol(&feed, &buffer, &analyzer, symbol, lookback);
            (symbol.clone(), result)
        })
        .collect();

    let mut failures = 0usize;
    for (symbol, result) in results {
        match result {
            Ok(analysis) => {
                print_summary(&analysis, &config);
                print_markers(&analysis);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "demo symbol failed");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} symbols failed", symbols.len());
    }

    Ok(())
}

fn demo_symbol(
    feed: &dyn BarFeed,
    buffer: &SeriesBuffer,
    analyzer: &Analyzer,
    symbol: &str,
    lookback: Duration,
) -> Result<Analysis> {
    let history = feed.backfill(symbol, lookback)?;
    buffer.seed(symbol, history)?;
    Ok(analyzer.analyze(buffer, symbol)?)
}

fn print_summary(analysis: &Analysis, config: &BandwatchConfig) {
    let markers = analysis.markers();
    let upper = analysis.upper_signals.event_count();
    let lower = analysis.lower_signals.event_count();

    println!();
    println!("=== Band Crossings ===");
    println!("Symbol:         {}", analysis.symbol);
    if let (Some(first), Some(last)) = (analysis.bars.first(), analysis.bars.last()) {
        println!("Period:         {} to {}", first.timestamp, last.timestamp);
    }
    println!(
        "Bars:           {} ({} trimmed)",
        analysis.len(),
        analysis.trimmed
    );
    println!(
        "Bands:          window {} / {} std",
        config.bands.window, config.bands.deviation
    );
    println!(
        "Offsets:        upper {:.4}%, lower {:.4}%",
        analysis.offsets.upper * 100.0,
        analysis.offsets.lower * 100.0
    );
    println!("Markers:        {} ({upper} upper, {lower} lower)", markers.len());
    println!("Config:         {}", &config.fingerprint()[..16]);
}

fn print_markers(analysis: &Analysis) {
    let markers = analysis.markers();
    if markers.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<26} {:<6} {:>14} {:>14}",
        "Timestamp", "Side", "Close", "Marker"
    );
    println!("{}", "-".repeat(63));
    for m in &markers {
        println!(
            "{:<26} {:<6} {:>14.4} {:>14.4}",
            m.timestamp.to_rfc3339(),
            m.side.as_str(),
            m.price,
            m.marker
        );
    }
}
