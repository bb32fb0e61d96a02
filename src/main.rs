mod browser;
mod output;
mod parser;
mod scraper;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use browser::{BrowserConfig, ChromeDriver};
use output::SaveOutcome;

const LOG_PATH: &str = "hymn_scraper.log";

#[derive(Parser)]
#[command(name = "hymn_scraper", about = "Scrape hymn titles into a numbered JSON file")]
struct Cli {
    /// Where to write the number → title mapping
    #[arg(short, long, default_value = output::OUTPUT_PATH)]
    output: PathBuf,
    /// Log file (appended to; console logging is always on)
    #[arg(long, default_value = LOG_PATH)]
    log_file: PathBuf,
    /// Chrome binary to launch (default: auto-detect)
    #[arg(long)]
    chrome_path: Option<PathBuf>,
    /// Show the browser window instead of running headless
    #[arg(long)]
    headful: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_file);

    let t0 = Instant::now();
    info!("Program started.");

    let outcome = match run(&cli) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Program terminated due to an error: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let elapsed = format_duration(t0.elapsed());
    match outcome {
        SaveOutcome::Written { path, entries } => info!(
            "Program completed in {}: {} hymns in {}",
            elapsed,
            entries,
            path.display()
        ),
        SaveOutcome::SkippedEmpty | SaveOutcome::Failed => {
            warn!("Program completed in {} without updating {}", elapsed, cli.output.display())
        }
    }
    ExitCode::SUCCESS
}

/// Launch the browser, scrape, parse and save. Only a launch failure is an
/// error; everything after it degrades and is reported in the outcome.
fn run(cli: &Cli) -> anyhow::Result<SaveOutcome> {
    let config = BrowserConfig {
        headless: !cli.headful,
        chrome_path: cli.chrome_path.clone(),
    };
    let driver = ChromeDriver::launch(&config)?;

    let extraction = scraper::collect_hymn_lines(Some(driver), scraper::SOURCE_URLS);
    if !extraction.is_complete() {
        warn!(
            "Scraping stopped early; continuing with {} hymn lines",
            extraction.lines.len()
        );
    }

    let mapping = parser::build_mapping(&extraction.lines);
    Ok(output::save_mapping(&cli.output, &mapping))
}

/// Console plus append-only log file. Falls back to console only when the
/// file can't be opened.
fn init_tracing(log_file: &Path) {
    let (file_layer, open_err) = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(f) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(f))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = open_err {
        warn!("Logging to console only, cannot open {}: {}", log_file.display(), e);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

// ── Tests ──
