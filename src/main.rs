use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{cursor, execute};
use parallel_progress::{
    Config, Coordinator, MemoryCanvas, SharedCanvas, StepDelay, TerminalCanvas,
};
use tracing_subscriber::EnvFilter;

/// Simulated calculations, each drawing its own progress bar on a shared terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of workers running at the same time
    #[arg(short, long, default_value = "5")]
    workers: usize,

    /// Number of steps in every bar
    #[arg(short, long, default_value = "30")]
    length: usize,

    /// Rows above the first bar (the banner goes on the first one)
    #[arg(long, default_value = "2")]
    header_rows: u16,

    /// Shortest delay between two steps, in milliseconds
    #[arg(long, default_value = "100")]
    min_delay_ms: u64,

    /// Longest delay between two steps, in milliseconds (exclusive)
    #[arg(long, default_value = "300")]
    max_delay_ms: u64,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the finished rows as plain text instead of drawing live
    #[arg(long)]
    plain: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    // Stdout is the canvas, so logs must never go there.
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = Config::default()
        .with_worker_count(cli.workers)
        .with_bar_length(cli.length)
        .with_header_rows(cli.header_rows)
        .with_step_delay(StepDelay::from_millis(cli.min_delay_ms, cli.max_delay_ms));

    if !cli.plain && atty::is(atty::Stream::Stdout) {
        let canvas = SharedCanvas::new(TerminalCanvas::stdout());
        execute!(io::stdout(), cursor::Hide)?;
        let result = Coordinator::new(config, canvas).run();
        execute!(io::stdout(), cursor::Show)?;
        result.context("Progress run failed")?;
    } else {
        let canvas = SharedCanvas::new(MemoryCanvas::new());
        Coordinator::new(config, canvas.clone())
            .run()
            .context("Progress run failed")?;

        let lines = canvas.draw(|c| Ok(c.lines()))?;
        let mut out = io::stdout().lock();
        for line in lines {
            writeln!(out, "{}", line)?;
        }
    }

    Ok(())
}
