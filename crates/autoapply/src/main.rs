use anyhow::Context;
use autoapply_engine::config::ConfigLoader;
use autoapply_engine::monitor;
use autoapply_engine::runner::{self, OutputHandlers};
use autoapply_h::backend::HeadlessBackend;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autoapply", version, about = "Easy Apply job application runner")]
struct Args {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Configuration file (defaults to ./autoapply.yaml, then ~/.autoapply/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run Chromium without a window
    #[arg(long, global = true)]
    headless: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Apply to every job in the job list (default)
    Apply,
    /// Search for fresh postings and write the job list
    Monitor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the run report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if args.headless {
        config.browser.headless = true;
    }

    let mut backend = HeadlessBackend::new_with_visibility(!config.browser.headless);
    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    match args.mode.unwrap_or(Mode::Apply) {
        Mode::Apply => {
            runner::run(&mut backend, &config, output)
                .await
                .context("Apply run aborted")?;
        }
        Mode::Monitor => {
            monitor::run_monitor(&mut backend, &config, output)
                .await
                .context("Job monitor aborted")?;
        }
    }

    Ok(())
}
