use std::io;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

use bpcli::cli::{output, run, Cli};

/// Overrides the `-d` level with a full filter directive, e.g. `bpcli=trace`.
const LOG_ENV: &str = "BPCLI_LOG";

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&cli, &mut out) {
        output::error(&e);
        std::process::exit(e.exit_code());
    }
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = level_for(verbosity);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    // the config crate logs every source it probes
    let quiet_config = filter_fn(|metadata| !metadata.target().starts_with("config::"));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbosity >= 2)
        .with_span_events(if verbosity >= 3 {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .with_filter(quiet_config)
        .with_filter(filter);

    tracing_subscriber::registry().with(layer).init();
    tracing::info!("log level: {}", level);
}
