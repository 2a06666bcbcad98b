mod options;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dwg_archive::{Config, EventSink, LogSink, Orchestrator, RunOutcome};
use log::{error, info, warn, LevelFilter};
use options::Options;

fn parse_args() -> Options {
    Options::parse()
}

/// Initializes the program logging, honoring the CLI override if given,
/// otherwise the configuration file's `LOG_LEVEL`.
fn initialize_logging(filter: LevelFilter) {
    env_logger::builder()
        .format(|buf, record| {
            use std::io::Write as _;
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(filter)
        .init();
}

fn run_program() -> Result<()> {
    let options = parse_args();

    // The configured log level lives inside the configuration file itself,
    // so the file has to be loaded before logging can be initialized. A
    // load failure is therefore reported on stderr directly rather than
    // through the `log` facade.
    let config = Config::load(&options.config)
        .with_context(|| format!("loading configuration from {:?}", options.config))?;

    let filter = match options.log_level {
        Some(level) => LevelFilter::from(level),
        None => config
            .log_level
            .parse()
            .unwrap_or(LevelFilter::Info),
    };
    initialize_logging(filter);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    options.dump_to_log();

    let orchestrator = Orchestrator::new();
    let sink: &dyn EventSink = &LogSink;

    if options.watch == 0 {
        match orchestrator.try_run_once(&config, sink)? {
            RunOutcome::Ran => info!("pass complete"),
            RunOutcome::Busy => warn!("another pass was already running"),
        }
        return Ok(());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            info!("cancellation requested, finishing current pass before exit");
            cancel.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    orchestrator.watch_loop(&config, sink, options.watch, cancel.as_ref())?;
    info!("watch loop cancelled, exiting");
    Ok(())
}

fn main() {
    match run_program() {
        Ok(()) => {
            info!("SUCCESS");
        }
        Err(err) => {
            if log::log_enabled!(log::Level::Error) {
                error!("Error: {err:#}");
                error!("FAILED");
            } else {
                eprintln!("Error: {err:#}");
            }
            std::process::exit(1);
        }
    }
}
