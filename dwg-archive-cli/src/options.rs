use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};

/// Workaround for parsing the different log level
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// CLI interface for the drawing-archival classification and reconciliation pipeline.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Watch-loop period in seconds. 0 (the default) runs a single pass.
    #[arg(long, default_value_t = 0)]
    pub watch: u64,

    /// Overrides the configuration file's LOG_LEVEL for this invocation.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

impl Options {
    /// Dumps the options to the log.
    pub fn dump_to_log(&self) {
        info!("config: {:?}", self.config);
        info!("watch: {}", self.watch);
        info!("log_level: {:?}", self.log_level);
    }
}
