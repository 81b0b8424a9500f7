use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// the input path to the scene file, the built-in demo scene is rendered when omitted
    pub scene: Option<String>,
    /// number of simulated nodes
    #[arg(short, long, default_value_t = 1)]
    pub nodes: usize,
    /// number of fragments each node splits its rows into
    #[arg(short, long, default_value_t = 1)]
    pub fragments: usize,
    /// down-sample every fragment to this width before merging
    #[arg(short, long)]
    pub preview_width: Option<usize>,
    /// name of the merged bitmap
    #[arg(short, long, default_value = "result.bmp")]
    pub output: String,
    /// directory receiving every bitmap
    #[arg(long, default_value = ".")]
    pub output_dir: String,
    /// also save one bitmap per fragment
    #[arg(long, default_value = "false")]
    pub partials: bool,
    /// override the reflection depth of the scene
    #[arg(short, long)]
    pub iterations: Option<u32>,
    /// image size for the demo scene
    #[arg(long, default_value_t = 600)]
    pub size: usize,
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
