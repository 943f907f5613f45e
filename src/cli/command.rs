use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (mpasync ",
    env!("MPASYNC_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for detecting and inspecting MPEG audio elementary streams",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decide whether each input is an MPEG audio stream.
    Probe(ProbeArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Inputs to probe (use "-" for stdin).
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Probe every input as a network stream (two matching frames suffice).
    #[arg(long)]
    pub streaming: bool,

    /// Probe files even if their extension names a non-MPEG format.
    #[arg(long)]
    pub no_extension_filter: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MPEG audio stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Stop walking frames after this many.
    #[arg(long, value_name = "COUNT")]
    pub max_frames: Option<usize>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Analyze the file even if its extension names a non-MPEG format.
    #[arg(long)]
    pub no_extension_filter: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// Aligned human-readable text.
    Plain,
    /// YAML document.
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_takes_many_inputs() {
        let cli = Cli::parse_from(["mpasyncd", "probe", "--streaming", "a.mp3", "b.mp2", "-"]);

        let Commands::Probe(args) = cli.command else {
            panic!("expected probe");
        };
        assert_eq!(args.inputs.len(), 3);
        assert!(args.streaming);
        assert!(!args.no_extension_filter);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "mpasyncd", "info", "a.mp3", "--format", "yaml", "--max-frames", "10", "--loglevel",
            "debug", "--progress",
        ]);

        assert!(cli.progress);
        assert_eq!(cli.loglevel.to_level_filter(), log::LevelFilter::Debug);
        let Commands::Info(args) = cli.command else {
            panic!("expected info");
        };
        assert_eq!(args.format, OutputFormat::Yaml);
        assert_eq!(args.max_frames, Some(10));
        assert!(!args.no_extension_filter);
    }

    #[test]
    fn probe_requires_input() {
        assert!(Cli::try_parse_from(["mpasyncd", "probe"]).is_err());
    }
}
