use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, Commands, LogFormat};
use cli::info::cmd_info;
use cli::probe::cmd_probe;

mod cli;
mod input;
pub(crate) mod timestamp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(cli.loglevel.to_level_filter());
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{}",
                    json_record(
                        &buf.timestamp().to_string(),
                        record.level(),
                        record.target(),
                        &record.args().to_string(),
                    )
                )
            });
        }
    }

    // Progress bars and log lines share the terminal through the bridge.
    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        log::set_max_level(cli.loglevel.to_level_filter());
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    log::debug!(
        "{} {} (mpasync {}, built {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("MPASYNC_VERSION"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Commands::Probe(ref args) => cmd_probe(args, pb)?,
        Commands::Info(ref args) => cmd_info(args, pb)?,
    }

    Ok(())
}

/// One log record as a single-line JSON object.
fn json_record(ts: &str, level: log::Level, target: &str, msg: &str) -> String {
    serde_json::json!({
        "ts": ts,
        "lvl": level.as_str(),
        "target": target,
        "msg": msg,
    })
    .to_string()
}

#[test]
fn json_record_escapes_message() -> Result<()> {
    let line = json_record(
        "2025-01-01T00:00:00Z",
        log::Level::Warn,
        "mpasync::process::detect",
        "bad \"name\"\u{1b}[0m\n\u{e9}",
    );
    assert!(!line.contains('\n'));

    let value: serde_json::Value = serde_json::from_str(&line)?;
    assert_eq!(value["lvl"], "WARN");
    assert_eq!(value["msg"], "bad \"name\"\u{1b}[0m\n\u{e9}");
    Ok(())
}
