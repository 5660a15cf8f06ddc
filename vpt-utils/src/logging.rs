use anyhow::{anyhow, Result};
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};
use std::{io::Write, str::FromStr};

/// Logs go to stderr; stdout is reserved for json output.
pub fn init_logger(level: &str) -> Result<()> {
    let filter = LevelFilter::from_str(level)
        .map_err(|_| anyhow!("Invalid log level '{}'", level))?;

    Builder::new()
        .filter_level(filter)
        .write_style(env_logger::WriteStyle::Never)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} [{}] {}",
                buf.timestamp_millis(),
                level_tag(record.level()),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init()
        .map_err(|e| anyhow!("Logger init failed: {}", e))
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
