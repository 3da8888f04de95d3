//! Logger setup for both binaries.
//!
//! The TUI owns the terminal, so the client logs to a file through `log4rs`.
//! The mock server logs to stderr through `env_logger`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Level override for the client log file.
pub const CLIENT_LOG_ENV: &str = "AGENTCHAT_LOG";
pub const CLIENT_LOG_FILE: &str = "agentchat.log";
/// Optional log4rs yaml config, relative to the working directory.
pub const LOG4RS_CONFIG: &str = "config/log4rs.yaml";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";

/// Installs the client logger and returns the file it writes to, if known.
pub fn init_client_logging(workspace_root: &Path, state_dir: &Path) -> Result<Option<PathBuf>> {
    let yaml = workspace_root.join(LOG4RS_CONFIG);
    if yaml.is_file() {
        log4rs::init_file(&yaml, Default::default())
            .with_context(|| format!("failed to load {}", yaml.display()))?;
        return Ok(None);
    }

    let level = parse_level(env::var(CLIENT_LOG_ENV).ok().as_deref());
    let path = state_dir.join(CLIENT_LOG_FILE);
    let config = file_config(&path, level)?;
    log4rs::init_config(config).context("failed to install logger")?;
    Ok(Some(path))
}

/// Installs the stderr logger used by the mock server.
pub fn init_server_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn file_config(path: &Path, level: LevelFilter) -> Result<Config> {
    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(level))
        .context("invalid logger configuration")
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(parse_level(None), LevelFilter::Info);
        assert_eq!(parse_level(Some("nonsense")), LevelFilter::Info);
        assert_eq!(parse_level(Some(" debug ")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("OFF")), LevelFilter::Off);
    }

    #[test]
    fn file_config_creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CLIENT_LOG_FILE);
        let config = file_config(&path, LevelFilter::Warn).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Warn);
        assert!(path.exists());
    }
}
