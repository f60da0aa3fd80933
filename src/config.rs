use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::AntidelayError;
use crate::press::{DEFAULT_LONG_PRESS, DEFAULT_RELEASE_GAP};
use crate::sink::SinkKind;

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    location: Option<String>,
    antidelay: Option<String>,
    sink: Option<SinkKind>,
    long_press_ms: Option<u64>,
    release_gap_ms: Option<u64>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Initial destination shown in the save dialog
    pub location: String,
    /// Initial antidelay text, parsed leniently on save
    pub antidelay: String,
    pub sink: SinkKind,
    pub long_press: Duration,
    pub release_gap: Duration,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: "/sdcard/Documents/".to_string(),
            antidelay: "15".to_string(),
            sink: SinkKind::File,
            long_press: DEFAULT_LONG_PRESS,
            release_gap: DEFAULT_RELEASE_GAP,
            log_file: default_log_file(),
        }
    }
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("antidelay")
        .join("antidelay.log")
}

impl Config {
    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("antidelay")
            .join("config.toml"))
    }

    /// Loads `path`, falling back to defaults for a missing file or missing fields.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, AntidelayError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Config::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Config, AntidelayError> {
        let parsed: ConfigFile = toml::from_str(raw)?;
        let mut config = Config::default();
        if let Some(location) = parsed.location { config.location = location }
        if let Some(antidelay) = parsed.antidelay { config.antidelay = antidelay }
        if let Some(sink) = parsed.sink { config.sink = sink }
        if let Some(ms) = parsed.long_press_ms { config.long_press = Duration::from_millis(ms) }
        if let Some(ms) = parsed.release_gap_ms { config.release_gap = Duration::from_millis(ms) }
        if let Some(log_file) = parsed.log_file { config.log_file = log_file }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.antidelay, "15");
        assert_eq!(config.long_press, Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            antidelay = "30"
            sink = "download"
            long_press_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.antidelay, "30");
        assert_eq!(config.sink, SinkKind::Download);
        assert_eq!(config.long_press, Duration::from_millis(1500));
        assert_eq!(config.location, "/sdcard/Documents/");
        assert_eq!(config.release_gap, DEFAULT_RELEASE_GAP);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "location = \"/tmp/out.txt\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.location, "/tmp/out.txt");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Config::from_toml("sink = \"carrier-pigeon\""),
            Err(AntidelayError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("long_press_ms = \"soon\""),
            Err(AntidelayError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("colour = \"red\""),
            Err(AntidelayError::Config(_))
        ));
    }
}
