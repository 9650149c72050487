use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "baseball_etl.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/processed/baseball.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Directory holding one `<table>.csv` per destination table
    pub raw_dir: PathBuf,
    /// Year substituted for unparsable year text
    pub fallback_year: i64,
    /// Load a fixed sample series when the statistics source yields nothing
    pub synthesize_missing_statistics: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            fallback_year: 2023,
            synthesize_missing_statistics: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Politeness delay between successive page fetches
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub years: Vec<i32>,
    pub team_years: Vec<i32>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (compatible; baseball_etl/0.1)".to_string(),
            years: (2020..=2024).collect(),
            team_years: vec![2023, 2024],
        }
    }
}

impl ScrapeConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// Load from `baseball_etl.toml` in the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path`, falling back to defaults when the file does not exist,
    /// then apply environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                info!("Loaded configuration from {}", path.display());
                toml::from_str(&content)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                Config::default()
            }
            Err(e) => {
                return Err(PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                )))
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(db_path) = env_value("BASEBALL_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Some(raw_dir) = env_value("BASEBALL_RAW_DIR") {
            self.import.raw_dir = PathBuf::from(raw_dir);
        }
        if let Some(delay) = env_value("BASEBALL_DELAY_MS") {
            self.scrape.delay_ms = delay
                .parse()
                .map_err(|_| PipelineError::Config(format!("BASEBALL_DELAY_MS is not a number: {}", delay)))?;
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
