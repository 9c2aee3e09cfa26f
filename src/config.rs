use crate::functions::board::{BoardQuery, QueryError, LINES_PER_PAGE};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "STATION_BOARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "station-board.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid value '{value}' for {name}")]
    InvalidEnv { name: String, value: String },
    #[error("Invalid board query: {0}")]
    Query(#[from] QueryError),
}

/// Configuración del tablero de una estación.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub station: Option<String>,
    pub mode: Option<String>,
    pub snapshot_path: PathBuf,
    pub poll_interval_secs: u64,
    pub rotation_interval_secs: u64,
    pub lines_per_page: usize,
    pub reset_expired_on_poll: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            station: None,
            mode: None,
            snapshot_path: PathBuf::from("data/snapshot.json"),
            poll_interval_secs: 10,    // refresco de datos
            rotation_interval_secs: 10, // cambio de página
            lines_per_page: LINES_PER_PAGE,
            reset_expired_on_poll: true,
        }
    }
}

impl BoardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Carga `.env`, el fichero TOML (si existe) y las variables `BOARD_*`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();

        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_owned());
        let mut config = if Path::new(&path).exists() {
            info!("Loading board config from {}", path);
            Self::from_file(&path)?
        } else {
            warn!("Config file {} not found, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(station) = lookup("BOARD_STATION") {
            self.station = Some(station);
        }
        if let Some(mode) = lookup("BOARD_MODE") {
            self.mode = Some(mode);
        }
        if let Some(path) = lookup("BOARD_SNAPSHOT") {
            self.snapshot_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("BOARD_POLL_SECS") {
            self.poll_interval_secs = parse_env("BOARD_POLL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("BOARD_ROTATION_SECS") {
            self.rotation_interval_secs = parse_env("BOARD_ROTATION_SECS", &secs)?;
        }
        Ok(())
    }

    pub fn query(&self) -> Result<BoardQuery, ConfigError> {
        Ok(BoardQuery::parse(self.station.as_deref(), self.mode.as_deref())?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_secs.max(1))
    }

    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page.max(1)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}
