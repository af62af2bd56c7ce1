use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::controls::ARROW_DENSITY_DEFAULT;
use crate::renderer::DisplayMode;
use crate::solver::SimParams;
use crate::state::DEFAULT_N;

pub const DEFAULT_CONFIG_PATH: &str = "flowlab.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub physics: SimParams,
    pub grid: GridConfig,
    pub display: DisplayConfig,
    /// Log a diagnostics line every this many steps; 0 disables.
    pub log_interval: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub resolution: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    pub target_fps: usize,
    pub steps_per_frame: usize,
    pub mode: DisplayMode,
    pub arrow_density: f64,
    pub log_scale: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            physics: SimParams::default(),
            grid: GridConfig::default(),
            display: DisplayConfig::default(),
            log_interval: 100,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { resolution: DEFAULT_N }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 640,
            target_fps: 60,
            steps_per_frame: 1,
            mode: DisplayMode::default(),
            arrow_density: ARROW_DENSITY_DEFAULT,
            log_scale: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        let checks: [(bool, &str); 7] = [
            (p.reynolds > 0.0 && p.reynolds.is_finite(), "physics.reynolds must be > 0"),
            (self.grid.resolution > 0, "grid.resolution must be > 0"),
            (p.force_sigma > 0.0, "physics.force_sigma must be > 0"),
            (p.force_radius >= 0.0, "physics.force_radius must be >= 0"),
            (p.dt > 0.0, "physics.dt must be > 0"),
            (self.display.steps_per_frame > 0, "display.steps_per_frame must be > 0"),
            (self.display.arrow_density > 0.0, "display.arrow_density must be > 0"),
        ];
        match checks.iter().find(|(ok, _)| !*ok) {
            Some((_, msg)) => Err(ConfigError::Invalid((*msg).to_string())),
            None => Ok(()),
        }
    }
}

/// Read, parse and validate a config file.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load `path` (or `flowlab.yaml`), falling back to defaults with a warning.
/// An explicitly named file that is missing is still an error.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => load_from(p),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if !default_path.exists() {
                return Ok(Config::default());
            }
            match load_from(default_path) {
                Ok(cfg) => Ok(cfg),
                Err(e) => {
                    warn!("{e}; using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}
