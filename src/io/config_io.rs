use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::model::config::StoreConfig;

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "QUADRANT_DATA_DIR";

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// Resolve the data directory: explicit override, then the platform data dir.
///
/// The `QUADRANT_DATA_DIR` variable is read by the CLI layer and arrives here as
/// the override.
pub fn resolve_data_dir(override_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    ProjectDirs::from("", "", "quadrant")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoDataDir)
}

/// Read `config.toml` from the data directory. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<StoreConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreConfig::default()),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    Ok(toml::from_str(&text)?)
}
