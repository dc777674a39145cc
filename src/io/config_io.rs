use std::fs;
use std::path::{Path, PathBuf};

use crate::io::atomic::atomic_write;
use crate::model::config::AppConfig;
use crate::model::query::{SortDirection, SortKey};

pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "TASKLANE_DIR";

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read or write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not parse config.toml: {0}")]
    Edit(#[from] toml_edit::TomlError),
    #[error("no data directory: pass --data-dir or set TASKLANE_DIR or HOME")]
    NoDataDir,
}

/// Pick the data directory: explicit flag, then `$TASKLANE_DIR`, then
/// `$HOME/.tasklane`.
pub fn resolve_data_dir(flag: Option<&str>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = flag {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(|home| PathBuf::from(home).join(".tasklane"))
        .ok_or(ConfigError::NoDataDir)
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for formatting-preserving edits. A missing file gives defaults.
pub fn read_config(data_dir: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let config_path = data_dir.join(CONFIG_FILE);
    let config_text = if config_path.exists() {
        fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?
    } else {
        String::new()
    };
    let config: AppConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    fs::create_dir_all(data_dir).map_err(|e| ConfigError::Io {
        path: data_dir.to_path_buf(),
        source: e,
    })?;
    let config_path = data_dir.join(CONFIG_FILE);
    atomic_write(&config_path, doc.to_string().as_bytes()).map_err(|e| ConfigError::Io {
        path: config_path,
        source: e,
    })
}

fn ensure_view_table(doc: &mut toml_edit::DocumentMut) {
    if !doc.contains_key("view") {
        doc["view"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

/// Set `view.simple`
pub fn set_simple_view(doc: &mut toml_edit::DocumentMut, simple: bool) {
    ensure_view_table(doc);
    doc["view"]["simple"] = toml_edit::value(simple);
}

/// Set `view.sort` and `view.direction`
pub fn set_default_sort(
    doc: &mut toml_edit::DocumentMut,
    key: SortKey,
    direction: SortDirection,
) {
    ensure_view_table(doc);
    doc["view"]["sort"] = toml_edit::value(key.label());
    doc["view"]["direction"] = toml_edit::value(direction.label());
}
