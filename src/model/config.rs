use serde::{Deserialize, Serialize};

use super::query::{SortDirection, SortKey};

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Simple view hides the date and comment columns
    #[serde(default)]
    pub simple: bool,
    /// Sort applied when `list` is run without `--sort`
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}
