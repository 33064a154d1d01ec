use crate::NavError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_STRUCTURAL_FOLDERS: &[&str] = &[
    "tables",
    "views",
    "indexes",
    "index",
    "security",
    "programmability",
    "stored procedures",
    "functions",
    "triggers",
    "keys",
    "constraints",
    "columns",
    "statistics",
    "synonyms",
    "types",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Overrides where navigation state is persisted.
    #[serde(default)]
    pub storage_file: Option<PathBuf>,

    /// Folder names hidden from the breadcrumb, compared case-insensitively.
    #[serde(default = "default_structural_folders")]
    pub structural_folders: Vec<String>,

    /// Drop gateway responses that arrive after the connection changed.
    #[serde(default = "default_true")]
    pub discard_stale_responses: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            storage_file: None,
            structural_folders: default_structural_folders(),
            discard_stale_responses: true,
        }
    }
}

impl NavigatorConfig {
    pub fn is_structural_folder(&self, name: &str) -> bool {
        self.structural_folders
            .iter()
            .any(|folder| folder.eq_ignore_ascii_case(name))
    }
}

fn default_structural_folders() -> Vec<String> {
    DEFAULT_STRUCTURAL_FOLDERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self, NavError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            NavError::IoError(std::io::Error::other("Could not find config directory"))
        })?;

        let app_dir = config_dir.join("dbnav");
        fs::create_dir_all(&app_dir)?;

        Ok(Self {
            path: app_dir.join("config.json"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<NavigatorConfig, NavError> {
        if !self.path.exists() {
            return Ok(NavigatorConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: NavigatorConfig =
            serde_json::from_str(&content).map_err(|e| NavError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn save(&self, config: &NavigatorConfig) -> Result<(), NavError> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
