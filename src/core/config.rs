use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_zoom")]
    pub zoom: u16,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_format() -> String {
    "html".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}
fn default_zoom() -> u16 {
    100
}
fn default_refresh_secs() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
            zoom: default_zoom(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

/// How to launch the reporting CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the report kind, e.g. the npx package name.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_program() -> String {
    "npx".to_string()
}
fn default_args() -> Vec<String> {
    vec!["ccusage@latest".to_string()]
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub collaborator: CollaboratorConfig,
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("ccview").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["html", "text"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'html' or 'text')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if !(50..=200).contains(&self.settings.zoom) {
            issues.push(format!(
                "Invalid zoom: {} (must be between 50 and 200)",
                self.settings.zoom
            ));
        }
        if self.settings.refresh_secs == 0 {
            issues.push("Invalid refresh_secs: must be at least 1".to_string());
        }
        if self.collaborator.program.trim().is_empty() {
            issues.push("collaborator.program must not be empty".to_string());
        }
        if let Some(dir) = &self.collaborator.working_dir {
            if !dir.is_dir() {
                issues.push(format!(
                    "collaborator.working_dir does not exist: {}",
                    dir.display()
                ));
            }
        }
        issues
    }
}
