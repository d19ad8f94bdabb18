// File: src/config.rs
// Purpose: Navigation configuration parsing from silcrow.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Navigation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NavConfig {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub pages: PagesConfig,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Prefix every app URL lives under (default: "/")
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Whether literal route segments match case-insensitively (default: false)
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Special pages
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PagesConfig {
    /// Page shown for an empty path
    #[serde(default)]
    pub start_page: Option<String>,

    /// Page shown when nothing matches
    #[serde(default)]
    pub not_found_page: Option<String>,
}

fn default_base_path() -> String {
    "/".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            case_insensitive: false,
        }
    }
}

impl NavConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from default path (./silcrow.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("silcrow.toml")
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: NavConfig = toml::from_str(content)?;
        if config.routing.base_path.is_empty() {
            config.routing.base_path = default_base_path();
        }
        Ok(config)
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.routing.base_path = base_path.into();
        self
    }

    pub fn with_start_page(mut self, page_id: impl Into<String>) -> Self {
        self.pages.start_page = Some(page_id.into());
        self
    }

    pub fn with_not_found_page(mut self, page_id: impl Into<String>) -> Self {
        self.pages.not_found_page = Some(page_id.into());
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.routing.case_insensitive = case_insensitive;
        self
    }
}
