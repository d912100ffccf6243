//! Editor configuration persistence
//!
//! Stores user preferences in `~/.config/editflow/config.yaml`

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::editable::DEFAULT_HISTORY_CAPACITY;
use crate::search::{MatchMode, DEFAULT_TOKEN_LEN};

/// List filtering preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default = "default_true")]
    pub ignore_case: bool,
    /// Re-scan when the source list grows or shrinks
    #[serde(default = "default_true")]
    pub track_list_size: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            ignore_case: true,
            track_list_size: true,
        }
    }
}

/// Editor configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Entries kept on each of the undo and redo stacks
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Length of generated search tokens
    #[serde(default = "default_token_len")]
    pub search_token_len: usize,
    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_true() -> bool {
    true
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_token_len() -> usize {
    DEFAULT_TOKEN_LEN
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            search_token_len: default_token_len(),
            filter: FilterConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                Self::default()
            }
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = crate::config_paths::config_file().context("No config directory available")?;
        self.save_to(&path)
    }

    /// Save config to a specific file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}
