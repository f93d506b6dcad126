//! User configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::policy::ModeSetting;

/// Top-level hifz configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HifzConfig {
    /// Hide mode for sessions that do not pick one.
    #[serde(default = "default_hide_mode")]
    pub default_hide_mode: String,
    /// Difficulty (1–5) for `random_blank`.
    #[serde(default = "default_difficulty")]
    pub default_difficulty: i32,
    /// `text` or `json`.
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_hide_mode() -> String {
    "full_hide".to_string()
}
fn default_difficulty() -> i32 {
    2
}
fn default_output_format() -> String {
    "text".to_string()
}

impl Default for HifzConfig {
    fn default() -> Self {
        Self {
            default_hide_mode: default_hide_mode(),
            default_difficulty: default_difficulty(),
            output_format: default_output_format(),
        }
    }
}

impl HifzConfig {
    /// The default hide mode, parsed. Unknown names are kept as unrecognized.
    pub fn hide_mode(&self) -> ModeSetting {
        ModeSetting::from(self.default_hide_mode.as_str())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `hifz.toml` in the current directory
/// 2. `~/.config/hifz/config.toml`
///
/// Environment variable overrides: `HIFZ_HIDE_MODE`, `HIFZ_DIFFICULTY`.
pub fn load_config() -> Result<HifzConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<HifzConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("hifz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<HifzConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => HifzConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Apply `HIFZ_*` overrides looked up through `var`.
fn apply_overrides(config: &mut HifzConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(mode) = var("HIFZ_HIDE_MODE") {
        config.default_hide_mode = mode;
    }
    if let Some(raw) = var("HIFZ_DIFFICULTY") {
        match raw.trim().parse::<i32>() {
            Ok(level) => config.default_difficulty = level,
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unparseable HIFZ_DIFFICULTY");
            }
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("hifz"))
}
