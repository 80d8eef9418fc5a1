//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bpcli/bpcli.toml` (or `--config <path>`)
//! 3. Environment variables: `BPCLI_*` prefix, `__` as section separator
//! 4. `--data-file` on the command line (applied by the CLI layer)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Which command groups are enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComponentSettings {
    pub signups: bool,
    pub messages: bool,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            signups: true,
            messages: true,
        }
    }
}

/// Raw component settings for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawComponentSettings {
    pub signups: Option<bool>,
    pub messages: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub outbox_file: Option<PathBuf>,
    pub list_count: Option<usize>,
    pub generate_count: Option<usize>,
    pub components: RawComponentSettings,
}

/// Unified configuration for bpcli.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON document holding users, signups and messages
    pub data_file: PathBuf,
    /// JSON-lines file receiving activation mail
    pub outbox_file: PathBuf,
    /// Default cap for `message list`
    pub list_count: usize,
    /// Default number of messages for `message generate`
    pub generate_count: usize,
    pub components: ComponentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            data_file: data_dir.join("bpcli.json"),
            outbox_file: data_dir.join("outbox.jsonl"),
            list_count: 10,
            generate_count: 20,
            components: ComponentSettings::default(),
        }
    }
}

/// Get the default data directory (XDG data dir, falling back to ~/.bpcli).
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "bpcli")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.bpcli"))
}

/// Get the XDG config directory for bpcli.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bpcli").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bpcli.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            outbox_file: overlay
                .outbox_file
                .clone()
                .unwrap_or_else(|| self.outbox_file.clone()),
            list_count: overlay.list_count.unwrap_or(self.list_count),
            generate_count: overlay.generate_count.unwrap_or(self.generate_count),
            components: ComponentSettings {
                signups: overlay
                    .components
                    .signups
                    .unwrap_or(self.components.signups),
                messages: overlay
                    .components
                    .messages
                    .unwrap_or(self.components.messages),
            },
        }
    }

    fn expand_paths(&mut self) {
        self.data_file = expand_path(&self.data_file);
        self.outbox_file = expand_path(&self.outbox_file);
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file; replaces the global file and must exist
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        current = current.merge_with(&load_raw_settings(&global_path)?);
                    }
                }
            }
        }

        // 3. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply BPCLI_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("BPCLI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("outbox_file") {
            settings.outbox_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<usize>("list_count") {
            settings.list_count = val;
        }
        if let Ok(val) = config.get::<usize>("generate_count") {
            settings.generate_count = val;
        }
        if let Ok(val) = config.get_bool("components.signups") {
            settings.components.signups = val;
        }
        if let Ok(val) = config.get_bool("components.messages") {
            settings.components.messages = val;
        }

        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_built_then_components_enabled() {
        let settings = Settings::default();
        assert!(settings.components.signups);
        assert!(settings.components.messages);
        assert_eq!(settings.list_count, 10);
        assert_eq!(settings.generate_count, 20);
        assert!(settings.data_file.ends_with("bpcli.json"));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_kept() {
        let base = Settings::default();
        let overlay = RawSettings {
            list_count: Some(3),
            components: RawComponentSettings {
                messages: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.list_count, 3);
        assert!(!merged.components.messages);
        assert!(merged.components.signups);
        assert_eq!(merged.data_file, base.data_file);
    }

    #[test]
    fn given_plain_path_when_expanding_then_unchanged() {
        let path = Path::new("/var/lib/bpcli/data.json");
        assert_eq!(expand_path(path), path);
    }
}
