//! Workbench configuration.
//!
//! Parses `sidenote.toml` (or an override path provided by the host),
//! extracting the default boundary policy, the keep-open-on-save behavior,
//! and the default presentation mode. Missing files and parse errors fall
//! back to defaults so a broken config never blocks editing; unknown policy
//! or mode names are logged and replaced by their defaults. Unknown fields
//! are ignored to allow forward evolution.

use std::{fs, path::PathBuf};

use anyhow::Result;
use serde::Deserialize;
use sidenote_edit::Policy;
use sidenote_syntax::RenderMode;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct EditConfig {
    /// Boundary policy name: `"unrestricted"` or `"restricted"`.
    #[serde(default = "EditConfig::default_policy")]
    pub policy: String,
    /// Keep sessions open after a save instead of tearing them down.
    #[serde(default)]
    pub keep_open_on_save: bool,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            policy: Self::default_policy(),
            keep_open_on_save: false,
        }
    }
}

impl EditConfig {
    fn default_policy() -> String {
        "unrestricted".to_string()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    /// Presentation mode name: `"plain"`, `"prose"`, or `"markup"`.
    #[serde(default = "RenderConfig::plain_mode")]
    pub default_mode: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_mode: Self::plain_mode(),
        }
    }
}

impl RenderConfig {
    fn plain_mode() -> String {
        "plain".to_string()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub edit: EditConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file string, when one was read.
    pub raw: Option<String>,
    /// Parsed (or default) data.
    pub file: ConfigFile,
    pub effective_policy: Policy,
    pub effective_render: RenderMode,
}

/// Best-effort config path following platform conventions (XDG / AppData
/// Roaming). A `sidenote.toml` in the working directory wins.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("sidenote.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("sidenote").join("sidenote.toml");
    }
    PathBuf::from("sidenote.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let mut config = Config {
                raw: Some(content),
                file,
                ..Config::default()
            };
            config.resolve();
            Ok(config)
        }
        Err(err) => {
            warn!(
                target: "config",
                path = %path.display(),
                error = %err,
                "config_parse_failed_using_defaults"
            );
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Maps the raw policy and mode strings onto their enums. Unknown names
    /// keep the defaults.
    pub fn resolve(&mut self) -> (Policy, RenderMode) {
        self.effective_policy = match self.file.edit.policy.as_str() {
            "unrestricted" => Policy::Unrestricted,
            "restricted" | "blank-line-restricted" => Policy::BlankLineRestricted,
            other => {
                warn!(target: "config", policy = other, "unknown_edit_policy_using_default");
                Policy::default()
            }
        };
        self.effective_render = match self.file.render.default_mode.as_str() {
            "plain" => RenderMode::Plain,
            "prose" => RenderMode::Prose,
            "markup" => RenderMode::Markup,
            other => {
                warn!(target: "config", mode = other, "unknown_render_mode_using_default");
                RenderMode::default()
            }
        };
        (self.effective_policy, self.effective_render)
    }

    pub fn keep_open_on_save(&self) -> bool {
        self.file.edit.keep_open_on_save
    }
}
