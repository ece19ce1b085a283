//! Configuration loading and parsing.
//!
//! Parses `oxlive.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [session]
//! hide_cursor = true
//! disable_input = false
//! update_frequency_ms = 80
//! repaint_on_resize = false
//!
//! [channel]
//! timeout_ms = 10000
//! ```
//!
//! Every field is optional. A missing file or a parse error yields defaults;
//! configuration problems are logged and never fatal. Unknown fields are
//! ignored so older binaries tolerate newer files.

use anyhow::Result;
use core_render::StartOptions;
use core_render::spinner::MIN_UPDATE_FREQUENCY;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "oxlive.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_hide_cursor")]
    pub hide_cursor: bool,
    #[serde(default)]
    pub disable_input: bool,
    #[serde(default = "SessionConfig::default_update_frequency_ms")]
    pub update_frequency_ms: u64,
    #[serde(default)]
    pub repaint_on_resize: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hide_cursor: Self::default_hide_cursor(),
            disable_input: false,
            update_frequency_ms: Self::default_update_frequency_ms(),
            repaint_on_resize: false,
        }
    }
}

impl SessionConfig {
    const fn default_hide_cursor() -> bool {
        true
    }
    const fn default_update_frequency_ms() -> u64 {
        80
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    #[serde(default = "ChannelConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl ChannelConfig {
    const fn default_timeout_ms() -> u64 {
        10_000
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub path: Option<PathBuf>, // file the values came from, if any
    pub file: ConfigFile,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxlive").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_not_found_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                path: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Spinner tick interval, clamped to the engine minimum.
    pub fn update_frequency(&self) -> Duration {
        let raw = Duration::from_millis(self.file.session.update_frequency_ms);
        let effective = raw.max(MIN_UPDATE_FREQUENCY);
        if effective != raw {
            info!(
                target: "config",
                raw_ms = self.file.session.update_frequency_ms,
                clamped_ms = effective.as_millis() as u64,
                "update_frequency_clamped"
            );
        }
        effective
    }

    pub fn start_options(&self) -> StartOptions {
        let session = &self.file.session;
        StartOptions {
            hide_cursor: session.hide_cursor,
            disable_input: session.disable_input,
            spinner_colour: None,
            update_frequency: self.update_frequency(),
            repaint_on_resize: session.repaint_on_resize,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.file.channel.timeout_ms)
    }
}
