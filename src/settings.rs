//! Reviewer settings: key bindings and mark colours.
//!
//! Persisted as TOML in `data/settings.toml`. Missing fields fall back to
//! defaults, so a partial file is valid.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mark::Mark;

/// Errors from settings operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SettingsError {
    #[error("failed to read settings: {path}")]
    #[diagnostic(
        code(docmark::settings::read),
        help("Ensure the settings file exists and is readable, or run `docmark init`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {path}: {message}")]
    #[diagnostic(
        code(docmark::settings::parse),
        help("Check the TOML syntax in the settings file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write settings: {path}")]
    #[diagnostic(
        code(docmark::settings::write),
        help("Ensure you have write permissions to the data directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown key name \"{key}\" bound to {action}")]
    #[diagnostic(
        code(docmark::settings::invalid_key),
        help(
            "Use a single character or one of: Left, Right, Up, Down, \
             ArrowLeft, ArrowRight, ArrowUp, ArrowDown, Enter, Space, Tab, \
             PageUp, PageDown, Home, End."
        )
    )]
    InvalidKey { action: String, key: String },

    #[error("invalid colour \"{value}\" for mark {mark}")]
    #[diagnostic(
        code(docmark::settings::invalid_color),
        help("Colours are written as #rrggbb.")
    )]
    InvalidColor { mark: Mark, value: String },
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Keys driving navigation and marking in the review UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_mark_a")]
    pub mark_a: String,
    #[serde(default = "default_mark_b")]
    pub mark_b: String,
    #[serde(default = "default_prev")]
    pub prev: String,
    #[serde(default = "default_next")]
    pub next: String,
}

fn default_mark_a() -> String {
    "ArrowLeft".into()
}
fn default_mark_b() -> String {
    "ArrowRight".into()
}
fn default_prev() -> String {
    "ArrowUp".into()
}
fn default_next() -> String {
    "ArrowDown".into()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            mark_a: default_mark_a(),
            mark_b: default_mark_b(),
            prev: default_prev(),
            next: default_next(),
        }
    }
}

/// Background colour per mark, as `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkColors {
    #[serde(rename = "A", default = "default_color_a")]
    pub a: String,
    #[serde(rename = "B", default = "default_color_b")]
    pub b: String,
}

fn default_color_a() -> String {
    "#ffe0e0".into()
}
fn default_color_b() -> String {
    "#e0f0ff".into()
}

impl Default for MarkColors {
    fn default() -> Self {
        Self {
            a: default_color_a(),
            b: default_color_b(),
        }
    }
}

impl MarkColors {
    pub fn for_mark(&self, mark: Mark) -> &str {
        match mark {
            Mark::A => &self.a,
            Mark::B => &self.b,
        }
    }

    /// Decode the colour for `mark` into RGB components.
    pub fn rgb(&self, mark: Mark) -> SettingsResult<(u8, u8, u8)> {
        let value = self.for_mark(mark);
        parse_hex_color(value).ok_or_else(|| SettingsError::InvalidColor {
            mark,
            value: value.to_string(),
        })
    }
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Settings file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub colors: MarkColors,
}

impl Settings {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path` when it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| SettingsError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_arrow_keys() {
        let s = Settings::default();
        assert_eq!(s.key_bindings.mark_a, "ArrowLeft");
        assert_eq!(s.key_bindings.next, "ArrowDown");
        assert_eq!(s.colors.for_mark(Mark::B), "#e0f0ff");
    }

    #[test]
    fn settings_roundtrip_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("data").join("settings.toml");

        let mut settings = Settings::default();
        settings.key_bindings.mark_a = "j".into();
        settings.colors.b = "#00ff00".into();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        std::fs::write(&path, "[key_bindings]\nnext = \"n\"\n").unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.key_bindings.next, "n");
        assert_eq!(loaded.key_bindings.prev, "ArrowUp");
        assert_eq!(loaded.colors, MarkColors::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loaded = Settings::load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#ffe0e0"), Some((0xff, 0xe0, 0xe0)));
        assert_eq!(parse_hex_color("102030"), Some((0x10, 0x20, 0x30)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }
}
