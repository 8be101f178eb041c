//! TOML config file support.
//!
//! Config location: `~/.config/touchvt/config.toml`

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Framebuffer device to draw on.
    pub framebuffer: PathBuf,
    /// TrueType/OpenType font file. The built-in font is used when unset or unloadable.
    pub font_path: Option<PathBuf>,
    /// Initial font size in pixels.
    pub font_size: u32,
    /// Shell launched when no command is given. Falls back to `$SHELL`.
    pub shell: Option<String>,
    /// Touchscreen event device. Auto-detected under /dev/input when unset.
    pub touch_device: Option<PathBuf>,
    /// Lines of history kept by the terminal.
    pub scrollback_lines: usize,
    /// Value of `TERM` exported to the child.
    pub term: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            framebuffer: PathBuf::from(constants::paths::FRAMEBUFFER),
            font_path: None,
            font_size: constants::font::DEFAULT_SIZE,
            shell: None,
            touch_device: None,
            scrollback_lines: constants::scrollback::DEFAULT_LINES,
            term: constants::paths::TERM.to_string(),
        }
    }
}

impl Config {
    /// Font size clamped to the supported range.
    pub fn font_size(&self) -> u32 {
        self.font_size
            .clamp(constants::font::MIN_SIZE, constants::font::MAX_SIZE)
    }

    /// Scrollback history clamped to the supported maximum.
    pub fn scrollback_lines(&self) -> usize {
        self.scrollback_lines.min(constants::scrollback::MAX_LINES)
    }

    /// Resolve the shell: config value, then `$SHELL`, then `/bin/sh`.
    pub fn shell(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| constants::paths::FALLBACK_SHELL.to_string())
    }
}

/// Commented template matching `Config::default()`.
pub const DEFAULT_CONFIG: &str = r#"# touchvt configuration

# Framebuffer device
framebuffer = "/dev/fb0"

# Font file (TrueType/OpenType). Leave unset to use the built-in font.
# font-path = "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf"

# Initial font size in pixels (8-64). Change at runtime with ctrl+'-' / ctrl+'+'.
font-size = 20

# Shell launched when no command is given (defaults to $SHELL, then /bin/sh)
# shell = "/bin/bash"

# Touchscreen device (auto-detected when unset)
# touch-device = "/dev/input/event0"

# Lines of scrollback history (max 1000)
scrollback-lines = 1000

# TERM exported to the child process
term = "xterm-256color"
"#;

/// Return the config file path.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("touchvt").join("config.toml"))
}

/// Load and parse the config file at the default location. Returns default on any error.
pub fn load_config() -> Config {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Config::default(),
    }
}

/// Load and parse the config file at `path`. Returns default on any error.
pub fn load_config_from(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
            }
            return Config::default();
        }
    };

    // Size guard
    if content.len() as u64 > constants::settings::MAX_FILE_SIZE {
        tracing::warn!(
            "Config file too large ({} bytes), using defaults",
            content.len()
        );
        return Config::default();
    }

    match toml::from_str(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}", path, e);
            Config::default()
        }
    }
}
