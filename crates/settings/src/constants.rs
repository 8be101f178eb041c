//! Centralized configuration constants for touchvt.
//!
//! Compile-time values for font sizing, keyboard geometry, colors and device
//! paths. Organized by component.

/// Font sizing.
pub mod font {
    /// Font size (pixel height) used at startup.
    pub const DEFAULT_SIZE: u32 = 20;
    /// Smallest selectable font size.
    pub const MIN_SIZE: u32 = 8;
    /// Largest selectable font size.
    pub const MAX_SIZE: u32 = 64;
    /// Change applied by the ctrl+'-' / ctrl+'+' shortcuts.
    pub const SIZE_STEP: u32 = 2;
    /// Extra vertical pixels added to every terminal cell.
    pub const CELL_PADDING: i32 = 1;
    /// Character whose advance defines the terminal cell width.
    pub const REFERENCE_GLYPH: char = 'M';
}

/// On-screen keyboard geometry.
pub mod keyboard {
    /// Number of key rows.
    pub const ROWS: usize = 5;
    /// Number of key columns.
    pub const COLS: usize = 12;
    /// Key row height as a multiple of the font size.
    pub const ROW_HEIGHT_FACTOR: f64 = 2.6;
    /// Pixels left uncovered around each key background.
    pub const KEY_INSET: i32 = 1;
}

/// Colors, as packed 0xAARRGGBB.
pub mod colors {
    pub const BACKGROUND: u32 = 0xff00_0000;
    pub const KEY_DEFAULT: u32 = 0xff00_0000;
    pub const KEY_PRESSED: u32 = 0xff40_4040;
    pub const KEY_MODIFIER_ACTIVE: u32 = 0xff30_3060;
    pub const KEY_LABEL: u32 = 0xffff_ffff;
    /// Mask XOR-ed over the cursor cell.
    pub const CURSOR_XOR: u32 = 0x00ff_ffff;
}

/// Scrollback configuration.
pub mod scrollback {
    /// Default history kept by the terminal engine, in lines.
    pub const DEFAULT_LINES: usize = 1_000;
    /// Upper bound on the scroll-back counter and on configured history.
    pub const MAX_LINES: usize = 1_000;
}

/// Device and process defaults.
pub mod paths {
    /// Framebuffer device.
    pub const FRAMEBUFFER: &str = "/dev/fb0";
    /// Directory scanned for a touchscreen when none is configured.
    pub const INPUT_DIR: &str = "/dev/input";
    /// Console device used for virtual terminal switching.
    pub const CONSOLE: &str = "/dev/tty0";
    /// Shell used when `$SHELL` is unset.
    pub const FALLBACK_SHELL: &str = "/bin/sh";
    /// `TERM` exported to the child.
    pub const TERM: &str = "xterm-256color";
}

/// Settings file validation limits.
pub mod settings {
    /// Maximum config file size in bytes (1 MiB).
    pub const MAX_FILE_SIZE: u64 = 1024 * 1024;
}
