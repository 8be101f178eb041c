//! Glyph rasterization for the console.
//!
//! Wraps fontdue. Nothing is cached: every draw asks the rasterizer again,
//! which keeps the adapter trivially consistent across font-size changes.

use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};

/// DejaVu Sans Mono, compiled in as the fallback font.
const BUILTIN_FONT: &[u8] = include_bytes!("../fonts/DejaVuSansMono.ttf");

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font data: {0}")]
    Parse(&'static str),
}

/// Parse font bytes.
pub fn parse_font(bytes: &[u8]) -> Result<Font, FontError> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(FontError::Parse)
}

/// Read and parse a font file.
pub fn read_font(path: &Path) -> Result<Font, FontError> {
    let bytes = std::fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_font(&bytes)
}

/// Load the font at `path`, falling back to the built-in font when the path
/// is absent or unusable. Only a broken built-in font is an error.
pub fn load_font(path: Option<&Path>) -> Result<Font, FontError> {
    if let Some(path) = path {
        match read_font(path) {
            Ok(font) => {
                tracing::info!("Loaded font {:?}", path);
                return Ok(font);
            }
            Err(e) => tracing::warn!("{}, using built-in font", e),
        }
    }
    parse_font(BUILTIN_FONT)
}

/// Font-wide vertical metrics at the current scale, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VMetrics {
    pub ascent: f32,
    /// Negative below the baseline.
    pub descent: f32,
    pub line_gap: f32,
}

/// A rasterized glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Row-major coverage, `width * height` bytes.
    pub bitmap: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Offset of the bitmap's top-left corner from the pen position on the baseline.
    pub xoff: i32,
    pub yoff: i32,
    pub advance: f32,
}

/// Rasterizes codepoints at a pixel height.
pub struct GlyphAdapter {
    font: Font,
    pixel_height: u32,
    /// fontdue size (pixels per em) giving `pixel_height` from ascent to descent.
    px: f32,
    metrics: VMetrics,
}

impl GlyphAdapter {
    pub fn new(font: Font, pixel_height: u32) -> Self {
        let mut adapter = Self {
            font,
            pixel_height: 0,
            px: 0.0,
            metrics: VMetrics::default(),
        };
        adapter.set_pixel_height(pixel_height);
        adapter
    }

    /// Recompute the scale so that ascent minus descent spans `height` pixels.
    pub fn set_pixel_height(&mut self, height: u32) {
        self.pixel_height = height;
        let unit = self
            .font
            .horizontal_line_metrics(1.0)
            .map(|lm| lm.ascent - lm.descent)
            .filter(|extent| *extent > 0.0)
            .unwrap_or(1.0);
        self.px = height as f32 / unit;
        self.metrics = self
            .font
            .horizontal_line_metrics(self.px)
            .map(|lm| VMetrics {
                ascent: lm.ascent,
                descent: lm.descent,
                line_gap: lm.line_gap,
            })
            .unwrap_or(VMetrics {
                ascent: height as f32,
                descent: 0.0,
                line_gap: 0.0,
            });
        tracing::debug!(height, px = self.px, metrics = ?self.metrics, "Glyph scale updated");
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn v_metrics(&self) -> VMetrics {
        self.metrics
    }

    /// Horizontal advance of `ch` in pixels.
    pub fn advance(&self, ch: char) -> f32 {
        self.font.metrics(ch, self.px).advance_width
    }

    /// Width of `text` as drawn by advancing a pen one character at a time.
    pub fn text_width(&self, text: &str) -> i32 {
        text.chars().map(|ch| self.advance(ch) as i32).sum()
    }

    /// Rasterize `ch`. NUL, space and glyphs without ink yield `None`.
    pub fn glyph(&self, ch: char) -> Option<Glyph> {
        if ch == '\0' || ch == ' ' {
            return None;
        }
        let (metrics, bitmap) = self.font.rasterize(ch, self.px);
        if metrics.width == 0 || metrics.height == 0 {
            return None;
        }
        Some(Glyph {
            bitmap,
            width: metrics.width,
            height: metrics.height,
            xoff: metrics.xmin,
            yoff: -(metrics.ymin + metrics.height as i32),
            advance: metrics.advance_width,
        })
    }
}
