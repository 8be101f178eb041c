//! Screen split between terminal grid and keyboard.

use glyphs::GlyphAdapter;
use keyboard::KeyboardGeometry;
use settings::constants::font;
use terminal::{TermSize, WindowGeometry};

/// Clamp a requested font size to the supported range.
pub fn clamp_font_size(size: i64) -> u32 {
    size.clamp(font::MIN_SIZE as i64, font::MAX_SIZE as i64) as u32
}

/// Derived layout for one font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub font_size: u32,
    pub cols: u16,
    pub rows: u16,
    pub cell_width: i32,
    pub cell_height: i32,
    pub keyboard: KeyboardGeometry,
    /// Pixel rows available to the terminal, above the keyboard.
    pub terminal_height: i32,
}

impl Viewport {
    /// Lay out a `surface_width` x `surface_height` screen at `font_size`.
    ///
    /// Rescales `glyphs` to the clamped size first. The grid is never
    /// smaller than one cell, even when the keyboard covers the screen.
    pub fn compute(
        surface_width: i32,
        surface_height: i32,
        font_size: u32,
        glyphs: &mut GlyphAdapter,
    ) -> Self {
        let font_size = clamp_font_size(font_size as i64);
        glyphs.set_pixel_height(font_size);

        let metrics = glyphs.v_metrics();
        let cell_width = (glyphs.advance(font::REFERENCE_GLYPH) as i32).max(1);
        let cell_height =
            ((metrics.ascent - metrics.descent + metrics.line_gap) as i32 + font::CELL_PADDING)
                .max(1);

        let keyboard = KeyboardGeometry::compute(surface_width, surface_height, font_size);
        let terminal_height = keyboard.origin_y.max(0);

        let cols = (surface_width / cell_width).clamp(1, u16::MAX as i32) as u16;
        let rows = (terminal_height / cell_height).clamp(1, u16::MAX as i32) as u16;

        let viewport = Self {
            font_size,
            cols,
            rows,
            cell_width,
            cell_height,
            keyboard,
            terminal_height,
        };
        tracing::debug!(?viewport, "Viewport computed");
        viewport
    }

    pub fn size(&self) -> TermSize {
        TermSize {
            cols: self.cols,
            rows: self.rows,
        }
    }

    /// Grid and cell size as reported to the engine and the child.
    pub fn geometry(&self) -> WindowGeometry {
        WindowGeometry {
            size: self.size(),
            cell_width: self.cell_width.clamp(0, u16::MAX as i32) as u16,
            cell_height: self.cell_height.clamp(0, u16::MAX as i32) as u16,
        }
    }
}
