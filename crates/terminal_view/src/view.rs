//! Painting terminal cells onto the surface.

use framebuffer::Surface;
use glyphs::GlyphAdapter;
use settings::constants::colors::CURSOR_XOR;
use std::ops::DerefMut;
use terminal::{CellPaint, Engine};

use crate::{ViewMode, Viewport};

/// Fill a cell's background and draw its glyph on the baseline.
///
/// Nothing is drawn at or below `viewport.terminal_height`.
pub fn paint_cell<B>(surface: &mut Surface<B>, glyphs: &GlyphAdapter, viewport: &Viewport, cell: &CellPaint)
where
    B: DerefMut<Target = [u8]>,
{
    let (fg, bg) = if cell.inverse {
        (cell.bg, cell.fg)
    } else {
        (cell.fg, cell.bg)
    };
    let px = cell.col as i32 * viewport.cell_width;
    let py = cell.row as i32 * viewport.cell_height;
    let max_y = viewport.terminal_height;
    surface.fill_rect_clipped(
        px,
        py,
        cell.width as i32 * viewport.cell_width,
        viewport.cell_height,
        max_y,
        bg,
    );

    if cell.ch == ' ' || cell.ch == '\0' {
        return;
    }
    if let Some(glyph) = glyphs.glyph(cell.ch) {
        let baseline = py + glyphs.v_metrics().ascent as i32;
        surface.blit_alpha_clipped(
            px + glyph.xoff,
            baseline + glyph.yoff,
            &glyph.bitmap,
            glyph.width,
            glyph.height,
            max_y,
            fg,
        );
    }
}

/// Repaint every visible cell, then the block cursor when live.
pub fn render_terminal<B>(
    surface: &mut Surface<B>,
    glyphs: &GlyphAdapter,
    viewport: &Viewport,
    engine: &Engine,
    mode: ViewMode,
) where
    B: DerefMut<Target = [u8]>,
{
    engine.visit_cells(|cell| paint_cell(surface, glyphs, viewport, &cell));

    if mode != ViewMode::Live {
        return;
    }
    if let Some((col, row)) = engine.cursor() {
        surface.invert_rect(
            col as i32 * viewport.cell_width,
            row as i32 * viewport.cell_height,
            viewport.cell_width,
            viewport.cell_height,
            viewport.terminal_height,
            CURSOR_XOR,
        );
    }
}
