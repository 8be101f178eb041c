//! Terminal data types.

use alacritty_terminal::event::WindowSize;
use alacritty_terminal::grid::Dimensions;
use portable_pty::PtySize;

/// Terminal dimensions in rows and columns.
///
/// Implements `Dimensions` trait for alacritty compatibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermSize {
    pub cols: u16,
    pub rows: u16,
}

impl Default for TermSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

impl Dimensions for TermSize {
    fn total_lines(&self) -> usize {
        self.rows as usize
    }

    fn screen_lines(&self) -> usize {
        self.rows as usize
    }

    fn columns(&self) -> usize {
        self.cols as usize
    }
}

/// Grid size plus the pixel size of one cell.
///
/// This is what the child sees as its window size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub size: TermSize,
    pub cell_width: u16,
    pub cell_height: u16,
}

impl WindowGeometry {
    pub fn pixel_width(&self) -> u16 {
        self.size.cols.saturating_mul(self.cell_width)
    }

    pub fn pixel_height(&self) -> u16 {
        self.size.rows.saturating_mul(self.cell_height)
    }

    pub fn pty_size(&self) -> PtySize {
        PtySize {
            rows: self.size.rows,
            cols: self.size.cols,
            pixel_width: self.pixel_width(),
            pixel_height: self.pixel_height(),
        }
    }

    pub fn window_size(&self) -> WindowSize {
        WindowSize {
            num_lines: self.size.rows,
            num_cols: self.size.cols,
            cell_width: self.cell_width,
            cell_height: self.cell_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_term_size_dimensions() {
        let size = TermSize { cols: 100, rows: 30 };
        assert_eq!(size.columns(), 100);
        assert_eq!(size.screen_lines(), 30);
        assert_eq!(size.total_lines(), 30);
    }

    #[test]
    fn test_pty_size_carries_pixels() {
        let geometry = WindowGeometry {
            size: TermSize { cols: 66, rows: 14 },
            cell_width: 12,
            cell_height: 24,
        };
        let pty = geometry.pty_size();
        assert_eq!((pty.cols, pty.rows), (66, 14));
        assert_eq!((pty.pixel_width, pty.pixel_height), (792, 336));
    }

    #[test]
    fn test_pixel_size_saturates() {
        let geometry = WindowGeometry {
            size: TermSize {
                cols: u16::MAX,
                rows: 2,
            },
            cell_width: 4,
            cell_height: 4,
        };
        assert_eq!(geometry.pixel_width(), u16::MAX);
        assert_eq!(geometry.pixel_height(), 8);
    }
}
