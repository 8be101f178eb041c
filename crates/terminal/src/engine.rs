//! Terminal state machine wrapper.
//!
//! Owns the alacritty `Term` and its parser. Everything the terminal wants to
//! say back to the child (cursor reports, color replies, encoded key presses)
//! is queued in an outbox the session drains after each feed or key press.

use alacritty_terminal::event::{Event, EventListener, WindowSize};
use alacritty_terminal::grid::{Dimensions, Scroll};
use alacritty_terminal::term::cell::Flags as CellFlags;
use alacritty_terminal::term::{Config as TermConfig, Term, TermMode};
use alacritty_terminal::vte::ansi::{CursorShape, Processor};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::colors::{apply_dim, color_to_pixel, get_bright_color, Palette};
use crate::input::KeyInput;
use crate::types::{TermSize, WindowGeometry};

/// Collects engine events that need a reply on the child channel.
struct Listener {
    outbox: Rc<RefCell<Vec<u8>>>,
    window: Rc<Cell<WindowSize>>,
    palette: Rc<Palette>,
}

impl Listener {
    fn queue(&self, data: &[u8]) {
        self.outbox.borrow_mut().extend_from_slice(data);
    }
}

impl EventListener for Listener {
    fn send_event(&self, event: Event) {
        match event {
            Event::PtyWrite(text) => self.queue(text.as_bytes()),
            Event::ColorRequest(index, formatter) => {
                let response = formatter(self.palette.rgb(index));
                self.queue(response.as_bytes());
            }
            Event::TextAreaSizeRequest(formatter) => {
                let response = formatter(self.window.get());
                self.queue(response.as_bytes());
            }
            _ => {}
        }
    }
}

/// One visible cell, resolved to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPaint {
    pub col: usize,
    pub row: usize,
    pub ch: char,
    /// Columns covered, 1 or 2.
    pub width: usize,
    pub fg: u32,
    pub bg: u32,
    pub inverse: bool,
}

/// The terminal emulation engine.
pub struct Engine {
    term: Term<Listener>,
    parser: Processor,
    outbox: Rc<RefCell<Vec<u8>>>,
    window: Rc<Cell<WindowSize>>,
    palette: Rc<Palette>,
}

impl Engine {
    pub fn new(geometry: WindowGeometry, scrollback: usize, palette: Palette) -> Self {
        let outbox = Rc::new(RefCell::new(Vec::new()));
        let window = Rc::new(Cell::new(geometry.window_size()));
        let palette = Rc::new(palette);
        let listener = Listener {
            outbox: outbox.clone(),
            window: window.clone(),
            palette: palette.clone(),
        };
        let config = TermConfig {
            scrolling_history: scrollback,
            ..TermConfig::default()
        };
        let term = Term::new(config, &geometry.size, listener);
        tracing::debug!(
            "Terminal engine created: {}x{}, {} lines of history",
            geometry.size.cols,
            geometry.size.rows,
            scrollback
        );
        Self {
            term,
            parser: Processor::new(),
            outbox,
            window,
            palette,
        }
    }

    /// Parse output from the child.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.parser.advance(&mut self.term, bytes);
    }

    pub fn resize(&mut self, geometry: WindowGeometry) {
        self.window.set(geometry.window_size());
        self.term.resize(geometry.size);
    }

    pub fn size(&self) -> TermSize {
        TermSize {
            cols: self.term.columns() as u16,
            rows: self.term.screen_lines() as u16,
        }
    }

    /// Reveal `lines` more lines of history.
    pub fn scroll_up(&mut self, lines: usize) {
        self.term.scroll_display(Scroll::Delta(clamp_delta(lines)));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.term.scroll_display(Scroll::Delta(-clamp_delta(lines)));
    }

    /// Return to the live screen.
    pub fn reset_scroll(&mut self) {
        self.term.scroll_display(Scroll::Bottom);
    }

    /// Lines of history currently shown above the live screen.
    pub fn display_offset(&self) -> usize {
        self.term.grid().display_offset()
    }

    /// Encode a key press and queue it for the child.
    pub fn key_input(&mut self, key: &KeyInput) {
        let app_cursor = self.term.mode().contains(TermMode::APP_CURSOR);
        match key.encode(app_cursor) {
            Some(seq) => self.outbox.borrow_mut().extend_from_slice(seq.as_bytes()),
            None => tracing::debug!("No encoding for keysym {:#x}", key.keysym),
        }
    }

    /// Drain bytes queued for the child.
    pub fn take_writeback(&mut self) -> Vec<u8> {
        std::mem::take(&mut *self.outbox.borrow_mut())
    }

    /// Cursor position in visual coordinates, or `None` when hidden or
    /// scrolled off screen.
    pub fn cursor(&self) -> Option<(usize, usize)> {
        let content = self.term.renderable_content();
        if content.cursor.shape == CursorShape::Hidden {
            return None;
        }
        let row = content.cursor.point.line.0 + content.display_offset as i32;
        let col = content.cursor.point.column.0;
        if row < 0 || row as usize >= self.term.screen_lines() || col >= self.term.columns() {
            return None;
        }
        Some((col, row as usize))
    }

    /// Enumerate every visible cell with resolved colors.
    ///
    /// Bold brightens base colors, dim darkens, hidden paints the foreground
    /// as background. Inverse is left to the caller.
    pub fn visit_cells(&self, mut f: impl FnMut(CellPaint)) {
        let content = self.term.renderable_content();
        let term_colors = content.colors;
        let display_offset = content.display_offset as i32;
        let rows = self.term.screen_lines();
        let cols = self.term.columns();

        for cell in content.display_iter {
            let row = cell.point.line.0 + display_offset;
            let col = cell.point.column.0;
            if row < 0 || row as usize >= rows || col >= cols {
                continue;
            }

            let flags = cell.flags;
            if flags.contains(CellFlags::WIDE_CHAR_SPACER) {
                continue;
            }

            let mut fg = if flags.contains(CellFlags::BOLD) {
                get_bright_color(cell.fg, term_colors, &self.palette)
            } else {
                color_to_pixel(cell.fg, term_colors, &self.palette)
            };
            let bg = color_to_pixel(cell.bg, term_colors, &self.palette);
            if flags.contains(CellFlags::DIM) {
                fg = apply_dim(fg);
            }
            if flags.contains(CellFlags::HIDDEN) {
                fg = bg;
            }

            f(CellPaint {
                col,
                row: row as usize,
                ch: cell.c,
                width: if flags.contains(CellFlags::WIDE_CHAR) {
                    2
                } else {
                    1
                },
                fg,
                bg,
                inverse: flags.contains(CellFlags::INVERSE),
            });
        }
    }
}

fn clamp_delta(lines: usize) -> i32 {
    lines.min(i32::MAX as usize) as i32
}
