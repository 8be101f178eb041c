//! Drag-to-scroll over the terminal region.

use settings::constants::scrollback::MAX_LINES;

/// Whether the terminal shows the live screen or history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Live,
    /// Scrolled back this many lines, `1..=MAX_LINES`.
    ScrolledBack(usize),
}

/// Scroll the display by whole lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    /// Reveal older lines.
    Up(usize),
    /// Move back toward the live screen.
    Down(usize),
}

/// Vertical drag tracking.
///
/// Dragging downward pulls history into view. The anchor advances by the
/// whole lines consumed, so slow drags accumulate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gesture {
    armed_y: Option<i32>,
    offset: usize,
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking at `y`. Touches on the keyboard disarm instead.
    pub fn touch_down(&mut self, y: i32, on_keyboard: bool) {
        self.armed_y = if on_keyboard { None } else { Some(y) };
    }

    pub fn touch_up(&mut self) {
        self.armed_y = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_y.is_some()
    }

    /// Feed a motion sample. Returns a request once the drag covers more
    /// than one cell.
    pub fn motion(&mut self, y: i32, cell_height: i32) -> Option<ScrollRequest> {
        let armed = self.armed_y?;
        if cell_height <= 0 {
            return None;
        }
        let dy = y - armed;
        if dy.abs() <= cell_height {
            return None;
        }
        let lines = dy.abs() / cell_height;
        self.armed_y = Some(armed + dy.signum() * lines * cell_height);

        let lines = lines as usize;
        if dy > 0 {
            self.offset = (self.offset + lines).min(MAX_LINES);
            Some(ScrollRequest::Up(lines))
        } else {
            self.offset = self.offset.saturating_sub(lines);
            Some(ScrollRequest::Down(lines))
        }
    }

    /// Back to the live screen. Tracking is unaffected.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Adopt the offset the engine actually applied, which is lower than
    /// requested when history runs out.
    pub fn sync(&mut self, display_offset: usize) {
        self.offset = display_offset.min(MAX_LINES);
    }

    pub fn mode(&self) -> ViewMode {
        match self.offset {
            0 => ViewMode::Live,
            n => ViewMode::ScrolledBack(n),
        }
    }
}
