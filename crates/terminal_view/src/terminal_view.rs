//! Terminal view layer.
//!
//! Screen layout, scroll gestures and cell painting for the terminal region.

mod gesture;
mod view;
mod viewport;

pub use gesture::{Gesture, ScrollRequest, ViewMode};
pub use view::{paint_cell, render_terminal};
pub use viewport::{clamp_font_size, Viewport};
