//! Terminal emulation core.
//!
//! Wraps the alacritty terminal engine behind a cell-painting interface, owns
//! the pseudo-terminal child, and encodes on-screen keyboard input.

pub mod colors;
mod engine;
pub mod input;
mod pty_handler;
pub mod types;

pub use colors::Palette;
pub use engine::{CellPaint, Engine};
pub use input::{keysym, KeyInput, KeyMods, Modifier};
pub use pty_handler::{ChildChannel, PtyHandler};
pub use types::*;
