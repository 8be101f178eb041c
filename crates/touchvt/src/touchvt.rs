//! touchvt: a framebuffer terminal driven by a touchscreen.
//!
//! The binary wires these pieces together; they live in a library so the
//! session logic can be exercised without devices.

pub mod app;
pub mod cli;
pub mod console;
pub mod event_loop;
pub mod input;
pub mod session;
pub mod signals;

pub use cli::Cli;
pub use event_loop::StopReason;
pub use input::{TouchDecoder, TouchEvent, TouchSource, Touchscreen};
pub use session::Session;
