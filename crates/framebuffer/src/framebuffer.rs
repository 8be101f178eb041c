//! Framebuffer pixel surface.
//!
//! A [`Surface`] is any byte buffer interpreted as 32-bit packed pixels with a
//! row stride. [`device::open`] maps a Linux framebuffer device into one;
//! tests use a plain `Vec<u8>`.

pub mod device;
mod surface;

pub use device::FramebufferError;
pub use surface::{blend, Surface};
