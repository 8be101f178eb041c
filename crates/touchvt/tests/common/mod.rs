//! Shared fixtures for session tests.
//!
//! Sessions here draw into a plain `Vec<u8>` surface and talk to a mocked
//! child channel, so no framebuffer, touchscreen or PTY is needed.

// Not every test binary uses every helper
#![allow(dead_code)]

use framebuffer::Surface;
use glyphs::GlyphAdapter;
use keyboard::LAYOUT;
use mockall::mock;
use std::sync::{Arc, Mutex};
use terminal::{ChildChannel, Engine, Palette, WindowGeometry};
use terminal_view::Viewport;
use touchvt::{Session, TouchEvent};

pub const WIDTH: i32 = 480;
pub const HEIGHT: i32 = 800;
pub const FONT_SIZE: u32 = 20;
pub const SCROLLBACK: usize = 1000;

mock! {
    pub Channel {}

    impl ChildChannel for Channel {
        fn write_all(&mut self, data: &[u8]) -> anyhow::Result<()>;
        fn resize(&mut self, geometry: WindowGeometry) -> anyhow::Result<()>;
    }
}

pub type TestSession = Session<Vec<u8>, MockChannel>;

pub fn surface() -> Surface<Vec<u8>> {
    Surface::new(
        vec![0u8; (WIDTH * HEIGHT * 4) as usize],
        WIDTH as u32,
        HEIGHT as u32,
        WIDTH as u32,
    )
    .expect("surface")
}

/// A session at the default font size with `channel` as the child.
pub fn session(channel: MockChannel) -> TestSession {
    let font = glyphs::load_font(None).expect("built-in font");
    let mut glyphs = GlyphAdapter::new(font, FONT_SIZE);
    let viewport = Viewport::compute(WIDTH, HEIGHT, FONT_SIZE, &mut glyphs);
    let engine = Engine::new(viewport.geometry(), SCROLLBACK, Palette::default());
    let mut session = Session::new(surface(), glyphs, viewport, engine, channel);
    session.redraw_all();
    session
}

/// A channel that records every write into `sink` and accepts resizes.
pub fn recording_channel(sink: Arc<Mutex<Vec<u8>>>) -> MockChannel {
    let mut channel = MockChannel::new();
    channel.expect_write_all().returning(move |data| {
        sink.lock().expect("sink").extend_from_slice(data);
        Ok(())
    });
    channel.expect_resize().returning(|_| Ok(()));
    channel
}

/// Centre of the first key labelled `label`.
pub fn key_center(session: &TestSession, label: &str) -> (i32, i32) {
    let geometry = session.keyboard().geometry();
    for (row, keys) in LAYOUT.iter().enumerate() {
        for (col, key) in keys.iter().enumerate() {
            if key.label == label {
                let (x, y, w, h) = geometry.key_rect(row, col).expect("visible key");
                return (x + w / 2, y + h / 2);
            }
        }
    }
    panic!("no key labelled {label:?}");
}

/// Press and release a key. Returns whether either step asked for a terminal repaint.
pub fn tap(session: &mut TestSession, label: &str) -> bool {
    let (x, y) = key_center(session, label);
    let down = session.on_touch(TouchEvent::Down { x, y });
    let up = session.on_touch(TouchEvent::Up);
    down || up
}

/// Feed `count` numbered lines of output.
pub fn fill_history(session: &mut TestSession, count: usize) {
    for i in 0..count {
        session.on_output(format!("line {i}\r\n").as_bytes());
    }
}
