//! The session context: everything the event loop mutates.

use framebuffer::Surface;
use glyphs::GlyphAdapter;
use keyboard::{KeyAction, Keyboard};
use settings::constants::colors;
use std::ops::DerefMut;
use terminal::{ChildChannel, Engine};
use terminal_view::{render_terminal, Gesture, ScrollRequest, ViewMode, Viewport};

use crate::input::TouchEvent;

/// Owns the screen, keyboard, terminal engine and child channel.
///
/// Fields drop in declaration order, so the child is hung up before the
/// engine goes away and the surface is released last.
pub struct Session<B, C>
where
    B: DerefMut<Target = [u8]>,
    C: ChildChannel,
{
    channel: C,
    engine: Engine,
    keyboard: Keyboard,
    gesture: Gesture,
    viewport: Viewport,
    glyphs: GlyphAdapter,
    surface: Surface<B>,
}

impl<B, C> Session<B, C>
where
    B: DerefMut<Target = [u8]>,
    C: ChildChannel,
{
    /// Assemble a session. `viewport` must come from `Viewport::compute`
    /// on this surface and glyph adapter, and `engine` must match its grid.
    pub fn new(
        surface: Surface<B>,
        glyphs: GlyphAdapter,
        viewport: Viewport,
        engine: Engine,
        channel: C,
    ) -> Self {
        let mut keyboard = Keyboard::new();
        keyboard.relayout(viewport.keyboard, &glyphs);
        Self {
            channel,
            engine,
            keyboard,
            gesture: Gesture::new(),
            viewport,
            glyphs,
            surface,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn mode(&self) -> ViewMode {
        self.gesture.mode()
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn surface(&self) -> &Surface<B> {
        &self.surface
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Clear the screen and repaint keyboard and terminal.
    pub fn redraw_all(&mut self) {
        self.surface.clear(colors::BACKGROUND);
        self.keyboard.render(&mut self.surface, &self.glyphs);
        self.render_terminal();
    }

    pub fn render_terminal(&mut self) {
        render_terminal(
            &mut self.surface,
            &self.glyphs,
            &self.viewport,
            &self.engine,
            self.gesture.mode(),
        );
    }

    /// Feed child output to the engine and answer any queries it raised.
    pub fn on_output(&mut self, bytes: &[u8]) {
        self.engine.feed(bytes);
        // New output while scrolled back shifts the engine's offset.
        self.gesture.sync(self.engine.display_offset());
        self.flush_writeback();
    }

    /// Route a touch event. Returns whether the terminal needs repainting.
    pub fn on_touch(&mut self, event: TouchEvent) -> bool {
        match event {
            TouchEvent::Down { x, y } => match self.keyboard.hit_test(x, y) {
                Some((row, col)) => {
                    self.gesture.touch_down(y, true);
                    self.press_key(row, col)
                }
                None => {
                    self.gesture.touch_down(y, false);
                    false
                }
            },
            TouchEvent::Motion { y, .. } => {
                match self.gesture.motion(y, self.viewport.cell_height) {
                    Some(request) => {
                        self.scroll(request);
                        true
                    }
                    None => false,
                }
            }
            TouchEvent::Up => {
                self.gesture.touch_up();
                if self.keyboard.pressed().is_some() {
                    self.keyboard.release();
                    self.keyboard.render(&mut self.surface, &self.glyphs);
                }
                false
            }
        }
    }

    fn press_key(&mut self, row: usize, col: usize) -> bool {
        let action = self.keyboard.press(row, col);
        self.keyboard.render(&mut self.surface, &self.glyphs);
        match action {
            Some(KeyAction::Input(key)) => {
                let was_scrolled = self.gesture.mode() != ViewMode::Live;
                self.engine.reset_scroll();
                self.gesture.reset();
                self.engine.key_input(&key);
                self.flush_writeback();
                was_scrolled
            }
            Some(KeyAction::FontSize(delta)) => {
                self.apply_font_size(self.viewport.font_size as i64 + delta as i64);
                false
            }
            Some(KeyAction::ModifierToggled(_)) | None => false,
        }
    }

    fn scroll(&mut self, request: ScrollRequest) {
        match request {
            ScrollRequest::Up(lines) => self.engine.scroll_up(lines),
            ScrollRequest::Down(lines) => self.engine.scroll_down(lines),
        }
        self.gesture.sync(self.engine.display_offset());
        tracing::trace!(?request, mode = ?self.gesture.mode(), "Scrolled");
    }

    /// Re-lay out the screen at a new font size, resize engine and child,
    /// and repaint everything.
    pub fn apply_font_size(&mut self, requested: i64) {
        let size = terminal_view::clamp_font_size(requested);
        let viewport = Viewport::compute(
            self.surface.width(),
            self.surface.height(),
            size,
            &mut self.glyphs,
        );
        self.keyboard.relayout(viewport.keyboard, &self.glyphs);
        self.viewport = viewport;

        let geometry = viewport.geometry();
        self.engine.resize(geometry);
        if let Err(e) = self.channel.resize(geometry) {
            tracing::warn!("Failed to resize child window: {}", e);
        }
        self.gesture.sync(self.engine.display_offset());
        tracing::info!(
            "Font size {} px: {}x{} cells",
            size,
            viewport.cols,
            viewport.rows
        );
        self.redraw_all();
    }

    /// Send queued terminal replies and key bytes to the child.
    pub fn flush_writeback(&mut self) {
        let bytes = self.engine.take_writeback();
        if bytes.is_empty() {
            return;
        }
        if let Err(e) = self.channel.write_all(&bytes) {
            tracing::warn!("Failed to write {} bytes to child: {}", bytes.len(), e);
        }
    }

    /// Tear down in order: child, engine, then hand back the surface.
    pub fn into_surface(self) -> Surface<B> {
        let Self {
            channel,
            engine,
            surface,
            ..
        } = self;
        drop(channel);
        tracing::debug!("Child channel released");
        drop(engine);
        tracing::debug!("Terminal engine released");
        surface
    }
}
