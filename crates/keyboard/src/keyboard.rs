//! On-screen keyboard.
//!
//! A fixed 5x12 grid docked to the bottom of the screen. Modifiers are
//! sticky: tapping Shift, Ctrl or Alt toggles them until tapped again.

pub mod layout;

use framebuffer::Surface;
use glyphs::GlyphAdapter;
use settings::constants::{colors, font, keyboard as dims};
use std::ops::DerefMut;
use terminal::{KeyInput, KeyMods, Modifier};

pub use layout::{Key, HIDDEN_KEY, LAYOUT, WIDE_KEY};

/// Pixel placement of the key grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardGeometry {
    pub key_height: i32,
    pub key_width: i32,
    /// Top edge of the first key row. Everything above belongs to the terminal.
    pub origin_y: i32,
}

impl KeyboardGeometry {
    pub fn compute(surface_width: i32, surface_height: i32, font_size: u32) -> Self {
        let key_height = (dims::ROW_HEIGHT_FACTOR * font_size as f64) as i32;
        let key_width = surface_width / dims::COLS as i32;
        Self {
            key_height,
            key_width,
            origin_y: surface_height - dims::ROWS as i32 * key_height,
        }
    }

    pub fn height(&self) -> i32 {
        dims::ROWS as i32 * self.key_height
    }

    /// Whether `y` falls inside the keyboard band.
    pub fn contains_y(&self, y: i32) -> bool {
        y >= self.origin_y && y < self.origin_y + self.height()
    }

    /// Key under a point. The hidden half of the space bar resolves to the space bar.
    ///
    /// Columns clamp at both edges, so only `y` can miss the keyboard.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if !self.contains_y(y) || self.key_width <= 0 || self.key_height <= 0 {
            return None;
        }
        let col = (x / self.key_width).clamp(0, dims::COLS as i32 - 1) as usize;
        let row = ((y - self.origin_y) / self.key_height) as usize;
        if (row, col) == HIDDEN_KEY {
            return Some(WIDE_KEY);
        }
        Some((row, col))
    }

    /// Full cell rectangle `(x, y, w, h)` of a key, or `None` for the hidden cell.
    pub fn key_rect(&self, row: usize, col: usize) -> Option<(i32, i32, i32, i32)> {
        if (row, col) == HIDDEN_KEY || row >= dims::ROWS || col >= dims::COLS {
            return None;
        }
        let span = if (row, col) == WIDE_KEY { 2 } else { 1 };
        Some((
            col as i32 * self.key_width,
            self.origin_y + row as i32 * self.key_height,
            span * self.key_width,
            self.key_height,
        ))
    }
}

/// What a key press asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// A sticky modifier flipped. Nothing goes to the child.
    ModifierToggled(Modifier),
    /// Ctrl+'-' or Ctrl+'+': change the font size by this many pixels.
    FontSize(i32),
    /// Forward to the terminal.
    Input(KeyInput),
}

pub struct Keyboard {
    mods: KeyMods,
    pressed: Option<(usize, usize)>,
    geometry: KeyboardGeometry,
    /// Label widths `(unshifted, shifted)` at the current font size.
    label_widths: [[(i32, i32); dims::COLS]; dims::ROWS],
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            mods: KeyMods::default(),
            pressed: None,
            geometry: KeyboardGeometry::default(),
            label_widths: [[(0, 0); dims::COLS]; dims::ROWS],
        }
    }

    /// Recompute key geometry and label widths for a new font size.
    pub fn relayout(&mut self, geometry: KeyboardGeometry, glyphs: &GlyphAdapter) {
        self.geometry = geometry;
        for (widths, keys) in self.label_widths.iter_mut().zip(LAYOUT.iter()) {
            for (width, key) in widths.iter_mut().zip(keys.iter()) {
                *width = (
                    glyphs.text_width(key.label(false)),
                    glyphs.text_width(key.label(true)),
                );
            }
        }
        tracing::debug!(?geometry, "Keyboard relayout");
    }

    pub fn geometry(&self) -> KeyboardGeometry {
        self.geometry
    }

    pub fn mods(&self) -> KeyMods {
        self.mods
    }

    pub fn pressed(&self) -> Option<(usize, usize)> {
        self.pressed
    }

    pub fn hit_test(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        self.geometry.hit_test(x, y)
    }

    /// Handle a press on key `(row, col)` and mark it pressed.
    pub fn press(&mut self, row: usize, col: usize) -> Option<KeyAction> {
        let key = LAYOUT.get(row)?.get(col)?;
        self.pressed = Some((row, col));
        let sym = key.sym(self.mods.shift);

        if self.mods.ctrl {
            let step = font::SIZE_STEP as i32;
            if sym == '-' as u32 && !self.mods.shift {
                return Some(KeyAction::FontSize(-step));
            }
            if sym == '+' as u32 && self.mods.shift {
                return Some(KeyAction::FontSize(step));
            }
        }

        if let Some(modifier) = Modifier::from_keysym(sym) {
            self.mods.toggle(modifier);
            tracing::debug!(?modifier, mods = ?self.mods, "Modifier toggled");
            return Some(KeyAction::ModifierToggled(modifier));
        }

        Some(KeyAction::Input(KeyInput::new(sym, self.mods)))
    }

    /// Clear the pressed highlight.
    pub fn release(&mut self) {
        self.pressed = None;
    }

    fn key_color(&self, row: usize, col: usize) -> u32 {
        if self.pressed == Some((row, col)) {
            return colors::KEY_PRESSED;
        }
        match Modifier::from_keysym(LAYOUT[row][col].sym) {
            Some(modifier) if self.mods.is_active(modifier) => colors::KEY_MODIFIER_ACTIVE,
            _ => colors::KEY_DEFAULT,
        }
    }

    /// Paint every key.
    pub fn render<B>(&self, surface: &mut Surface<B>, glyphs: &GlyphAdapter)
    where
        B: DerefMut<Target = [u8]>,
    {
        let metrics = glyphs.v_metrics();
        let ascent = metrics.ascent as i32;
        let fh = (metrics.ascent - metrics.descent) as i32;
        let baseline_offset = self.geometry.key_height / 2 + (fh / 2 + ascent - fh);
        let inset = dims::KEY_INSET;

        for (row, keys) in LAYOUT.iter().enumerate() {
            for (col, key) in keys.iter().enumerate() {
                let Some((kx, ky, kw, kh)) = self.geometry.key_rect(row, col) else {
                    continue;
                };
                surface.fill_rect(
                    kx + inset,
                    ky + inset,
                    kw - 2 * inset,
                    kh - 2 * inset,
                    self.key_color(row, col),
                );

                let shifted = self.mods.shift;
                let (plain_w, shift_w) = self.label_widths[row][col];
                let label_w = if shifted { shift_w } else { plain_w };
                draw_text(
                    surface,
                    glyphs,
                    kx + (kw - label_w) / 2,
                    ky + baseline_offset,
                    key.label(shifted),
                    colors::KEY_LABEL,
                );
            }
        }
    }
}

/// Draw `text` with its baseline at `y`, advancing a pen from `x`.
fn draw_text<B>(surface: &mut Surface<B>, glyphs: &GlyphAdapter, x: i32, y: i32, text: &str, color: u32)
where
    B: DerefMut<Target = [u8]>,
{
    let mut pen = x;
    for ch in text.chars() {
        if let Some(glyph) = glyphs.glyph(ch) {
            surface.blit_alpha(
                pen + glyph.xoff,
                y + glyph.yoff,
                &glyph.bitmap,
                glyph.width,
                glyph.height,
                color,
            );
        }
        pen += glyphs.advance(ch) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use terminal::keysym;
    use test_case::test_case;

    const WIDTH: i32 = 480;
    const HEIGHT: i32 = 800;

    fn glyphs() -> GlyphAdapter {
        GlyphAdapter::new(glyphs::load_font(None).unwrap(), 20)
    }

    fn keyboard() -> Keyboard {
        let mut kb = Keyboard::new();
        kb.relayout(KeyboardGeometry::compute(WIDTH, HEIGHT, 20), &glyphs());
        kb
    }

    fn surface() -> Surface<Vec<u8>> {
        Surface::new(
            vec![0u8; (WIDTH * HEIGHT * 4) as usize],
            WIDTH as u32,
            HEIGHT as u32,
            WIDTH as u32,
        )
        .unwrap()
    }

    fn find(label: &str) -> (usize, usize) {
        for (r, row) in LAYOUT.iter().enumerate() {
            for (c, key) in row.iter().enumerate() {
                if key.label == label {
                    return (r, c);
                }
            }
        }
        panic!("no key labelled {label:?}");
    }

    fn tap(kb: &mut Keyboard, label: &str) -> Option<KeyAction> {
        let (r, c) = find(label);
        let action = kb.press(r, c);
        kb.release();
        action
    }

    #[test]
    fn test_geometry_at_default_font() {
        let g = KeyboardGeometry::compute(WIDTH, HEIGHT, 20);
        assert_eq!(g.key_height, 52);
        assert_eq!(g.key_width, 40);
        assert_eq!(g.origin_y, 800 - 5 * 52);
        assert_eq!(g.height(), 260);
    }

    #[test_case(0, 539, None ; "just_above_keyboard")]
    #[test_case(0, 540, Some((0, 0)) ; "top_left_key")]
    #[test_case(479, 799, Some((4, 11)) ; "bottom_right_key")]
    #[test_case(0, 800, None ; "below_keyboard")]
    #[test_case(6 * 40 + 3, 540 + 4 * 52 + 3, Some((4, 5)) ; "hidden_cell_maps_to_space")]
    #[test_case(5 * 40 + 3, 540 + 4 * 52 + 3, Some((4, 5)) ; "space_bar")]
    #[test_case(-1, 600, Some((1, 0)) ; "left_of_screen_clamps_to_first_column")]
    #[test_case(-500, 600, Some((1, 0)) ; "far_left_clamps_to_first_column")]
    fn test_hit_test(x: i32, y: i32, expected: Option<(usize, usize)>) {
        let g = KeyboardGeometry::compute(WIDTH, HEIGHT, 20);
        assert_eq!(g.hit_test(x, y), expected);
    }

    #[test]
    fn test_hit_test_clamps_rightmost_column() {
        // 490 / 12 leaves 10 pixels of slack past the last column.
        let g = KeyboardGeometry::compute(490, HEIGHT, 20);
        assert_eq!(g.key_width, 40);
        assert_eq!(g.hit_test(485, 600), Some((1, 11)));
    }

    #[test]
    fn test_space_bar_spans_two_columns() {
        let g = KeyboardGeometry::compute(WIDTH, HEIGHT, 20);
        let (_, _, w, _) = g.key_rect(WIDE_KEY.0, WIDE_KEY.1).unwrap();
        assert_eq!(w, 2 * g.key_width);
        assert_eq!(g.key_rect(HIDDEN_KEY.0, HIDDEN_KEY.1), None);
    }

    #[test]
    fn test_shift_a_sends_capital_and_stays_shifted() {
        let mut kb = keyboard();
        assert_eq!(
            tap(&mut kb, "Shft"),
            Some(KeyAction::ModifierToggled(Modifier::Shift))
        );
        let Some(KeyAction::Input(input)) = tap(&mut kb, "a") else {
            panic!("expected key input");
        };
        assert_eq!(input.keysym, 'A' as u32);
        assert_eq!(input.literal, Some('A'));
        assert!(input.mods.shift);
        assert!(kb.mods().shift);
    }

    #[test]
    fn test_right_shift_toggles_same_flag() {
        let mut kb = keyboard();
        tap(&mut kb, "Shft");
        kb.press(3, 11);
        assert!(!kb.mods().shift);
    }

    #[test]
    fn test_ctrl_minus_and_plus_change_font_size() {
        let mut kb = keyboard();
        tap(&mut kb, "Ctrl");
        assert_eq!(tap(&mut kb, "-"), Some(KeyAction::FontSize(-2)));
        tap(&mut kb, "Shft");
        assert_eq!(tap(&mut kb, "="), Some(KeyAction::FontSize(2)));
        assert!(kb.mods().ctrl);
    }

    #[test]
    fn test_minus_without_ctrl_is_typed() {
        let mut kb = keyboard();
        let Some(KeyAction::Input(input)) = tap(&mut kb, "-") else {
            panic!("expected key input");
        };
        assert_eq!(input.literal, Some('-'));
    }

    #[test]
    fn test_special_keys_have_no_literal() {
        let mut kb = keyboard();
        let Some(KeyAction::Input(input)) = tap(&mut kb, "Ent") else {
            panic!("expected key input");
        };
        assert_eq!(input.keysym, keysym::RETURN);
        assert_eq!(input.literal, None);
    }

    #[test]
    fn test_press_marks_and_release_clears() {
        let mut kb = keyboard();
        kb.press(1, 3);
        assert_eq!(kb.pressed(), Some((1, 3)));
        kb.release();
        assert_eq!(kb.pressed(), None);
    }

    #[test]
    fn test_render_colors_keys() {
        let mut kb = keyboard();
        let g = kb.geometry();
        let mut s = surface();
        s.clear(0xff123456);
        tap(&mut kb, "Ctrl");
        kb.press(0, 1);
        kb.render(&mut s, &glyphs());

        let (x, y, _, _) = g.key_rect(0, 1).unwrap();
        assert_eq!(s.pixel(x + 2, y + 2), Some(colors::KEY_PRESSED));
        // Inset leaves the border alone.
        assert_eq!(s.pixel(x, y), Some(0xff123456));
        let (x, y, _, _) = g.key_rect(2, 0).unwrap();
        assert_eq!(s.pixel(x + 2, y + 2), Some(colors::KEY_MODIFIER_ACTIVE));
        let (x, y, _, _) = g.key_rect(1, 1).unwrap();
        assert_eq!(s.pixel(x + 2, y + 2), Some(colors::KEY_DEFAULT));
        // The terminal area is untouched.
        assert_eq!(s.pixel(10, 10), Some(0xff123456));
    }

    #[test]
    fn test_render_draws_label_ink() {
        let kb = keyboard();
        let g = kb.geometry();
        let mut s = surface();
        kb.render(&mut s, &glyphs());
        let (x, y, w, h) = g.key_rect(1, 1).unwrap();
        let mut ink = false;
        for py in y..y + h {
            for px in x..x + w {
                if s.pixel(px, py).is_some_and(|p| p & 0x00ff_ffff != 0) {
                    ink = true;
                }
            }
        }
        assert!(ink, "label should be drawn inside the key");
    }

    proptest! {
        /// Property: modifiers survive any run of ordinary key presses
        #[test]
        fn prop_modifiers_are_sticky(keys in proptest::collection::vec((1usize..2, 1usize..11), 0..20)) {
            let mut kb = keyboard();
            tap(&mut kb, "Alt");
            for (r, c) in keys {
                kb.press(r, c);
                kb.release();
                prop_assert!(kb.mods().alt);
            }
        }

        /// Property: every point inside a drawn key hits that key
        #[test]
        fn prop_hit_test_matches_key_rect(row in 0usize..5, col in 0usize..12, fx in 0.0f64..1.0, fy in 0.0f64..1.0) {
            let g = KeyboardGeometry::compute(WIDTH, HEIGHT, 20);
            if let Some((x, y, w, h)) = g.key_rect(row, col) {
                let px = x + (fx * w as f64) as i32;
                let py = y + (fy * h as f64) as i32;
                prop_assert_eq!(g.hit_test(px, py), Some((row, col)));
            }
        }

        /// Property: nothing above the keyboard band is a key
        #[test]
        fn prop_terminal_area_is_never_a_key(x in 0i32..WIDTH, y in 0i32..540) {
            let g = KeyboardGeometry::compute(WIDTH, HEIGHT, 20);
            prop_assert_eq!(g.hit_test(x, y), None);
        }
    }
}
