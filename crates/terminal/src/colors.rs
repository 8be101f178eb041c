//! Terminal color resolution.
//!
//! Converts alacritty_terminal colors into `0xAARRGGBB` pixels.
//! Handles:
//! - Named ANSI colors (0-15) and their dim/bright variants
//! - 256-color indexed palette (16-255)
//! - Palette fallbacks when the application hasn't set custom colors

use alacritty_terminal::term::color::Colors as TermColors;
use alacritty_terminal::vte::ansi::{Color, NamedColor, Rgb};

/// Default colors used when the running program hasn't overridden them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub foreground: u32,
    pub background: u32,
    pub cursor: u32,
    /// ANSI 0-15.
    pub ansi: [u32; 16],
}

impl Default for Palette {
    /// xterm's stock colors on a black background.
    fn default() -> Self {
        Self {
            foreground: 0xffe5e5e5,
            background: 0xff000000,
            cursor: 0xffe5e5e5,
            ansi: [
                0xff000000, 0xffcd0000, 0xff00cd00, 0xffcdcd00, 0xff0000ee, 0xffcd00cd,
                0xff00cdcd, 0xffe5e5e5, 0xff7f7f7f, 0xffff0000, 0xff00ff00, 0xffffff00,
                0xff5c5cff, 0xffff00ff, 0xff00ffff, 0xffffffff,
            ],
        }
    }
}

impl Palette {
    /// Color for an alacritty palette slot, used to answer color queries.
    ///
    /// Slots 0-255 are the indexed palette, then foreground, background
    /// and cursor.
    pub fn rgb(&self, index: usize) -> Rgb {
        let pixel = match index {
            0..=255 => indexed_color_to_pixel(index as u8, self),
            256 => self.foreground,
            257 => self.background,
            258 => self.cursor,
            _ => self.foreground,
        };
        pixel_to_rgb(pixel)
    }
}

/// Pack RGB into an opaque pixel.
pub fn rgb_to_pixel(rgb: Rgb) -> u32 {
    0xff00_0000 | (rgb.r as u32) << 16 | (rgb.g as u32) << 8 | rgb.b as u32
}

pub fn pixel_to_rgb(pixel: u32) -> Rgb {
    Rgb {
        r: (pixel >> 16) as u8,
        g: (pixel >> 8) as u8,
        b: pixel as u8,
    }
}

/// Resolve a cell color using terminal overrides with palette fallbacks.
pub fn color_to_pixel(color: Color, term_colors: &TermColors, palette: &Palette) -> u32 {
    match color {
        Color::Named(named) => term_colors[named]
            .map(rgb_to_pixel)
            .unwrap_or_else(|| named_color_to_pixel(named, palette)),
        Color::Spec(rgb) => rgb_to_pixel(rgb),
        Color::Indexed(idx) => term_colors[idx as usize]
            .map(rgb_to_pixel)
            .unwrap_or_else(|| indexed_color_to_pixel(idx, palette)),
    }
}

/// Convert a named color using the palette.
pub fn named_color_to_pixel(color: NamedColor, palette: &Palette) -> u32 {
    match color {
        NamedColor::Foreground | NamedColor::BrightForeground => palette.foreground,
        NamedColor::Background => palette.background,
        NamedColor::Cursor => palette.cursor,
        NamedColor::DimForeground => apply_dim(palette.foreground),
        NamedColor::DimBlack
        | NamedColor::DimRed
        | NamedColor::DimGreen
        | NamedColor::DimYellow
        | NamedColor::DimBlue
        | NamedColor::DimMagenta
        | NamedColor::DimCyan
        | NamedColor::DimWhite => {
            let base = color as usize - NamedColor::DimBlack as usize;
            apply_dim(palette.ansi[base])
        }
        other => palette
            .ansi
            .get(other as usize)
            .copied()
            .unwrap_or(palette.foreground),
    }
}

/// Convert an indexed color (0-255).
///
/// The 256-color palette is organized as:
/// - 0-15: Named ANSI colors
/// - 16-231: 6x6x6 color cube
/// - 232-255: 24-step grayscale
pub fn indexed_color_to_pixel(idx: u8, palette: &Palette) -> u32 {
    const CUBE: [u8; 6] = [0, 95, 135, 175, 215, 255];
    match idx {
        0..=15 => palette.ansi[idx as usize],
        16..=231 => {
            let idx = idx - 16;
            rgb_to_pixel(Rgb {
                r: CUBE[(idx / 36) as usize],
                g: CUBE[((idx % 36) / 6) as usize],
                b: CUBE[(idx % 6) as usize],
            })
        }
        232..=255 => {
            let gray = 8 + (idx - 232) * 10;
            rgb_to_pixel(Rgb {
                r: gray,
                g: gray,
                b: gray,
            })
        }
    }
}

/// Apply DIM flag - reduce brightness to 66%.
pub fn apply_dim(pixel: u32) -> u32 {
    let scale = |shift: u32| ((((pixel >> shift) & 0xff) * 66 / 100) << shift);
    (pixel & 0xff00_0000) | scale(16) | scale(8) | scale(0)
}

/// Get bright variant of a color.
///
/// Used when BOLD is set on one of the eight base colors.
pub fn get_bright_color(color: Color, term_colors: &TermColors, palette: &Palette) -> u32 {
    match color {
        Color::Named(named) if (named as usize) < 8 => {
            color_to_pixel(Color::Named(named.to_bright()), term_colors, palette)
        }
        Color::Indexed(idx) if idx < 8 => {
            color_to_pixel(Color::Indexed(idx + 8), term_colors, palette)
        }
        other => color_to_pixel(other, term_colors, palette),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    fn no_overrides() -> TermColors {
        TermColors::default()
    }

    #[test]
    fn test_rgb_to_pixel() {
        assert_eq!(rgb_to_pixel(Rgb { r: 0x12, g: 0x34, b: 0x56 }), 0xff123456);
    }

    #[test_case(NamedColor::Red, 0xffcd0000 ; "red")]
    #[test_case(NamedColor::BrightBlue, 0xff5c5cff ; "bright_blue")]
    #[test_case(NamedColor::Foreground, 0xffe5e5e5 ; "foreground")]
    #[test_case(NamedColor::Background, 0xff000000 ; "background")]
    fn test_named_colors(color: NamedColor, expected: u32) {
        assert_eq!(named_color_to_pixel(color, &Palette::default()), expected);
    }

    #[test]
    fn test_dim_named_color_dims_base() {
        let palette = Palette::default();
        assert_eq!(
            named_color_to_pixel(NamedColor::DimRed, &palette),
            apply_dim(palette.ansi[1])
        );
    }

    #[test_case(16, 0xff000000 ; "cube_origin")]
    #[test_case(21, 0xff0000ff ; "cube_blue")]
    #[test_case(196, 0xffff0000 ; "cube_red")]
    #[test_case(231, 0xffffffff ; "cube_white")]
    #[test_case(232, 0xff080808 ; "gray_first")]
    #[test_case(255, 0xffeeeeee ; "gray_last")]
    fn test_indexed_colors(idx: u8, expected: u32) {
        assert_eq!(indexed_color_to_pixel(idx, &Palette::default()), expected);
    }

    #[test]
    fn test_terminal_override_wins() {
        let mut colors = no_overrides();
        colors[NamedColor::Red] = Some(Rgb { r: 1, g: 2, b: 3 });
        let pixel = color_to_pixel(Color::Named(NamedColor::Red), &colors, &Palette::default());
        assert_eq!(pixel, 0xff010203);
    }

    #[test]
    fn test_truecolor_passes_through() {
        let color = Color::Spec(Rgb { r: 10, g: 20, b: 30 });
        assert_eq!(
            color_to_pixel(color, &no_overrides(), &Palette::default()),
            0xff0a141e
        );
    }

    #[test]
    fn test_bright_variant_for_base_colors() {
        let palette = Palette::default();
        let colors = no_overrides();
        assert_eq!(
            get_bright_color(Color::Named(NamedColor::Green), &colors, &palette),
            palette.ansi[10]
        );
        assert_eq!(
            get_bright_color(Color::Indexed(3), &colors, &palette),
            palette.ansi[11]
        );
        // Already-bright and non-base colors are unchanged.
        assert_eq!(
            get_bright_color(Color::Indexed(100), &colors, &palette),
            indexed_color_to_pixel(100, &palette)
        );
    }

    #[test]
    fn test_palette_rgb_slots() {
        let palette = Palette::default();
        assert_eq!(palette.rgb(1), Rgb { r: 0xcd, g: 0, b: 0 });
        assert_eq!(palette.rgb(256), pixel_to_rgb(palette.foreground));
        assert_eq!(palette.rgb(257), Rgb { r: 0, g: 0, b: 0 });
    }

    proptest! {
        /// Property: resolved colors are always opaque
        #[test]
        fn prop_indexed_colors_are_opaque(idx in any::<u8>()) {
            let pixel = indexed_color_to_pixel(idx, &Palette::default());
            prop_assert_eq!(pixel >> 24, 0xff);
        }

        /// Property: dimming never brightens a channel and keeps alpha
        #[test]
        fn prop_dim_never_brightens(pixel in any::<u32>()) {
            let dimmed = apply_dim(pixel);
            prop_assert_eq!(dimmed >> 24, pixel >> 24);
            for shift in [0u32, 8, 16] {
                prop_assert!((dimmed >> shift) & 0xff <= (pixel >> shift) & 0xff);
            }
        }

        /// Property: pixel/rgb conversion round-trips the color channels
        #[test]
        fn prop_rgb_pixel_round_trip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let rgb = Rgb { r, g, b };
            prop_assert_eq!(pixel_to_rgb(rgb_to_pixel(rgb)), rgb);
        }
    }
}
