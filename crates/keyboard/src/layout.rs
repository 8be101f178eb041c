//! The compiled-in key table.

use settings::constants::keyboard::{COLS, ROWS};
use terminal::keysym;

/// One key: labels and symbols for the unshifted and shifted states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub label: &'static str,
    pub shift_label: &'static str,
    pub sym: u32,
    pub shift_sym: u32,
}

impl Key {
    const fn new(label: &'static str, shift_label: &'static str, sym: u32, shift_sym: u32) -> Self {
        Self {
            label,
            shift_label,
            sym,
            shift_sym,
        }
    }

    /// A key that types the same thing shifted or not.
    const fn fixed(label: &'static str, sym: u32) -> Self {
        Self::new(label, label, sym, sym)
    }

    /// A printable key whose labels are its characters.
    const fn ch(label: &'static str, shift_label: &'static str) -> Self {
        Self::new(
            label,
            shift_label,
            label.as_bytes()[0] as u32,
            shift_label.as_bytes()[0] as u32,
        )
    }

    pub fn label(&self, shifted: bool) -> &'static str {
        if shifted {
            self.shift_label
        } else {
            self.label
        }
    }

    pub fn sym(&self, shifted: bool) -> u32 {
        if shifted {
            self.shift_sym
        } else {
            self.sym
        }
    }
}

/// Row and column of the double-width space bar.
pub const WIDE_KEY: (usize, usize) = (4, 5);
/// The cell covered by the space bar's second half. Never drawn.
pub const HIDDEN_KEY: (usize, usize) = (4, 6);

#[rustfmt::skip]
pub static LAYOUT: [[Key; COLS]; ROWS] = [
    [
        Key::fixed("Esc", keysym::ESCAPE),
        Key::ch("1", "!"), Key::ch("2", "@"), Key::ch("3", "#"), Key::ch("4", "$"),
        Key::ch("5", "%"), Key::ch("6", "^"), Key::ch("7", "&"), Key::ch("8", "*"),
        Key::ch("9", "("), Key::ch("0", ")"),
        Key::fixed("Bksp", keysym::BACKSPACE),
    ],
    [
        Key::fixed("Tab", keysym::TAB),
        Key::ch("q", "Q"), Key::ch("w", "W"), Key::ch("e", "E"), Key::ch("r", "R"),
        Key::ch("t", "T"), Key::ch("y", "Y"), Key::ch("u", "U"), Key::ch("i", "I"),
        Key::ch("o", "O"), Key::ch("p", "P"), Key::ch("\\", "|"),
    ],
    [
        Key::fixed("Ctrl", keysym::CONTROL_L),
        Key::ch("a", "A"), Key::ch("s", "S"), Key::ch("d", "D"), Key::ch("f", "F"),
        Key::ch("g", "G"), Key::ch("h", "H"), Key::ch("j", "J"), Key::ch("k", "K"),
        Key::ch("l", "L"), Key::ch(";", ":"),
        Key::fixed("Ent", keysym::RETURN),
    ],
    [
        Key::fixed("Shft", keysym::SHIFT_L),
        Key::ch("z", "Z"), Key::ch("x", "X"), Key::ch("c", "C"), Key::ch("v", "V"),
        Key::ch("b", "B"), Key::ch("n", "N"), Key::ch("m", "M"), Key::ch(",", "<"),
        Key::ch(".", ">"), Key::ch("/", "?"),
        Key::fixed("Shft", keysym::SHIFT_R),
    ],
    [
        Key::fixed("Alt", keysym::ALT_L),
        Key::ch("-", "_"), Key::ch("=", "+"), Key::ch("[", "{"), Key::ch("]", "}"),
        Key::fixed("Space", ' ' as u32),
        Key::fixed("", ' ' as u32),
        Key::ch("'", "\""),
        Key::fixed("Up", keysym::UP), Key::fixed("Dn", keysym::DOWN),
        Key::fixed("Lt", keysym::LEFT), Key::fixed("Rt", keysym::RIGHT),
    ],
];
