//! Keyboard events and their byte encoding.
//!
//! Keys are identified by X11-style keysyms. Printable keys use their
//! character code; everything else lives in the `0xff00` page.

use termwiz::input::{KeyCode, KeyCodeEncodeModes, KeyboardEncoding, Modifiers};

/// Keysyms produced by the on-screen keyboard.
pub mod keysym {
    pub const BACKSPACE: u32 = 0x7f;
    pub const TAB: u32 = 0xff09;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const LEFT: u32 = 0xff51;
    pub const UP: u32 = 0xff52;
    pub const RIGHT: u32 = 0xff53;
    pub const DOWN: u32 = 0xff54;
    pub const SHIFT_L: u32 = 0xffe1;
    pub const SHIFT_R: u32 = 0xffe2;
    pub const CONTROL_L: u32 = 0xffe3;
    pub const ALT_L: u32 = 0xffe9;
}

/// Which sticky modifier a keysym toggles, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
}

impl Modifier {
    pub fn from_keysym(sym: u32) -> Option<Self> {
        match sym {
            keysym::SHIFT_L | keysym::SHIFT_R => Some(Self::Shift),
            keysym::CONTROL_L => Some(Self::Control),
            keysym::ALT_L => Some(Self::Alt),
            _ => None,
        }
    }
}

/// Active modifier flags carried by a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMods {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyMods {
    pub fn is_active(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Shift => self.shift,
            Modifier::Control => self.ctrl,
            Modifier::Alt => self.alt,
        }
    }

    pub fn toggle(&mut self, modifier: Modifier) {
        let flag = match modifier {
            Modifier::Shift => &mut self.shift,
            Modifier::Control => &mut self.ctrl,
            Modifier::Alt => &mut self.alt,
        };
        *flag = !*flag;
    }

    fn to_termwiz(self) -> Modifiers {
        let mut tm = Modifiers::NONE;
        if self.shift {
            tm |= Modifiers::SHIFT;
        }
        if self.alt {
            tm |= Modifiers::ALT;
        }
        if self.ctrl {
            tm |= Modifiers::CTRL;
        }
        tm
    }
}

/// A key press forwarded to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub keysym: u32,
    pub mods: KeyMods,
    /// The character for symbols below 0x100.
    pub literal: Option<char>,
}

impl KeyInput {
    pub fn new(keysym: u32, mods: KeyMods) -> Self {
        let literal = if keysym < 0x100 {
            char::from_u32(keysym)
        } else {
            None
        };
        Self {
            keysym,
            mods,
            literal,
        }
    }

    fn keycode(&self) -> Option<KeyCode> {
        match self.keysym {
            keysym::BACKSPACE => Some(KeyCode::Backspace),
            keysym::TAB => Some(KeyCode::Tab),
            keysym::RETURN => Some(KeyCode::Enter),
            keysym::ESCAPE => Some(KeyCode::Escape),
            keysym::LEFT => Some(KeyCode::LeftArrow),
            keysym::UP => Some(KeyCode::UpArrow),
            keysym::RIGHT => Some(KeyCode::RightArrow),
            keysym::DOWN => Some(KeyCode::DownArrow),
            _ => self.literal.map(KeyCode::Char),
        }
    }

    /// Encode as the bytes an xterm would send.
    ///
    /// Shift is already folded into printable symbols, so it is dropped for
    /// them (and for Enter/Escape/Backspace, which shells expect plain).
    /// Control lowers letters so Ctrl+A is 0x01 regardless of shift.
    pub fn encode(&self, application_cursor_keys: bool) -> Option<String> {
        let key = self.keycode()?;
        let mut mods = self.mods;
        let key = match key {
            KeyCode::Char(c) => {
                mods.shift = false;
                if mods.ctrl && c.is_ascii_uppercase() {
                    KeyCode::Char(c.to_ascii_lowercase())
                } else {
                    KeyCode::Char(c)
                }
            }
            KeyCode::Enter | KeyCode::Escape | KeyCode::Backspace => {
                mods.shift = false;
                key
            }
            other => other,
        };

        let modes = KeyCodeEncodeModes {
            encoding: KeyboardEncoding::Xterm,
            application_cursor_keys,
            newline_mode: false,
            modify_other_keys: None,
        };
        match key.encode(mods.to_termwiz(), modes, true) {
            Ok(seq) if !seq.is_empty() => Some(seq),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Failed to encode keysym {:#x}: {}", self.keysym, e);
                None
            }
        }
    }
}
