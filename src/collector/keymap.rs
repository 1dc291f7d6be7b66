//! macOS virtual keycode to key identifier mapping (US ANSI layout).
//!
//! Identifiers follow the DOM `KeyboardEvent.key` names used by the capture
//! core. [`key_for_keycode`] gives the unshifted identifier;
//! [`KeyTracker`] applies Shift and Caps Lock at press time and hands the
//! same identifier back on release.

use std::collections::HashMap;

/// Key identifier for a macOS virtual keycode.
pub fn key_for_keycode(keycode: i64) -> Option<&'static str> {
    let key = match keycode {
        0 => "a",
        1 => "s",
        2 => "d",
        3 => "f",
        4 => "h",
        5 => "g",
        6 => "z",
        7 => "x",
        8 => "c",
        9 => "v",
        11 => "b",
        12 => "q",
        13 => "w",
        14 => "e",
        15 => "r",
        16 => "y",
        17 => "t",
        18 => "1",
        19 => "2",
        20 => "3",
        21 => "4",
        22 => "6",
        23 => "5",
        24 => "=",
        25 => "9",
        26 => "7",
        27 => "-",
        28 => "8",
        29 => "0",
        30 => "]",
        31 => "o",
        32 => "u",
        33 => "[",
        34 => "i",
        35 => "p",
        36 => "Enter",
        37 => "l",
        38 => "j",
        39 => "'",
        40 => "k",
        41 => ";",
        42 => "\\",
        43 => ",",
        44 => "/",
        45 => "n",
        46 => "m",
        47 => ".",
        48 => "Tab",
        49 => " ",
        50 => "`",
        51 => "Backspace",
        53 => "Escape",
        54 | 55 => "Meta",
        56 | 60 => "Shift",
        57 => "CapsLock",
        58 | 61 => "Alt",
        59 | 62 => "Control",
        // Keypad Enter terminates like Return
        76 => "Enter",
        117 => "Delete",
        123 => "ArrowLeft",
        124 => "ArrowRight",
        125 => "ArrowDown",
        126 => "ArrowUp",
        _ => return None,
    };
    Some(key)
}

/// Identifier of `keycode` with the given modifier state applied.
///
/// Caps Lock only affects letters; Shift also selects the upper symbol of
/// digit and punctuation keys. Named keys are unaffected.
pub fn typed_key(keycode: i64, shift: bool, caps_lock: bool) -> Option<String> {
    let key = key_for_keycode(keycode)?;
    let mut chars = key.chars();
    let c = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Some(key.to_string()),
    };

    let typed = if c.is_ascii_alphabetic() {
        if shift != caps_lock {
            c.to_ascii_uppercase()
        } else {
            c
        }
    } else if shift {
        shifted_symbol(c)
    } else {
        c
    };
    Some(typed.to_string())
}

fn shifted_symbol(c: char) -> char {
    match c {
        '1' => '!',
        '2' => '@',
        '3' => '#',
        '4' => '$',
        '5' => '%',
        '6' => '^',
        '7' => '&',
        '8' => '*',
        '9' => '(',
        '0' => ')',
        '-' => '_',
        '=' => '+',
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        ';' => ':',
        '\'' => '"',
        ',' => '<',
        '.' => '>',
        '/' => '?',
        '`' => '~',
        other => other,
    }
}

/// Resolves live keycodes to identifiers while keys are held.
///
/// A press takes its identifier from the modifier state at that moment and
/// keeps it until release, so `"H"` pressed with Shift is released as `"H"`
/// even when Shift goes up first. Auto-repeat presses reuse the held
/// identifier.
#[derive(Debug, Default)]
pub struct KeyTracker {
    held: HashMap<i64, String>,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, keycode: i64, shift: bool, caps_lock: bool) -> Option<String> {
        if let Some(key) = self.held.get(&keycode) {
            return Some(key.clone());
        }
        let key = typed_key(keycode, shift, caps_lock)?;
        self.held.insert(keycode, key.clone());
        Some(key)
    }

    pub fn release(&mut self, keycode: i64, shift: bool, caps_lock: bool) -> Option<String> {
        match self.held.remove(&keycode) {
            Some(key) => Some(key),
            None => typed_key(keycode, shift, caps_lock),
        }
    }
}
