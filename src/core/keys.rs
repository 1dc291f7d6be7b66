//! Key identifier classification.
//!
//! Key identifiers follow the DOM `KeyboardEvent.key` naming: printable keys
//! are their character (`"a"`, `"A"`, `" "`), named keys use their name
//! (`"Enter"`, `"Backspace"`, `"Shift"`).

/// Modifier keys. These never enter an event log.
pub const MODIFIER_KEYS: [&str; 5] = ["Shift", "Control", "Alt", "Meta", "CapsLock"];

/// Default terminating key. Its release finalizes a capture session.
pub const ENTER: &str = "Enter";

/// Key that removes the last typed character.
pub const BACKSPACE: &str = "Backspace";

/// Whether `key` is a modifier.
pub fn is_modifier(key: &str) -> bool {
    MODIFIER_KEYS.contains(&key)
}

/// The character a key produces when typed, if it produces exactly one.
pub fn printable_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers() {
        for key in MODIFIER_KEYS {
            assert!(is_modifier(key));
        }
        assert!(!is_modifier("a"));
        assert!(!is_modifier(ENTER));
        // Matching is exact
        assert!(!is_modifier("shift"));
    }

    #[test]
    fn test_printable_char() {
        assert_eq!(printable_char("a"), Some('a'));
        assert_eq!(printable_char(" "), Some(' '));
        assert_eq!(printable_char("é"), Some('é'));
        assert_eq!(printable_char(ENTER), None);
        assert_eq!(printable_char(""), None);
        assert_eq!(printable_char("\t"), None);
    }
}
