//! Platform-independent key events and vim key notation.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Backspace,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Other,
}

impl Key {
    pub fn is_arrow(&self) -> bool {
        matches!(self, Key::Left | Key::Right | Key::Up | Key::Down)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        meta: false,
        shift: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Shift alone never makes a key a host shortcut.
    pub fn has_system_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn char(ch: char) -> Self {
        Self::plain(Key::Char(ch))
    }

    pub fn ctrl(ch: char) -> Self {
        Self::new(Key::Char(ch), Modifiers::CTRL)
    }

    /// The redo shortcut is the one modified key normal mode consumes.
    pub fn is_redo_shortcut(&self) -> bool {
        self.modifiers.ctrl
            && !self.modifiers.alt
            && !self.modifiers.meta
            && matches!(self.key, Key::Char('r') | Key::Char('R'))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyNotationError {
    #[error("unterminated key name starting at byte {offset}")]
    Unterminated { offset: usize },
    #[error("unknown key name <{name}>")]
    UnknownName { name: String },
}

/// Parses vim-style notation such as `ciw<Esc>` or `<C-r>` into key events.
pub fn parse_keys(notation: &str) -> Result<Vec<KeyEvent>, KeyNotationError> {
    let mut events = Vec::new();
    let mut rest = notation;
    let mut offset = 0usize;

    while let Some(ch) = rest.chars().next() {
        if ch != '<' {
            events.push(KeyEvent::char(ch));
            rest = &rest[ch.len_utf8()..];
            offset += ch.len_utf8();
            continue;
        }
        let Some(close) = rest.find('>') else {
            return Err(KeyNotationError::Unterminated { offset });
        };
        let name = &rest[1..close];
        events.push(parse_named_key(name)?);
        rest = &rest[close + 1..];
        offset += close + 1;
    }

    Ok(events)
}

fn parse_named_key(name: &str) -> Result<KeyEvent, KeyNotationError> {
    let unknown = || KeyNotationError::UnknownName {
        name: name.to_string(),
    };
    let lower = name.to_ascii_lowercase();
    let event = match lower.as_str() {
        "esc" | "escape" => KeyEvent::plain(Key::Escape),
        "cr" | "enter" | "return" => KeyEvent::plain(Key::Enter),
        "bs" | "backspace" => KeyEvent::plain(Key::Backspace),
        "tab" => KeyEvent::plain(Key::Tab),
        "left" => KeyEvent::plain(Key::Left),
        "right" => KeyEvent::plain(Key::Right),
        "up" => KeyEvent::plain(Key::Up),
        "down" => KeyEvent::plain(Key::Down),
        "lt" => KeyEvent::char('<'),
        "space" => KeyEvent::char(' '),
        _ => {
            let (prefix, key_name) = name.split_once('-').ok_or_else(unknown)?;
            let mut chars = key_name.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                return Err(unknown());
            };
            let modifiers = match prefix.to_ascii_lowercase().as_str() {
                "c" => Modifiers::CTRL,
                "a" | "m" => Modifiers::ALT,
                "d" => Modifiers::META,
                _ => return Err(unknown()),
            };
            KeyEvent::new(Key::Char(ch), modifiers)
        }
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keys_should_split_plain_chars() {
        let keys = parse_keys("ciw").expect("parse");
        assert_eq!(
            keys,
            vec![KeyEvent::char('c'), KeyEvent::char('i'), KeyEvent::char('w')]
        );
    }

    #[test]
    fn parse_keys_should_map_named_and_modified_keys() {
        let keys = parse_keys("a<Esc><C-r><lt><D-s>").expect("parse");
        assert_eq!(
            keys,
            vec![
                KeyEvent::char('a'),
                KeyEvent::plain(Key::Escape),
                KeyEvent::ctrl('r'),
                KeyEvent::char('<'),
                KeyEvent::new(Key::Char('s'), Modifiers::META),
            ]
        );
    }

    #[test]
    fn parse_keys_should_reject_bad_names() {
        assert_eq!(
            parse_keys("x<Nope>"),
            Err(KeyNotationError::UnknownName {
                name: "Nope".to_string()
            })
        );
        assert_eq!(
            parse_keys("ab<Esc"),
            Err(KeyNotationError::Unterminated { offset: 2 })
        );
    }

    #[test]
    fn redo_shortcut_should_require_plain_ctrl() {
        assert!(KeyEvent::ctrl('r').is_redo_shortcut());
        assert!(!KeyEvent::char('r').is_redo_shortcut());
        assert!(
            !KeyEvent::new(
                Key::Char('r'),
                Modifiers {
                    ctrl: true,
                    meta: true,
                    ..Modifiers::NONE
                }
            )
            .is_redo_shortcut()
        );
    }

    #[test]
    fn shift_should_not_count_as_system_modifier() {
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        assert!(!shift.has_system_modifier());
        assert!(Modifiers::ALT.has_system_modifier());
    }
}
