//! Hotkey system
//!
//! Centralized key binding for the section editor.
//!
//! # Architecture
//!
//! - **KeyChord**: A normalized (modifier set, key) pair
//! - **EditorCommand**: Enum of all actions a chord can trigger
//! - **bindings()**: The lookup table from chord to command
//! - **handle_hotkey()**: Dispatch that applies context rules to the lookup
//!
//! # Adding New Hotkeys
//!
//! 1. Add a variant to `EditorCommand`
//! 2. Add the chord in `bindings()`
//! 3. Handle the command in `EditSession::execute()`

use std::collections::HashMap;
use std::sync::OnceLock;

/// All actions that can be triggered from the keyboard.
///
/// Each variant is a semantic command, not a key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    /// Restore the previous timeline snapshot
    Undo,
    /// Increase pixels per page
    ZoomIn,
    /// Decrease pixels per page
    ZoomOut,
    /// Split the section under the cursor
    Split,
    /// Start renaming the section under the cursor
    Rename,
    /// Delete the section under the cursor
    DeleteActive,
    /// Move the cursor one page left
    NavigateLeft,
    /// Move the cursor one page right
    NavigateRight,
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// A key, normalized so that letters are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    ArrowLeft,
    ArrowRight,
    Delete,
    Backspace,
}

impl Key {
    /// Parse a key name such as `S`, `KeyS`, `ArrowLeft` or `+`.
    pub fn parse(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "arrowleft" | "left" => Key::ArrowLeft,
            "arrowright" | "right" => Key::ArrowRight,
            "delete" | "del" => Key::Delete,
            "backspace" => Key::Backspace,
            "space" => Key::Char(' '),
            lower => {
                let code = lower.strip_prefix("key").filter(|rest| rest.chars().count() == 1);
                let mut chars = code.unwrap_or(lower).chars();
                let first = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Key::Char(first)
            }
        };
        Some(key)
    }

    fn is_character(self) -> bool {
        matches!(self, Key::Char(_))
    }
}

/// A normalized key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl KeyChord {
    pub const fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse chord text like `Shift+S`, `Shift++`, `Ctrl+Alt+Delete` or `ArrowRight`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut modifiers = Modifiers::NONE;
        let mut rest = text.trim();

        loop {
            let Some((head, tail)) = rest.split_once('+') else {
                break;
            };
            if tail.is_empty() {
                break;
            }
            match head.to_ascii_lowercase().as_str() {
                "shift" => modifiers.shift = true,
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => break,
            }
            rest = tail;
        }

        Some(Self::new(modifiers, Key::parse(rest)?))
    }
}

/// Context information that affects which hotkeys are active.
#[derive(Debug, Clone, Default)]
pub struct HotkeyContext {
    /// Whether a section sits under the cursor
    pub has_active_section: bool,
    /// Whether a text input has focus (suppresses all hotkeys)
    pub input_focused: bool,
}

/// Result of processing a key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyResult {
    /// A command was matched and should be executed
    Action(EditorCommand),
    /// No binding for this chord/context combination
    NoMatch,
    /// A binding exists but input focus suppresses it
    Suppressed,
}

/// Chord to command lookup table.
pub fn bindings() -> &'static HashMap<KeyChord, EditorCommand> {
    static BINDINGS: OnceLock<HashMap<KeyChord, EditorCommand>> = OnceLock::new();
    BINDINGS.get_or_init(|| {
        use EditorCommand::*;
        HashMap::from([
            (KeyChord::new(Modifiers::SHIFT, Key::Char('u')), Undo),
            (KeyChord::new(Modifiers::SHIFT, Key::Char('+')), ZoomIn),
            (KeyChord::new(Modifiers::SHIFT, Key::Char('=')), ZoomIn),
            (KeyChord::new(Modifiers::SHIFT, Key::Char('-')), ZoomOut),
            (KeyChord::new(Modifiers::SHIFT, Key::Char('_')), ZoomOut),
            (KeyChord::new(Modifiers::SHIFT, Key::Char('s')), Split),
            (KeyChord::new(Modifiers::SHIFT, Key::Char('r')), Rename),
            (KeyChord::new(Modifiers::NONE, Key::Delete), DeleteActive),
            (KeyChord::new(Modifiers::NONE, Key::Backspace), DeleteActive),
            (KeyChord::new(Modifiers::NONE, Key::ArrowLeft), NavigateLeft),
            (KeyChord::new(Modifiers::NONE, Key::ArrowRight), NavigateRight),
        ])
    })
}

/// Maps a chord to a command, considering the current context.
///
/// Non-character keys (arrows, delete) match regardless of held modifiers.
pub fn handle_hotkey(chord: KeyChord, context: &HotkeyContext) -> HotkeyResult {
    let table = bindings();
    let command = table.get(&chord).copied().or_else(|| {
        if chord.key.is_character() {
            None
        } else {
            table.get(&KeyChord::new(Modifiers::NONE, chord.key)).copied()
        }
    });

    let Some(command) = command else {
        return HotkeyResult::NoMatch;
    };

    if context.input_focused {
        return HotkeyResult::Suppressed;
    }

    if command == EditorCommand::DeleteActive && !context.has_active_section {
        return HotkeyResult::NoMatch;
    }

    HotkeyResult::Action(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(text: &str) -> HotkeyResult {
        let ctx = HotkeyContext {
            has_active_section: true,
            ..Default::default()
        };
        handle_hotkey(KeyChord::parse(text).unwrap(), &ctx)
    }

    #[test]
    fn test_shift_s_splits() {
        assert_eq!(dispatch("Shift+S"), HotkeyResult::Action(EditorCommand::Split));
        assert_eq!(dispatch("Shift+KeyS"), HotkeyResult::Action(EditorCommand::Split));
    }

    #[test]
    fn test_zoom_chords() {
        assert_eq!(dispatch("Shift++"), HotkeyResult::Action(EditorCommand::ZoomIn));
        assert_eq!(dispatch("Shift+="), HotkeyResult::Action(EditorCommand::ZoomIn));
        assert_eq!(dispatch("Shift+-"), HotkeyResult::Action(EditorCommand::ZoomOut));
        assert_eq!(dispatch("Shift+_"), HotkeyResult::Action(EditorCommand::ZoomOut));
    }

    #[test]
    fn test_undo_and_rename() {
        assert_eq!(dispatch("shift+u"), HotkeyResult::Action(EditorCommand::Undo));
        assert_eq!(dispatch("Shift+R"), HotkeyResult::Action(EditorCommand::Rename));
    }

    #[test]
    fn test_unshifted_letter_does_nothing() {
        assert_eq!(dispatch("S"), HotkeyResult::NoMatch);
        assert_eq!(dispatch("Ctrl+Shift+S"), HotkeyResult::NoMatch);
    }

    #[test]
    fn test_arrows_ignore_modifiers() {
        assert_eq!(dispatch("ArrowLeft"), HotkeyResult::Action(EditorCommand::NavigateLeft));
        assert_eq!(
            dispatch("Shift+ArrowRight"),
            HotkeyResult::Action(EditorCommand::NavigateRight)
        );
    }

    #[test]
    fn test_delete_requires_active_section() {
        let chord = KeyChord::parse("Delete").unwrap();
        assert_eq!(
            handle_hotkey(chord, &HotkeyContext::default()),
            HotkeyResult::NoMatch
        );
        assert_eq!(dispatch("Backspace"), HotkeyResult::Action(EditorCommand::DeleteActive));
    }

    #[test]
    fn test_suppressed_when_input_focused() {
        let ctx = HotkeyContext {
            input_focused: true,
            has_active_section: true,
        };
        let chord = KeyChord::parse("Shift+S").unwrap();
        assert_eq!(handle_hotkey(chord, &ctx), HotkeyResult::Suppressed);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(KeyChord::parse("Shift+Banana").is_none());
        assert!(KeyChord::parse("").is_none());
    }
}
