//! Key chords and the command keybinding registry.
//!
//! Chords are written as `+`-separated strings such as `"ctrl+z"`,
//! `"shift+m"` or `"delete"`. Plugins register default bindings for their
//! commands; the configuration can override the chords of any command.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin::HandleId;
use crate::tool::{KeyEvent, KeyEventKind};

/// Failure to parse a chord string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("Empty key chord")]
    Empty,

    #[error("Unknown key '{0}'")]
    UnknownKey(String),

    #[error("Unknown modifier '{0}'")]
    UnknownModifier(String),
}

/// A key, independent of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Letter or digit, stored lowercase
    Char(char),
    Delete,
    Backspace,
    Escape,
    Enter,
    Space,
    Tab,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
}

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("delete", KeyCode::Delete),
    ("backspace", KeyCode::Backspace),
    ("escape", KeyCode::Escape),
    ("enter", KeyCode::Enter),
    ("space", KeyCode::Space),
    ("tab", KeyCode::Tab),
    ("left", KeyCode::ArrowLeft),
    ("right", KeyCode::ArrowRight),
    ("up", KeyCode::ArrowUp),
    ("down", KeyCode::ArrowDown),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
];

impl KeyCode {
    pub fn name(&self) -> String {
        match self {
            KeyCode::Char(c) => c.to_string(),
            other => NAMED_KEYS
                .iter()
                .find(|(_, k)| k == other)
                .map(|(name, _)| (*name).to_string())
                .unwrap_or_default(),
        }
    }
}

impl FromStr for KeyCode {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Ok(KeyCode::Char(c));
            }
        }
        NAMED_KEYS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, key)| *key)
            .ok_or_else(|| KeyParseError::UnknownKey(s.to_string()))
    }
}

/// Modifier key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }
}

/// A key together with the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyChord {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: KeyCode, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A chord without modifiers.
    pub fn key(key: KeyCode) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

impl FromStr for KeyChord {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
        let (key, modifier_names) = parts.split_last().ok_or(KeyParseError::Empty)?;

        let mut modifiers = Modifiers::NONE;
        for name in modifier_names {
            match name.to_ascii_lowercase().as_str() {
                "shift" => modifiers.shift = true,
                "ctrl" | "control" | "cmd" | "meta" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                _ => return Err(KeyParseError::UnknownModifier((*name).to_string())),
            }
        }
        Ok(Self::new(key.parse()?, modifiers))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key.name())
    }
}

impl TryFrom<String> for KeyChord {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyChord> for String {
    fn from(chord: KeyChord) -> Self {
        chord.to_string()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A default binding from a chord to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Keybinding {
    pub chord: KeyChord,
    pub command: String,
    /// Whether the command fires on press or release
    pub on: KeyEventKind,
}

impl Keybinding {
    pub fn press(chord: &str, command: &str) -> Result<Self, KeyParseError> {
        Ok(Self {
            chord: chord.parse()?,
            command: command.to_string(),
            on: KeyEventKind::Press,
        })
    }
}

/// All active keybindings, tagged with the registration that owns them.
#[derive(Debug, Clone, Default)]
pub struct KeybindingRegistry {
    entries: Vec<(HandleId, Keybinding)>,
    /// Configured chords that replace a command's defaults
    overrides: BTreeMap<String, Vec<KeyChord>>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: BTreeMap<String, Vec<KeyChord>>) -> Self {
        Self {
            entries: Vec::new(),
            overrides,
        }
    }

    pub fn register(&mut self, owner: HandleId, binding: Keybinding) {
        log::trace!("⌨️ Bind {} -> {}", binding.chord, binding.command);
        self.entries.push((owner, binding));
    }

    /// Remove every binding owned by `owner`. Returns how many were removed.
    pub fn release(&mut self, owner: HandleId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(o, _)| *o != owner);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Effective chords for a command, honoring overrides.
    pub fn chords_for(&self, command: &str) -> Vec<KeyChord> {
        if let Some(chords) = self.overrides.get(command) {
            return chords.clone();
        }
        self.entries
            .iter()
            .filter(|(_, b)| b.command == command)
            .map(|(_, b)| b.chord)
            .collect()
    }

    /// Command bound to this key event, if any. Later registrations win.
    pub fn command_for(&self, event: &KeyEvent) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .map(|(_, b)| b)
            .filter(|b| b.on == event.kind)
            .find(|b| match self.overrides.get(&b.command) {
                Some(chords) => chords.contains(&event.chord),
                None => b.chord == event.chord,
            })
            .map(|b| b.command.as_str())
    }
}
