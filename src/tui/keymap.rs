//! Declarative key table: key chords to review actions.
//!
//! The mark and navigation keys come from the settings file; everything else
//! is fixed. User bindings are looked up first, so they shadow the built-ins.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::mark::Mark;
use crate::navigator::Action;
use crate::settings::{KeyBindings, SettingsError, SettingsResult};

/// What a key press asks the review screen to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Nav(Action),
    OpenFilter,
    OpenExport,
    DismissNotice,
    ScrollUp,
    ScrollDown,
    WidenSidebar,
    NarrowSidebar,
    Quit,
}

/// A key plus the modifiers that matter for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self {
            code,
            modifiers: significant(modifiers),
        }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Shift is implied by the character itself (`<` vs `,`), so only Ctrl and
/// Alt take part in matching.
fn significant(modifiers: KeyModifiers) -> KeyModifiers {
    modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT)
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Alt+")?;
        }
        match self.code {
            KeyCode::Left => f.write_str("←"),
            KeyCode::Right => f.write_str("→"),
            KeyCode::Up => f.write_str("↑"),
            KeyCode::Down => f.write_str("↓"),
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Parse a key name from the settings file.
///
/// Accepts browser-style names (`ArrowLeft`), short names (`Left`, `PageUp`,
/// `Space`), single characters, and a `Ctrl+` or `Alt+` prefix.
pub fn parse_key(name: &str) -> Option<KeyChord> {
    let mut rest = name.trim();
    let mut modifiers = KeyModifiers::NONE;
    loop {
        let lower = rest.to_ascii_lowercase();
        if let Some(stripped) = lower.strip_prefix("ctrl+") {
            modifiers |= KeyModifiers::CONTROL;
            rest = &rest[rest.len() - stripped.len()..];
        } else if let Some(stripped) = lower.strip_prefix("alt+") {
            modifiers |= KeyModifiers::ALT;
            rest = &rest[rest.len() - stripped.len()..];
        } else {
            break;
        }
    }

    let code = match rest.to_ascii_lowercase().as_str() {
        "arrowleft" | "left" => KeyCode::Left,
        "arrowright" | "right" => KeyCode::Right,
        "arrowup" | "up" => KeyCode::Up,
        "arrowdown" | "down" => KeyCode::Down,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "insert" | "ins" => KeyCode::Insert,
        "space" | " " => KeyCode::Char(' '),
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(KeyChord::new(code, modifiers))
}

/// Ordered key table; the first matching chord wins.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(KeyChord, UiAction)>,
}

impl KeyMap {
    /// Build the table from the configured bindings plus the fixed keys.
    pub fn from_settings(keys: &KeyBindings) -> SettingsResult<Self> {
        let configured = [
            ("mark_a", &keys.mark_a, UiAction::Nav(Action::Mark(Mark::A))),
            ("mark_b", &keys.mark_b, UiAction::Nav(Action::Mark(Mark::B))),
            ("prev", &keys.prev, UiAction::Nav(Action::Previous)),
            ("next", &keys.next, UiAction::Nav(Action::Next)),
        ];

        let mut bindings = Vec::with_capacity(configured.len() + 12);
        for (action, key, ui) in configured {
            let chord = parse_key(key).ok_or_else(|| SettingsError::InvalidKey {
                action: action.to_string(),
                key: key.clone(),
            })?;
            bindings.push((chord, ui));
        }

        bindings.extend([
            (KeyChord::ctrl('s'), UiAction::Nav(Action::SaveMark)),
            (KeyChord::ctrl('c'), UiAction::Quit),
            (KeyChord::plain(KeyCode::Char('q')), UiAction::Quit),
            (KeyChord::plain(KeyCode::Char('r')), UiAction::Nav(Action::Refresh)),
            (KeyChord::plain(KeyCode::Char('f')), UiAction::OpenFilter),
            (KeyChord::plain(KeyCode::Char('e')), UiAction::OpenExport),
            (KeyChord::plain(KeyCode::Esc), UiAction::DismissNotice),
            (KeyChord::plain(KeyCode::PageUp), UiAction::ScrollUp),
            (KeyChord::plain(KeyCode::PageDown), UiAction::ScrollDown),
            (KeyChord::plain(KeyCode::Char('<')), UiAction::NarrowSidebar),
            (KeyChord::plain(KeyCode::Char('>')), UiAction::WidenSidebar),
        ]);
        Ok(Self { bindings })
    }

    pub fn lookup(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<UiAction> {
        let pressed = KeyChord::new(code, modifiers);
        self.bindings
            .iter()
            .find(|(chord, _)| *chord == pressed)
            .map(|(_, action)| *action)
    }

    /// First chord bound to `action`, for key hints.
    pub fn chord_for(&self, action: UiAction) -> Option<KeyChord> {
        self.bindings
            .iter()
            .find(|(_, a)| *a == action)
            .map(|(chord, _)| *chord)
    }

    /// One-line key summary for the status bar.
    pub fn hints(&self) -> String {
        let label = |action, name: &str| {
            self.chord_for(action)
                .map(|c| format!("{c} {name}"))
                .unwrap_or_default()
        };
        [
            label(UiAction::Nav(Action::Mark(Mark::A)), "A"),
            label(UiAction::Nav(Action::Mark(Mark::B)), "B"),
            label(UiAction::Nav(Action::Previous), "prev"),
            label(UiAction::Nav(Action::Next), "next"),
            label(UiAction::Nav(Action::SaveMark), "save"),
            label(UiAction::OpenFilter, "filter"),
            label(UiAction::OpenExport, "export"),
            label(UiAction::Quit, "quit"),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("  ")
    }
}
