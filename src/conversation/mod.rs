// Conversation state machine
//
// Tracks which free-text answer each user owes us (watermark text, custom color,
// custom size). Idle users have no entry. The table is shared across tasks. An
// answer is checked and, if accepted, removed under one lock, so two concurrent
// messages from the same user cannot both consume the state and a rejected
// answer never leaves the user looking idle.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

use regex::Regex;

use crate::error::Result;
use crate::settings::{SettingsStore, UserId};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

/// Which input a user is expected to type next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingInput {
    Text,
    Color,
    Size,
}

impl PendingInput {
    /// Prompt shown when the state is entered.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Text => "Send your watermark text:",
            Self::Color => "Send hex color (e.g., #FF0000):",
            Self::Size => "Send size in px (e.g., 24):",
        }
    }
}

/// Per-user pending-input table.
#[derive(Debug, Default)]
pub struct SessionTable {
    states: Mutex<HashMap<UserId, PendingInput>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, PendingInput>> {
        // A panic elsewhere cannot leave the map half-updated
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, user: UserId) -> Option<PendingInput> {
        self.lock().get(&user).copied()
    }

    /// Last write wins.
    pub fn set(&self, user: UserId, state: PendingInput) {
        self.lock().insert(user, state);
    }

    pub fn clear(&self, user: UserId) -> Option<PendingInput> {
        self.lock().remove(&user)
    }

    /// Run `decide` on the user's state while holding the lock. The entry is
    /// removed only when `decide` reports the answer as accepted; otherwise the
    /// user stays in the same state throughout.
    pub fn resolve<T>(
        &self,
        user: UserId,
        decide: impl FnOnce(PendingInput) -> (T, bool),
    ) -> Option<T> {
        let mut states = self.lock();
        let state = *states.get(&user)?;
        let (result, accepted) = decide(state);
        if accepted {
            states.remove(&user);
        }
        Some(result)
    }

    /// Put a state back unless a newer one was set in the meantime.
    pub fn restore(&self, user: UserId, state: PendingInput) {
        self.lock().entry(user).or_insert(state);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Why a typed answer was refused. The state is kept so the user can retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    InvalidColor,
    InvalidSize,
}

impl InputRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidColor => "Invalid hex. Try again.",
            Self::InvalidSize => "Invalid number. Try again.",
        }
    }
}

/// Result of feeding a text message to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    TextSet(String),
    ColorSet(String),
    SizeSet(u32),
    Rejected(InputRejection),
}

impl InputOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::TextSet(_) => "Text set!".to_string(),
            Self::ColorSet(_) => "Color set!".to_string(),
            Self::SizeSet(size) => format!("Size set to {}px!", size),
            Self::Rejected(reason) => reason.message().to_string(),
        }
    }
}

/// True for "#" followed by exactly six hex digits.
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// Parse a font size typed by the user. Must be a positive integer.
pub fn parse_font_size(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|size| *size > 0)
}

/// Check a typed answer against the state that asked for it.
fn evaluate(state: PendingInput, text: &str) -> InputOutcome {
    match state {
        PendingInput::Text => InputOutcome::TextSet(text.to_string()),
        PendingInput::Color => {
            let color = text.trim();
            if is_hex_color(color) {
                InputOutcome::ColorSet(color.to_string())
            } else {
                InputOutcome::Rejected(InputRejection::InvalidColor)
            }
        }
        PendingInput::Size => match parse_font_size(text) {
            Some(size) => InputOutcome::SizeSet(size),
            None => InputOutcome::Rejected(InputRejection::InvalidSize),
        },
    }
}

/// The conversation component: owns the session table and applies answers.
#[derive(Debug, Default)]
pub struct Conversation {
    sessions: SessionTable,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Enter an awaiting state (menu action asked for free text).
    pub fn begin(&self, user: UserId, state: PendingInput) {
        self.sessions.set(user, state);
    }

    /// Feed a free-text message. Returns None when the user is idle, leaving the
    /// message for other handlers.
    pub fn handle_text(
        &self,
        store: &dyn SettingsStore,
        user: UserId,
        text: &str,
    ) -> Result<Option<InputOutcome>> {
        let resolved = self.sessions.resolve(user, |state| {
            let outcome = evaluate(state, text);
            let accepted = !matches!(outcome, InputOutcome::Rejected(_));
            ((state, outcome), accepted)
        });
        let Some((state, outcome)) = resolved else {
            return Ok(None);
        };

        if let InputOutcome::Rejected(reason) = outcome {
            log::debug!("User {} input rejected: {:?}", user, reason);
            return Ok(Some(outcome));
        }

        let applied = store.update_text_settings(user, &|settings| match &outcome {
            InputOutcome::TextSet(t) => settings.text = t.clone(),
            InputOutcome::ColorSet(c) => settings.color = c.clone(),
            InputOutcome::SizeSet(s) => settings.font_size = *s,
            InputOutcome::Rejected(_) => {}
        });

        if let Err(e) = applied {
            // Keep the question open so the user can answer again
            self.sessions.restore(user, state);
            return Err(e);
        }

        Ok(Some(outcome))
    }
}
