// Per-user watermark settings and the store contract
// Two records per user: placement (anchor + image scale) and text overlay.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FONT_SIZE, DEFAULT_POSITION_KEY, DEFAULT_SCALE_PERCENT, DEFAULT_TEXT_COLOR,
};
use crate::error::Result;

pub type UserId = i64;

/// One of nine symbolic screen positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    #[default]
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// All anchors in grid order (row by row, top to bottom).
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::MiddleCenter,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Short key used in storage and button payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopCenter => "tc",
            Self::TopRight => "tr",
            Self::MiddleLeft => "ml",
            Self::MiddleCenter => "mc",
            Self::MiddleRight => "mr",
            Self::BottomLeft => "bl",
            Self::BottomCenter => "bc",
            Self::BottomRight => "br",
        }
    }

    /// Parse a short key. Returns None for unknown keys.
    pub fn parse_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.key() == key)
    }

    /// Parse a short key, failing closed to the center anchor.
    pub fn from_key(key: &str) -> Self {
        Self::parse_key(key).unwrap_or_default()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TopLeft => "Top Left",
            Self::TopCenter => "Top Center",
            Self::TopRight => "Top Right",
            Self::MiddleLeft => "Middle Left",
            Self::MiddleCenter => "Center",
            Self::MiddleRight => "Middle Right",
            Self::BottomLeft => "Bottom Left",
            Self::BottomCenter => "Bottom Center",
            Self::BottomRight => "Bottom Right",
        }
    }
}

/// Where the overlay goes and how large the image watermark is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub anchor: Anchor,
    /// Image watermark size as a percentage of the video frame (1-100).
    pub scale_percent: u32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            anchor: Anchor::from_key(DEFAULT_POSITION_KEY),
            scale_percent: DEFAULT_SCALE_PERCENT,
        }
    }
}

/// Text overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSettings {
    pub text: String,
    /// Named color ("white") or "#RRGGBB"
    pub color: String,
    pub font_size: u32,
    pub enabled: bool,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: DEFAULT_TEXT_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            enabled: false,
        }
    }
}

impl TextSettings {
    /// True when the text overlay should be drawn.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.text.is_empty()
    }
}

/// Persistent per-user settings. Getters return defaults for unknown users.
pub trait SettingsStore: Send + Sync {
    fn get_placement(&self, user: UserId) -> Result<Placement>;
    fn set_placement(&self, user: UserId, placement: &Placement) -> Result<()>;
    fn get_text_settings(&self, user: UserId) -> Result<TextSettings>;
    fn set_text_settings(&self, user: UserId, settings: &TextSettings) -> Result<()>;

    /// Overwrite both records with defaults.
    fn reset_user(&self, user: UserId) -> Result<()> {
        self.set_placement(user, &Placement::default())?;
        self.set_text_settings(user, &TextSettings::default())
    }

    /// Read-modify-write helper for text settings.
    fn update_text_settings(&self, user: UserId, f: &dyn Fn(&mut TextSettings)) -> Result<TextSettings> {
        let mut settings = self.get_text_settings(user)?;
        f(&mut settings);
        self.set_text_settings(user, &settings)?;
        Ok(settings)
    }

    /// Read-modify-write helper for placement.
    fn update_placement(&self, user: UserId, f: &dyn Fn(&mut Placement)) -> Result<Placement> {
        let mut placement = self.get_placement(user)?;
        f(&mut placement);
        self.set_placement(user, &placement)?;
        Ok(placement)
    }
}
