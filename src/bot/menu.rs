// Button menus and the callback payload protocol

use serde::{Deserialize, Serialize};

use crate::constants::{PRESET_FONT_SIZES, PRESET_SCALES};
use crate::settings::{Anchor, Placement, TextSettings};

/// Colors offered as one-tap buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPreset {
    White,
    Black,
    Red,
    Blue,
}

impl ColorPreset {
    pub const ALL: [ColorPreset; 4] = [Self::White, Self::Black, Self::Red, Self::Blue];

    fn key(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
            Self::Red => "Red",
            Self::Blue => "Blue",
        }
    }

    /// Value written to the text settings.
    pub fn color_value(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Red => "#FF0000",
            Self::Blue => "#0000FF",
        }
    }
}

/// A parsed button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddWatermark,
    Settings,
    Back,
    SetText,
    SetColor,
    ColorPreset(ColorPreset),
    ColorCustom,
    SetSize,
    SizePreset(u32),
    SizeCustom,
    ToggleText,
    SetPosition,
    Position(Anchor),
    SetScale,
    Scale(u32),
    RemoveImage,
}

impl MenuAction {
    /// Parse a payload. Unknown or malformed payloads give None.
    pub fn parse(payload: &str) -> Option<Self> {
        let action = match payload {
            "add_wm" => Self::AddWatermark,
            "settings" => Self::Settings,
            "back" => Self::Back,
            "set_text" => Self::SetText,
            "set_color" => Self::SetColor,
            "color_custom" => Self::ColorCustom,
            "set_size" => Self::SetSize,
            "size_custom" => Self::SizeCustom,
            "toggle_text" => Self::ToggleText,
            "set_position" => Self::SetPosition,
            "set_scale" => Self::SetScale,
            "remove_wm" => Self::RemoveImage,
            other => return Self::parse_valued(other),
        };
        Some(action)
    }

    fn parse_valued(payload: &str) -> Option<Self> {
        let (prefix, value) = payload.split_once('_')?;
        match prefix {
            "color" => ColorPreset::from_key(value).map(Self::ColorPreset),
            "size" => value.parse::<u32>().ok().filter(|s| *s > 0).map(Self::SizePreset),
            "pos" => Anchor::parse_key(value).map(Self::Position),
            "scale" => value
                .parse::<u32>()
                .ok()
                .filter(|s| (1..=100).contains(s))
                .map(Self::Scale),
            _ => None,
        }
    }

    /// Payload string for this action.
    pub fn payload(&self) -> String {
        match self {
            Self::AddWatermark => "add_wm".to_string(),
            Self::Settings => "settings".to_string(),
            Self::Back => "back".to_string(),
            Self::SetText => "set_text".to_string(),
            Self::SetColor => "set_color".to_string(),
            Self::ColorPreset(c) => format!("color_{}", c.key()),
            Self::ColorCustom => "color_custom".to_string(),
            Self::SetSize => "set_size".to_string(),
            Self::SizePreset(n) => format!("size_{}", n),
            Self::SizeCustom => "size_custom".to_string(),
            Self::ToggleText => "toggle_text".to_string(),
            Self::SetPosition => "set_position".to_string(),
            Self::Position(a) => format!("pos_{}", a.key()),
            Self::SetScale => "set_scale".to_string(),
            Self::Scale(n) => format!("scale_{}", n),
            Self::RemoveImage => "remove_wm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            payload: action.payload(),
        }
    }
}

/// Rows of inline buttons, transport neutral.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    pub fn find(&self, payload: &str) -> Option<&Button> {
        self.buttons().find(|b| b.payload == payload)
    }
}

/// A menu screen: header text plus keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub text: String,
    pub keyboard: Keyboard,
}

pub fn welcome_menu() -> Menu {
    Menu {
        text: "Welcome! Upload a video to add watermark.".to_string(),
        keyboard: Keyboard::default()
            .row(vec![Button::new("📤 Add Watermark", MenuAction::AddWatermark)]),
    }
}

pub fn main_menu(placement: &Placement, has_image: bool) -> Menu {
    let image_state = if has_image { "set" } else { "none, send an image to add one" };
    let mut keyboard = Keyboard::default()
        .row(vec![Button::new("📝 Text Watermark", MenuAction::Settings)])
        .row(vec![
            Button::new(format!("📍 Position: {}", placement.anchor.label()), MenuAction::SetPosition),
            Button::new(format!("🖼 Image Size: {}%", placement.scale_percent), MenuAction::SetScale),
        ]);
    if has_image {
        keyboard = keyboard.row(vec![Button::new("🗑 Remove Image", MenuAction::RemoveImage)]);
    }

    Menu {
        text: format!("**Watermark Settings:**\nImage watermark: {}", image_state),
        keyboard,
    }
}

pub fn text_settings_menu(settings: &TextSettings) -> Menu {
    let status = if settings.enabled { "Enabled" } else { "Disabled" };
    Menu {
        text: "**Text Watermark Settings:**".to_string(),
        keyboard: Keyboard::default()
            .row(vec![Button::new("📝 Set Text", MenuAction::SetText)])
            .row(vec![Button::new("🎨 Set Color", MenuAction::SetColor)])
            .row(vec![Button::new("📏 Set Size", MenuAction::SetSize)])
            .row(vec![Button::new(format!("Text Overlay: {}", status), MenuAction::ToggleText)])
            .row(vec![Button::new("🔙 Back", MenuAction::Back)]),
    }
}

pub fn color_menu() -> Menu {
    let preset = |c: ColorPreset| Button::new(c.label(), MenuAction::ColorPreset(c));
    Menu {
        text: "Choose color:".to_string(),
        keyboard: Keyboard::default()
            .row(vec![preset(ColorPreset::White), preset(ColorPreset::Black)])
            .row(vec![preset(ColorPreset::Red), preset(ColorPreset::Blue)])
            .row(vec![Button::new("Custom Hex", MenuAction::ColorCustom)])
            .row(vec![Button::new("🔙 Back", MenuAction::Settings)]),
    }
}

pub fn size_menu() -> Menu {
    let names = ["Small", "Medium", "Large"];
    let mut presets: Vec<Button> = PRESET_FONT_SIZES
        .iter()
        .zip(names)
        .map(|(size, name)| Button::new(format!("{} ({}px)", name, size), MenuAction::SizePreset(*size)))
        .collect();
    presets.push(Button::new("Custom", MenuAction::SizeCustom));

    let mut keyboard = Keyboard::default();
    for pair in presets.chunks(2) {
        keyboard = keyboard.row(pair.to_vec());
    }

    Menu {
        text: "Choose size:".to_string(),
        keyboard: keyboard.row(vec![Button::new("🔙 Back", MenuAction::Settings)]),
    }
}

pub fn position_menu(current: Anchor) -> Menu {
    let mut keyboard = Keyboard::default();
    for row in Anchor::ALL.chunks(3) {
        let buttons = row
            .iter()
            .map(|anchor| {
                let mark = if *anchor == current { "✅ " } else { "" };
                Button::new(format!("{}{}", mark, anchor.label()), MenuAction::Position(*anchor))
            })
            .collect();
        keyboard = keyboard.row(buttons);
    }

    Menu {
        text: "Choose watermark position:".to_string(),
        keyboard: keyboard.row(vec![Button::new("🔙 Back", MenuAction::Back)]),
    }
}

pub fn scale_menu(current: u32) -> Menu {
    let buttons = PRESET_SCALES
        .iter()
        .map(|scale| {
            let mark = if *scale == current { "✅ " } else { "" };
            Button::new(format!("{}{}%", mark, scale), MenuAction::Scale(*scale))
        })
        .collect();

    Menu {
        text: "Choose image watermark size (percent of the video):".to_string(),
        keyboard: Keyboard::default()
            .row(buttons)
            .row(vec![Button::new("🔙 Back", MenuAction::Back)]),
    }
}
