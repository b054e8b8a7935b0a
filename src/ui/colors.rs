use crate::config::AppMode;
use ratatui::style::Color;

pub struct ColorPalette {
    pub primary: Color,
    pub accent: Color,
    pub error: Color,
    pub positive: Color,
    pub muted: Color,
    pub selected_bg: Color,
    pub selected_fg: Color,
}

impl ColorPalette {
    pub fn for_mode(mode: AppMode) -> Self {
        match mode {
            AppMode::Full => Self::full(),
            AppMode::Lite => Self::lite(),
        }
    }

    fn full() -> Self {
        Self {
            // Deep indigo
            primary: Color::Rgb(0x5B, 0x6C, 0xF9),
            // Teal for highlights
            accent: Color::Rgb(0x2C, 0xC4, 0xB0),
            error: Color::Rgb(0xE5, 0x48, 0x4D),
            // Yield green
            positive: Color::Rgb(0x30, 0xA4, 0x6C),
            muted: Color::Gray,
            selected_bg: Color::Rgb(0x5B, 0x6C, 0xF9),
            selected_fg: Color::Rgb(0xFF, 0xFF, 0xFF),
        }
    }

    fn lite() -> Self {
        Self {
            primary: Color::Cyan,
            accent: Color::Yellow,
            error: Color::Red,
            positive: Color::Green,
            muted: Color::DarkGray,
            selected_bg: Color::Cyan,
            selected_fg: Color::Black,
        }
    }
}
