//! Color theme for the TUI - using ANSI colors for better terminal compatibility

use ratatui::style::{Color, Modifier, Style};

use crate::model::SeverityBand;

/// Theme using ANSI colors that work well across terminal themes
pub struct Theme;

impl Theme {
    pub const BLUE: Color = Color::Blue;
    pub const CYAN: Color = Color::Cyan;
    pub const GREEN: Color = Color::Green;
    pub const YELLOW: Color = Color::Yellow;
    pub const RED: Color = Color::Red;
    pub const DARK_GRAY: Color = Color::DarkGray;

    // Semantic styles
    pub fn title() -> Style {
        Style::default().fg(Self::CYAN).add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default()
    }

    pub fn bold() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    pub fn italic() -> Style {
        Style::default().add_modifier(Modifier::ITALIC)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::GREEN)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::YELLOW)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::RED)
    }

    pub fn accent() -> Style {
        Style::default().fg(Self::CYAN)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::DARK_GRAY)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DARK_GRAY)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::CYAN)
    }

    // Navigation
    pub fn nav_active() -> Style {
        Style::default()
            .bg(Self::BLUE)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_inactive() -> Style {
        Style::default().fg(Color::Gray)
    }

    // Buttons
    pub fn button(focused: bool, enabled: bool) -> Style {
        if !enabled {
            Style::default().bg(Self::DARK_GRAY).fg(Color::Black)
        } else if focused {
            Style::default()
                .bg(Self::CYAN)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(Self::BLUE).fg(Color::White)
        }
    }

    pub fn row_selected() -> Style {
        Style::default().bg(Self::DARK_GRAY).add_modifier(Modifier::BOLD)
    }

    /// Badge style for a grade value.
    pub fn severity(band: SeverityBand) -> Style {
        let bg = match band {
            SeverityBand::Favorable => Self::GREEN,
            SeverityBand::Neutral => Self::YELLOW,
            SeverityBand::Unfavorable => Self::RED,
        };
        Style::default()
            .bg(bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    // Key hints
    pub fn key() -> Style {
        Style::default().fg(Self::CYAN).add_modifier(Modifier::BOLD)
    }

    pub fn key_desc() -> Style {
        Style::default().fg(Self::DARK_GRAY)
    }
}
