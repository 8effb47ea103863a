//! Theme and Styling
//!
//! Colors and styles for the CrediTrust terminal UI.

use ratatui::style::{Color, Modifier, Style};

/// Application theme
pub struct Theme;

impl Theme {
    /// Brand accent (trust blue)
    pub const ACCENT: Color = Color::Rgb(56, 132, 244);
    /// Evidence / success green
    pub const SUCCESS: Color = Color::Rgb(46, 184, 114);
    pub const WARNING: Color = Color::Rgb(240, 180, 41);
    pub const ERROR: Color = Color::Rgb(230, 72, 72);

    pub const TEXT_PRIMARY: Color = Color::Rgb(228, 230, 235);
    pub const TEXT_SECONDARY: Color = Color::Rgb(156, 163, 175);
    pub const TEXT_DIM: Color = Color::Rgb(88, 92, 100);

    pub const BORDER: Color = Color::Rgb(55, 60, 68);
    pub const BORDER_FOCUSED: Color = Self::ACCENT;

    pub const USER: Color = Self::SUCCESS;
    pub const ANALYST: Color = Color::Rgb(99, 179, 237);
    pub const SYSTEM: Color = Self::WARNING;

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }

    pub fn title() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    pub fn heading() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::BORDER_FOCUSED)
    }

    pub fn user_message() -> Style {
        Style::default().fg(Self::USER).add_modifier(Modifier::BOLD)
    }

    pub fn assistant_message() -> Style {
        Style::default().fg(Self::ANALYST).add_modifier(Modifier::BOLD)
    }

    pub fn system_message() -> Style {
        Style::default().fg(Self::SYSTEM).add_modifier(Modifier::BOLD)
    }

    /// Keyboard shortcut style
    pub fn shortcut_key() -> Style {
        Style::default().fg(Self::ACCENT).add_modifier(Modifier::BOLD)
    }

    pub fn shortcut_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Active/in-progress indicator
    pub fn active() -> Style {
        Style::default()
            .fg(Self::WARNING)
            .add_modifier(Modifier::BOLD)
    }

    pub fn complete() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn pending() -> Style {
        Style::default().fg(Self::TEXT_DIM)
    }
}

/// Progress stage icons
pub struct Icons;

impl Icons {
    pub const COMPLETE: &'static str = "✓";
    pub const ACTIVE: &'static str = "●";
    pub const PENDING: &'static str = "○";
    pub const ERROR: &'static str = "✗";
    pub const ARROW: &'static str = "→";
    pub const CURSOR: &'static str = "▌";
    pub const SHIELD: &'static str = "🛡️";
}
