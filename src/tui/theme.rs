//! Colors for each `Theme`. Presentation only; the core never sees these.

use ratatui::style::{Color, Modifier, Style};

use crate::core::config::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Style,
    /// Plain records (remote output).
    pub output: Style,
    /// Prefixed records (echoed commands).
    pub echo: Style,
    pub input: Style,
    pub status: Style,
    /// Draw a window frame around the terminal.
    pub framed: bool,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Standard => Palette {
                background: Style::default(),
                output: Style::default(),
                echo: Style::default().fg(Color::Green),
                input: Style::default().fg(Color::Green),
                status: Style::default().add_modifier(Modifier::REVERSED),
                framed: false,
            },
            Theme::Material => {
                let bg = Color::Rgb(0x26, 0x32, 0x38);
                Palette {
                    background: Style::default().bg(bg),
                    output: Style::default().fg(Color::Rgb(0xEE, 0xFF, 0xFF)).bg(bg),
                    echo: Style::default().fg(Color::Rgb(0xC3, 0xE8, 0x8D)).bg(bg),
                    input: Style::default().fg(Color::Rgb(0x89, 0xDD, 0xFF)).bg(bg),
                    status: Style::default().fg(bg).bg(Color::Rgb(0x80, 0xCB, 0xC4)),
                    framed: false,
                }
            }
            Theme::Desktop => Palette {
                background: Style::default().bg(Color::Black),
                output: Style::default().fg(Color::Gray).bg(Color::Black),
                echo: Style::default().fg(Color::White).bg(Color::Black),
                input: Style::default().fg(Color::White).bg(Color::Black),
                status: Style::default().fg(Color::Black).bg(Color::Gray),
                framed: true,
            },
        }
    }
}
