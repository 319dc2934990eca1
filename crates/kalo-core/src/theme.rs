//! Terminal color themes.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone)]
pub struct ColorPalette {
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
    pub error: Color,
    pub muted: Color,
    pub selection: Color,
    pub warning: Color,
}

/// UI element types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Text,
    Title,
    Border,
    /// Focused field, selected card, active tab
    Highlight,
    Accent,
    Error,
    /// Help text and placeholders
    Inactive,
    Background,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Theme {
    variant: ThemeVariant,
    colors: ColorPalette,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::default())
    }
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        let colors = match variant {
            ThemeVariant::Dark => ColorPalette {
                background: Color::Rgb(24, 27, 33),    // #181b21
                foreground: Color::Rgb(220, 223, 228), // #dcdfe4
                accent: Color::Rgb(72, 149, 239),      // #4895ef (halo blue)
                error: Color::Rgb(239, 83, 80),        // #ef5350
                muted: Color::Rgb(125, 133, 144),      // #7d8590
                selection: Color::Rgb(44, 50, 60),     // #2c323c
                warning: Color::Rgb(229, 181, 103),    // #e5b567
            },
            ThemeVariant::Light => ColorPalette {
                background: Color::Rgb(250, 250, 252), // #fafafc
                foreground: Color::Rgb(38, 42, 51),    // #262a33
                accent: Color::Rgb(24, 103, 192),      // #1867c0
                error: Color::Rgb(198, 40, 40),        // #c62828
                muted: Color::Rgb(120, 126, 138),      // #787e8a
                selection: Color::Rgb(226, 234, 246),  // #e2eaf6
                warning: Color::Rgb(180, 110, 20),     // #b46e14
            },
        };

        Self { variant, colors }
    }

    pub fn variant(&self) -> ThemeVariant {
        self.variant
    }

    pub fn colors(&self) -> &ColorPalette {
        &self.colors
    }

    /// Toggle between dark and light variants
    pub fn toggle(&mut self) {
        let next = match self.variant {
            ThemeVariant::Dark => ThemeVariant::Light,
            ThemeVariant::Light => ThemeVariant::Dark,
        };
        *self = Self::new(next);
    }

    pub fn ratatui_style(&self, element: Element) -> Style {
        let base = Style::default().bg(self.colors.background);
        match element {
            Element::Text | Element::Background => base.fg(self.colors.foreground),
            Element::Title => base.fg(self.colors.accent).add_modifier(Modifier::BOLD),
            Element::Border => base.fg(self.colors.muted),
            Element::Highlight => Style::default()
                .fg(self.colors.foreground)
                .bg(self.colors.selection)
                .add_modifier(Modifier::BOLD),
            Element::Accent => base.fg(self.colors.accent),
            Element::Error => base.fg(self.colors.error).add_modifier(Modifier::BOLD),
            Element::Inactive => base.fg(self.colors.muted),
            Element::Warning => base.fg(self.colors.warning),
        }
    }

    pub fn text_style(&self) -> Style {
        self.ratatui_style(Element::Text)
    }

    pub fn highlight_style(&self) -> Style {
        self.ratatui_style(Element::Highlight)
    }

    pub fn inactive_style(&self) -> Style {
        self.ratatui_style(Element::Inactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_switches_palette() {
        let mut theme = Theme::default();
        assert_eq!(theme.variant(), ThemeVariant::Dark);
        let dark_bg = theme.colors().background;

        theme.toggle();
        assert_eq!(theme.variant(), ThemeVariant::Light);
        assert_ne!(theme.colors().background, dark_bg);

        theme.toggle();
        assert_eq!(theme.colors().background, dark_bg);
    }

    #[test]
    fn test_highlight_uses_selection_background() {
        let theme = Theme::new(ThemeVariant::Light);
        assert_eq!(
            theme.highlight_style().bg,
            Some(theme.colors().selection)
        );
    }
}
