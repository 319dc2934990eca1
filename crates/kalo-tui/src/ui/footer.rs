use kalo_core::theme::{Element, Theme};
use ratatui::{
    prelude::{Alignment, Frame, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// A key hint: the key in brackets, then what it does.
pub type Hint = (&'static str, &'static str);

pub const LOGIN_HINTS: &[Hint] = &[
    ("TAB", "Next"),
    ("ENTER", "Login"),
    ("^V", "Show password"),
    ("ESC", "Quit"),
];

pub const PLUGIN_LIST_HINTS: &[Hint] = &[
    ("↑↓", "Select"),
    ("ENTER", "Settings"),
    ("R", "Reload"),
    ("T", "Theme"),
    ("ESC", "Logout"),
];

pub const PLUGIN_SETTING_HINTS: &[Hint] = &[
    ("←→", "Tab"),
    ("↑↓", "Field"),
    ("ENTER", "Edit"),
    ("S", "Save"),
    ("R", "Reload"),
    ("ESC", "Back"),
];

pub const EDITING_HINTS: &[Hint] = &[("ENTER", "Done"), ("ESC", "Done")];

pub const DROPDOWN_HINTS: &[Hint] = &[("↑↓", "Option"), ("ENTER", "Choose"), ("ESC", "Close")];

pub fn render_footer(frame: &mut Frame, area: Rect, theme: &Theme, hints: &[Hint]) {
    let footer_block = Block::default()
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Text));

    let inner_area = footer_block.inner(area);

    let mut spans = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" | "));
        }
        spans.push(Span::raw(format!("[{}] ", key)));
        spans.push(Span::styled(*label, theme.ratatui_style(Element::Inactive)));
    }

    let footer = Paragraph::new(Line::from(spans).alignment(Alignment::Center))
        .style(theme.ratatui_style(Element::Text));

    frame.render_widget(footer_block, area);
    frame.render_widget(footer, inner_area);
}
