use kalo_core::{
    login::User,
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Alignment, Frame, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Paragraph},
};

/// Where the user is, as shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    Login,
    Plugins,
    PluginSetting(&'a str),
}

pub fn render_header(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    location: Location<'_>,
    site: Option<&str>,
    user: Option<&User>,
) {
    let title =
        Title::from(concat!(" Kalo v", env!("CARGO_PKG_VERSION"), " ")).alignment(Alignment::Left);

    let header = Paragraph::new(status_line(theme, location, site, user))
        .style(theme.ratatui_style(Element::Text))
        .alignment(Alignment::Left)
        .block(
            Block::new()
                .borders(Borders::ALL)
                .title(title)
                .style(theme.ratatui_style(Element::Text)),
        );

    frame.render_widget(header, area);
}

fn status_line<'a>(
    theme: &Theme,
    location: Location<'a>,
    site: Option<&'a str>,
    user: Option<&'a User>,
) -> Line<'a> {
    let separator = || Span::styled(" :: ", theme.inactive_style());
    let mut spans = Vec::new();

    match (site, user) {
        (Some(site), Some(user)) => {
            spans.push(Span::styled(site, Style::default().fg(theme.colors().accent)));
            spans.push(separator());
            spans.push(Span::styled(user.display_name(), theme.text_style()));
        }
        _ => spans.push(Span::styled("NOT LOGGED IN", theme.ratatui_style(Element::Warning))),
    }

    spans.push(separator());
    match location {
        Location::Login => spans.push(Span::styled("Login", theme.text_style())),
        Location::Plugins => spans.push(Span::styled("Plugins", theme.text_style())),
        Location::PluginSetting(plugin) => {
            spans.push(Span::styled("Plugins", theme.inactive_style()));
            spans.push(Span::styled(" > ", theme.inactive_style()));
            spans.push(Span::styled(plugin, theme.text_style()));
        }
    }

    Line::from(spans)
}
