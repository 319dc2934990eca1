use kalo_core::{
    envelope::Envelope,
    observe::EnvelopeReceiver,
    plugins::{Plugin, PluginListController},
    provider::PluginListProvider,
    theme::{Element, Theme},
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::{Alignment, Constraint, Direction, Frame, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::sync::Arc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CARD_HEIGHT: u16 = 5;

pub enum PluginListAction {
    None,
    Open { name: String, display_name: String },
    Logout,
}

pub struct PluginListScreen {
    controller: PluginListController,
    rx: EnvelopeReceiver<Vec<Plugin>>,
    plugins: Envelope<Vec<Plugin>>,
    selected: usize,
}

impl PluginListScreen {
    pub fn new(provider: Arc<dyn PluginListProvider>) -> Self {
        let controller = PluginListController::new(provider);
        let rx = controller.subscribe();
        controller.fetch_plugins();
        Self {
            controller,
            rx,
            plugins: Envelope::None,
            selected: 0,
        }
    }

    /// Picks up a newly published plugin list. A failure is handed back so
    /// the app can show it in a dialog.
    pub fn poll(&mut self) -> Option<String> {
        if !self.rx.has_changed() {
            return None;
        }
        self.plugins = self.rx.current();
        let mut failure = None;
        self.plugins.handle(
            |plugins| self.selected = self.selected.min(plugins.len().saturating_sub(1)),
            |err| failure = Some(format!("Failed to load plugins, {}", err)),
        );
        failure
    }

    fn len(&self) -> usize {
        self.plugins.data().map(Vec::len).unwrap_or(0)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PluginListAction {
        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('r') => {
                self.controller.fetch_plugins();
            }
            KeyCode::Esc => return PluginListAction::Logout,
            KeyCode::Enter => {
                if let Some(plugin) = self.plugins.data().and_then(|p| p.get(self.selected)) {
                    return PluginListAction::Open {
                        name: plugin.name.clone(),
                        display_name: plugin.title().to_string(),
                    };
                }
            }
            _ => {}
        }
        PluginListAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::new()
            .title(" Plugins ")
            .borders(Borders::ALL)
            .style(theme.ratatui_style(Element::Text));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let plugins = match &self.plugins {
            Envelope::Success(plugins) => plugins,
            Envelope::None => {
                render_placeholder(frame, inner, theme, "Loading plugins...");
                return;
            }
            Envelope::Failure(_) => {
                render_placeholder(frame, inner, theme, "Plugins could not be loaded. [R] Retry");
                return;
            }
        };
        if plugins.is_empty() {
            render_placeholder(frame, inner, theme, "No plugins installed");
            return;
        }

        let visible = (inner.height / CARD_HEIGHT).max(1) as usize;
        let first = self.selected.saturating_sub(visible - 1);
        let constraints: Vec<Constraint> = (0..visible)
            .map(|_| Constraint::Length(CARD_HEIGHT))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let slots = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (slot, (index, plugin)) in slots
            .iter()
            .zip(plugins.iter().enumerate().skip(first).take(visible))
        {
            render_card(frame, *slot, theme, plugin, index == self.selected);
        }
    }
}

pub fn render_placeholder(frame: &mut Frame, area: Rect, theme: &Theme, text: &str) {
    let top = area.height / 2;
    let line_area = Rect::new(area.x, area.y + top, area.width, area.height.min(1));
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(theme.inactive_style()),
        line_area,
    );
}

/// Cuts `text` to `width` terminal columns, marking the cut with `…`.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn render_card(frame: &mut Frame, area: Rect, theme: &Theme, plugin: &Plugin, selected: bool) {
    let style = if selected {
        theme.highlight_style()
    } else {
        theme.text_style()
    };
    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(if selected {
            theme.ratatui_style(Element::Accent)
        } else {
            theme.ratatui_style(Element::Border)
        })
        .style(style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let status = if plugin.enabled { "enabled" } else { "disabled" };
    let mut header = vec![
        Span::styled(
            format!("({}) ", plugin.avatar()),
            theme.ratatui_style(Element::Title),
        ),
        Span::styled(
            truncate(plugin.title(), width.saturating_sub(24)),
            style.add_modifier(Modifier::BOLD),
        ),
    ];
    if !plugin.version.is_empty() {
        header.push(Span::styled(
            format!("  v{}", plugin.version),
            theme.inactive_style(),
        ));
    }
    header.push(Span::styled(
        format!("  {}", status),
        if plugin.enabled {
            theme.ratatui_style(Element::Accent)
        } else {
            theme.ratatui_style(Element::Warning)
        },
    ));

    let mut lines = vec![Line::from(header)];
    lines.extend(
        textwrap::wrap(&plugin.description, width.max(1))
            .into_iter()
            .take(2)
            .map(|line| Line::from(Span::styled(line.into_owned(), theme.inactive_style()))),
    );
    if let Some(created) = plugin.created {
        if let Some(first) = lines.first_mut() {
            first.spans.push(Span::styled(
                format!("  {}", created.format("%Y-%m-%d")),
                theme.inactive_style(),
            ));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_width() {
        assert_eq!(truncate("Sitemap", 10), "Sitemap");
        assert_eq!(truncate("Comment widget", 8), "Comment…");
        assert_eq!(truncate("评论组件插件", 7), "评论组…");
    }
}
