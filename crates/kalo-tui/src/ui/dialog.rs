use kalo_core::theme::{Element, Theme};
use ratatui::{
    prelude::{Alignment, Constraint, Direction, Frame, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::time::{Duration, Instant};

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub title: String,
    pub text: String,
}

impl Dialog {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// A spinner dialog that closes itself after `timeout`.
#[derive(Debug, Clone)]
pub struct Progress {
    pub text: String,
    started: Instant,
    timeout: Duration,
}

impl Progress {
    pub fn new(text: impl Into<String>, timeout: Duration) -> Self {
        Self {
            text: text.into(),
            started: Instant::now(),
            timeout,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.started.elapsed() >= self.timeout
    }

    fn spinner(&self) -> char {
        const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
        FRAMES[(self.started.elapsed().as_millis() / 150) as usize % FRAMES.len()]
    }
}

/// Modal area: a share of the terminal, clamped to sensible bounds.
pub fn modal_area(size: Rect, max_width: u16, max_height: u16) -> Rect {
    let min_width = 30;
    let min_height = 5;
    let modal_width = (((size.width as f32) * 0.6).round() as u16)
        .clamp(min_width, max_width)
        .min(size.width);
    let modal_height = (((size.height as f32) * 0.3).round() as u16)
        .clamp(min_height, max_height)
        .min(size.height);
    Rect::new(
        size.x + (size.width.saturating_sub(modal_width)) / 2,
        size.y + (size.height.saturating_sub(modal_height)) / 2,
        modal_width,
        modal_height,
    )
}

pub fn render_dialog(frame: &mut Frame, theme: &Theme, dialog: &Dialog) {
    let area = modal_area(frame.size(), 70, 12);
    frame.render_widget(Clear, area);

    let block = Block::new()
        .title(format!(" {} ", dialog.title))
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Warning));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let text = Paragraph::new(dialog.text.as_str())
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .style(theme.text_style());
    frame.render_widget(text, chunks[0]);

    let hint = Paragraph::new("[ENTER] OK")
        .alignment(Alignment::Center)
        .style(theme.inactive_style());
    frame.render_widget(hint, chunks[1]);
}

pub fn render_progress(frame: &mut Frame, theme: &Theme, progress: &Progress) {
    let area = modal_area(frame.size(), 40, 5);
    frame.render_widget(Clear, area);

    let block = Block::new()
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = Line::from(format!("{} {}", progress.spinner(), progress.text));
    frame.render_widget(
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .style(theme.text_style()),
        inner,
    );
}
