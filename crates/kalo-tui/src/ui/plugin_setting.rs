use super::dialog::Dialog;
use super::plugin_list::render_placeholder;
use crossterm::event::{KeyCode, KeyEvent};
use kalo_core::{
    controller::SettingsController,
    envelope::Envelope,
    form::{Control, ControlKind, SettingsForm},
    observe::EnvelopeReceiver,
    provider::PluginSettingProvider,
    schema::PluginSetting,
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Constraint, Direction, Frame, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};
use std::sync::Arc;
use tracing::debug;

const MAX_TEXTAREA_LINES: u16 = 6;

pub enum SettingAction {
    None,
    Back,
}

/// Settings of one plugin: tabs for its pages, one control per field.
pub struct PluginSettingScreen {
    plugin_name: String,
    display_name: String,
    controller: SettingsController,
    rx: EnvelopeReceiver<PluginSetting>,
    saved_rx: EnvelopeReceiver<()>,
    state: Envelope<SettingsForm>,
    saving: bool,
}

impl PluginSettingScreen {
    pub fn new(
        provider: Arc<dyn PluginSettingProvider>,
        plugin_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let controller = SettingsController::new(provider);
        let rx = controller.subscribe();
        let saved_rx = controller.subscribe_saved();
        let mut screen = Self {
            plugin_name: plugin_name.into(),
            display_name: display_name.into(),
            controller,
            rx,
            saved_rx,
            state: Envelope::None,
            saving: false,
        };
        screen.refetch();
        screen
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn form(&self) -> Option<&SettingsForm> {
        self.state.data()
    }

    /// Whether typed characters belong to a field rather than to shortcuts.
    pub fn is_capturing(&self) -> bool {
        self.form().is_some_and(SettingsForm::is_capturing)
    }

    fn refetch(&mut self) {
        debug!(plugin = %self.plugin_name, "fetching plugin settings");
        self.state = Envelope::None;
        self.controller.fetch_settings(&self.plugin_name);
    }

    /// Applies whatever the controller published since the last call. The
    /// returned dialog reports a failed load or the outcome of a save.
    pub fn poll(&mut self) -> Option<Dialog> {
        if self.rx.has_changed() {
            match self.rx.current() {
                Envelope::None => self.state = Envelope::None,
                Envelope::Success(setting) => {
                    self.state = Envelope::Success(SettingsForm::new(setting));
                }
                Envelope::Failure(message) => {
                    let text = format!("Failed to load plugin settings, {}", message);
                    self.state = Envelope::Failure(message);
                    return Some(Dialog::new("Error", text));
                }
            }
        }

        if self.saved_rx.has_changed() {
            let saved = self.saved_rx.current();
            if !saved.is_none() {
                self.saving = false;
                self.controller.clear_saved();
                // Consume the reset so it isn't seen as another outcome.
                self.saved_rx.current();
            }
            match saved {
                Envelope::None => {}
                Envelope::Success(()) => {
                    return Some(Dialog::new("Saved", "Plugin settings saved"));
                }
                Envelope::Failure(message) => {
                    return Some(Dialog::new(
                        "Error",
                        format!("Failed to save plugin settings, {}", message),
                    ));
                }
            }
        }
        None
    }

    fn save(&mut self) {
        let Envelope::Success(form) = &self.state else {
            return;
        };
        let Some(page) = form.active_page() else {
            return;
        };
        self.saving = true;
        self.controller.save_settings(&self.plugin_name, page, form.store());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SettingAction {
        let Envelope::Success(form) = &mut self.state else {
            match key.code {
                KeyCode::Esc => return SettingAction::Back,
                KeyCode::Char('r') => self.refetch(),
                _ => {}
            }
            return SettingAction::None;
        };

        if form.is_capturing() {
            match key.code {
                KeyCode::Esc => {
                    form.cancel();
                }
                KeyCode::Enter => form.submit(),
                KeyCode::Up => form.highlight_previous(),
                KeyCode::Down => form.highlight_next(),
                KeyCode::Backspace => {
                    form.backspace();
                }
                KeyCode::Char(ch) => {
                    form.input_char(ch);
                }
                _ => {}
            }
            return SettingAction::None;
        }

        match key.code {
            KeyCode::Esc => return SettingAction::Back,
            KeyCode::Left | KeyCode::BackTab => {
                form.previous_page();
            }
            KeyCode::Right | KeyCode::Tab => {
                form.next_page();
            }
            KeyCode::Up => form.focus_previous(),
            KeyCode::Down => form.focus_next(),
            KeyCode::Enter => form.submit(),
            KeyCode::Char('s') if !self.saving => self.save(),
            KeyCode::Char('r') => self.refetch(),
            _ => {}
        }
        SettingAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let title = if self.saving {
            format!(" {} (saving...) ", self.display_name)
        } else {
            format!(" {} ", self.display_name)
        };
        let block = Block::new()
            .title(title)
            .borders(Borders::ALL)
            .style(theme.ratatui_style(Element::Text));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &self.state {
            Envelope::None => render_placeholder(frame, inner, theme, "Loading plugin settings..."),
            Envelope::Failure(_) => render_placeholder(
                frame,
                inner,
                theme,
                "Plugin settings could not be loaded. [R] Retry",
            ),
            Envelope::Success(form) if form.is_empty() => {
                render_placeholder(frame, inner, theme, "This plugin has no settings")
            }
            Envelope::Success(form) => render_form(frame, inner, theme, form),
        }
    }
}

fn render_form(frame: &mut Frame, area: Rect, theme: &Theme, form: &SettingsForm) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let titles: Vec<Line> = form
        .pages()
        .iter()
        .map(|page| Line::from(page.label.as_str()))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .style(theme.inactive_style())
        .highlight_style(theme.highlight_style())
        .divider(" | ")
        .select(form.active_index());
    frame.render_widget(tabs, chunks[0]);

    let controls = form.controls();
    if controls.is_empty() {
        render_placeholder(frame, chunks[2], theme, "Nothing to edit on this page");
        return;
    }

    let heights: Vec<u16> = controls.iter().map(control_height).collect();
    let focused = controls.iter().position(|control| control.focused).unwrap_or(0);
    let first = first_visible(&heights, focused, chunks[2].height);

    let fields = chunks[2];
    let bottom = fields.y + fields.height;
    let mut y = fields.y;
    for (control, height) in controls.iter().zip(&heights).skip(first) {
        if y >= bottom {
            break;
        }
        let height = (*height).min(bottom - y);
        render_control(frame, Rect::new(fields.x, y, fields.width, height), theme, control);
        y += height;
    }
}

/// First control to draw so that the focused one is fully on screen.
fn first_visible(heights: &[u16], focused: usize, available: u16) -> usize {
    let mut first = 0;
    while first < focused
        && heights[first..=focused].iter().map(|&h| h as u32).sum::<u32>() > available as u32
    {
        first += 1;
    }
    first
}

fn lines_u16(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}

fn control_height(control: &Control<'_>) -> u16 {
    let body = match &control.kind {
        ControlKind::TextInput {
            value,
            multiline: true,
            ..
        } => lines_u16(value.split('\n').count()).clamp(3, MAX_TEXTAREA_LINES),
        ControlKind::TextInput { .. } => 1,
        ControlKind::Select {
            options, dropdown, ..
        } => 1u16.saturating_add(dropdown.map(|_| lines_u16(options.len())).unwrap_or(0)),
    };
    body.saturating_add(2)
        .saturating_add(control.help.map(|_| 1).unwrap_or(0))
}

fn render_control(frame: &mut Frame, area: Rect, theme: &Theme, control: &Control<'_>) {
    let border_style = if control.focused {
        theme.ratatui_style(Element::Accent)
    } else {
        theme.ratatui_style(Element::Border)
    };
    let help_height = control.help.map(|_| 1).unwrap_or(0);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(help_height)])
        .split(area);

    let block = Block::new()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", control.label),
            border_style.add_modifier(Modifier::BOLD),
        ))
        .border_style(border_style);
    let body = block.inner(chunks[0]);

    let (lines, scroll) = match &control.kind {
        ControlKind::TextInput { value, editing, .. } => {
            let mut lines: Vec<Line> = value
                .split('\n')
                .map(|line| Line::from(Span::styled(line.to_string(), theme.text_style())))
                .collect();
            if *editing {
                if let Some(last) = lines.last_mut() {
                    last.spans.push(Span::styled("_", theme.highlight_style()));
                }
            }
            let scroll = lines_u16(lines.len()).saturating_sub(body.height);
            (lines, scroll)
        }
        ControlKind::Select {
            value,
            selected_label,
            options,
            dropdown,
        } => {
            let mut shown = if value.is_empty() {
                vec![Span::styled("(none)", theme.inactive_style())]
            } else {
                vec![Span::styled(value.to_string(), theme.text_style())]
            };
            if let Some(label) = selected_label.filter(|label| label != value) {
                shown.push(Span::styled(format!(" ({})", label), theme.inactive_style()));
            }
            shown.push(Span::styled(" ▾", theme.ratatui_style(Element::Accent)));
            let mut lines = vec![Line::from(shown)];
            if let Some(highlighted) = dropdown {
                lines.extend(options.iter().enumerate().map(|(i, option)| {
                    let marker = if option.value == *value { "● " } else { "  " };
                    let style = if i == *highlighted {
                        theme.highlight_style()
                    } else {
                        theme.text_style()
                    };
                    Line::from(Span::styled(format!("{}{}", marker, option.label), style))
                }));
            }
            (lines, 0)
        }
    };

    frame.render_widget(
        Paragraph::new(lines).scroll((scroll, 0)).block(block),
        chunks[0],
    );

    if let Some(help) = control.help {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", help), theme.inactive_style())),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;
    use kalo_core::{
        error::HaloError,
        schema::{FormField, SelectOption, SettingsPage},
        theme::ThemeVariant,
    };
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::{Map, Value};
    use std::sync::Mutex;

    struct FakeSite {
        /// `None` makes every fetch time out.
        setting: Option<PluginSetting>,
        saved: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    #[async_trait]
    impl PluginSettingProvider for FakeSite {
        async fn get_plugin_setting(&self, _name: &str) -> Result<PluginSetting, HaloError> {
            self.setting.clone().ok_or(HaloError::Timeout)
        }

        async fn save_plugin_config(
            &self,
            _name: &str,
            group: &str,
            values: Map<String, Value>,
        ) -> Result<(), HaloError> {
            self.saved
                .lock()
                .unwrap()
                .push((group.to_string(), values));
            Ok(())
        }
    }

    fn comment_widget() -> PluginSetting {
        PluginSetting {
            name: "comment-widget".to_string(),
            pages: vec![
                SettingsPage::new(
                    "basic",
                    "Basic",
                    vec![
                        FormField::text("Site title", "Halo").with_name("title"),
                        FormField::select("Size", "0", &[("Small", "0"), ("Large", "1")])
                            .with_name("size")
                            .with_help("Size of the comment box"),
                    ],
                ),
                SettingsPage::new(
                    "avatar",
                    "Avatar",
                    vec![FormField::text("Provider", "gravatar").with_name("provider")],
                ),
            ],
        }
    }

    async fn loaded(site: FakeSite) -> (PluginSettingScreen, Arc<FakeSite>) {
        let site = Arc::new(site);
        let mut screen = PluginSettingScreen::new(site.clone(), "comment-widget", "Comments");
        screen.controller.subscribe().settled().await;
        assert!(screen.poll().is_none());
        (screen, site)
    }

    fn site(setting: Option<PluginSetting>) -> FakeSite {
        FakeSite {
            setting,
            saved: Mutex::new(Vec::new()),
        }
    }

    fn press(screen: &mut PluginSettingScreen, code: KeyCode) -> SettingAction {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn render(screen: &PluginSettingScreen, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("create test terminal");
        let theme = Theme::new(ThemeVariant::Dark);
        terminal
            .draw(|frame| screen.render(frame, frame.size(), &theme))
            .expect("draw settings");
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();
        for y in 0..height {
            let mut line = String::new();
            for x in 0..width {
                line.push_str(buffer.get(x, y).symbol());
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    #[tokio::test]
    async fn test_renders_tabs_and_controls() {
        let (screen, _) = loaded(site(Some(comment_widget()))).await;
        let output = render(&screen, 60, 20);
        assert!(output.contains("Comments"));
        assert!(output.contains("Basic"));
        assert!(output.contains("Avatar"));
        assert!(output.contains("Site title"));
        assert!(output.contains("Halo"));
        assert!(output.contains("0 (Small) ▾"));
        assert!(output.contains("Size of the comment box"));
        assert!(!output.contains("gravatar"));
    }

    #[tokio::test]
    async fn test_switching_tab_reseeds_values() {
        let (mut screen, _) = loaded(site(Some(comment_widget()))).await;
        press(&mut screen, KeyCode::Right);
        assert_eq!(screen.form().map(|form| form.active_index()), Some(1));
        assert!(render(&screen, 60, 20).contains("gravatar"));

        press(&mut screen, KeyCode::Left);
        assert_eq!(
            screen.form().map(|form| form.store().values().to_vec()),
            Some(vec!["Halo".to_string(), "0".to_string()])
        );
    }

    #[tokio::test]
    async fn test_choose_option_and_save() {
        let (mut screen, site) = loaded(site(Some(comment_widget()))).await;
        press(&mut screen, KeyCode::Down);
        press(&mut screen, KeyCode::Enter);
        assert!(screen.is_capturing());
        assert!(render(&screen, 60, 20).contains("Large"));

        press(&mut screen, KeyCode::Down);
        press(&mut screen, KeyCode::Enter);
        assert!(!screen.is_capturing());
        assert_eq!(screen.form().map(|form| form.value(1)), Some("1"));
        assert!(render(&screen, 60, 20).contains("1 (Large) ▾"));

        press(&mut screen, KeyCode::Char('s'));
        screen.controller.subscribe_saved().settled().await;
        let dialog = screen.poll().expect("save outcome");
        assert_eq!(dialog.title, "Saved");

        let saved = site.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "basic");
        assert_eq!(saved[0].1.get("size"), Some(&Value::String("1".into())));
        assert_eq!(saved[0].1.get("title"), Some(&Value::String("Halo".into())));
    }

    #[tokio::test]
    async fn test_typing_into_text_field() {
        let (mut screen, _) = loaded(site(Some(comment_widget()))).await;
        press(&mut screen, KeyCode::Enter);
        press(&mut screen, KeyCode::Backspace);
        press(&mut screen, KeyCode::Char('!'));
        // 's' is text while editing, not a save
        press(&mut screen, KeyCode::Char('s'));
        assert_eq!(screen.form().map(|form| form.value(0)), Some("Hal!s"));
        assert!(!screen.saving);

        press(&mut screen, KeyCode::Esc);
        assert!(!screen.is_capturing());
        assert!(matches!(press(&mut screen, KeyCode::Esc), SettingAction::Back));
    }

    #[tokio::test]
    async fn test_plugin_without_settings() {
        let empty = PluginSetting {
            name: "sitemap".to_string(),
            pages: Vec::new(),
        };
        let (screen, _) = loaded(site(Some(empty))).await;
        assert!(screen.form().is_some());
        assert!(render(&screen, 60, 12).contains("This plugin has no settings"));
    }

    #[tokio::test]
    async fn test_failed_load_reports_message() {
        let site = Arc::new(site(None));
        let mut screen = PluginSettingScreen::new(site, "comment-widget", "Comments");
        screen.controller.subscribe().settled().await;

        let dialog = screen.poll().expect("failure dialog");
        assert_eq!(dialog.text, "Failed to load plugin settings, timeout");
        assert!(render(&screen, 60, 12).contains("[R] Retry"));
    }

    #[test]
    fn test_control_height_saturates() {
        let options: Vec<SelectOption> = (0..70_000)
            .map(|i| SelectOption {
                label: i.to_string(),
                value: i.to_string(),
                raw: Value::from(i),
            })
            .collect();
        let control = Control {
            index: 0,
            label: "Many",
            help: Some("help"),
            focused: true,
            kind: ControlKind::Select {
                value: "0",
                selected_label: Some("0"),
                options: &options,
                dropdown: Some(0),
            },
        };
        assert_eq!(control_height(&control), u16::MAX);
    }

    #[test]
    fn test_first_visible_keeps_focus_on_screen() {
        let heights = [3, 3, 4, 3];
        assert_eq!(first_visible(&heights, 0, 6), 0);
        assert_eq!(first_visible(&heights, 2, 6), 2);
        assert_eq!(first_visible(&heights, 3, 7), 2);
        assert_eq!(first_visible(&heights, 3, 100), 0);
    }
}
