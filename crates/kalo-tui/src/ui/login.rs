use kalo_core::{
    login::LoginForm,
    theme::{Element, Theme},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::{Alignment, Constraint, Direction, Frame, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const TITLE: &str = r#"
 _  __     _
| |/ /__ _| | ___
| ' // _` | |/ _ \
| . \ (_| | | (_) |
|_|\_\__,_|_|\___/
"#;
const TITLE_HEIGHT: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Url,
    Username,
    Password,
}

impl LoginField {
    pub fn next(&self) -> Self {
        match self {
            Self::Url => Self::Username,
            Self::Username => Self::Password,
            Self::Password => Self::Url,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Self::Url => Self::Password,
            Self::Username => Self::Url,
            Self::Password => Self::Username,
        }
    }
}

pub enum LoginAction {
    None,
    Submit(LoginForm),
    Quit,
}

#[derive(Debug, Default)]
pub struct LoginScreen {
    pub form: LoginForm,
    pub focus: LoginField,
    pub show_password: bool,
}

impl LoginScreen {
    pub fn new(site_url: &str) -> Self {
        Self {
            form: LoginForm {
                url: site_url.to_string(),
                ..LoginForm::default()
            },
            focus: if site_url.is_empty() {
                LoginField::Url
            } else {
                LoginField::Username
            },
            show_password: false,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Url => &mut self.form.url,
            LoginField::Username => &mut self.form.username,
            LoginField::Password => &mut self.form.password,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> LoginAction {
        match key.code {
            KeyCode::Esc => return LoginAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return LoginAction::Quit
            }
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.show_password = !self.show_password;
            }
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.previous(),
            KeyCode::Enter => {
                if self.focus == LoginField::Password {
                    return LoginAction::Submit(self.form.clone());
                }
                self.focus = self.focus.next();
            }
            KeyCode::Backspace => {
                self.focused_mut().pop();
            }
            KeyCode::Char(ch) => self.focused_mut().push(ch),
            _ => {}
        }
        LoginAction::None
    }
}

pub fn render_login(frame: &mut Frame, area: Rect, theme: &Theme, screen: &LoginScreen) {
    let block = Block::new()
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Text));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let form_width = inner.width.min(60);
    let column = Rect::new(
        inner.x + (inner.width - form_width) / 2,
        inner.y,
        form_width,
        inner.height,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(3), // Site
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Min(0),
        ])
        .split(column);

    let title = Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(theme.ratatui_style(Element::Title));
    frame.render_widget(title, chunks[1]);

    let masked = if screen.show_password {
        screen.form.password.clone()
    } else {
        "*".repeat(screen.form.password.chars().count())
    };

    let inputs = [
        (LoginField::Url, "Halo site address", screen.form.url.clone(), "https://"),
        (LoginField::Username, "Username", screen.form.username.clone(), ""),
        (LoginField::Password, "Password", masked, ""),
    ];

    for ((field, label, value, placeholder), chunk) in inputs.into_iter().zip(&chunks[3..6]) {
        let focused = screen.focus == field;
        let border_style = if focused {
            theme.ratatui_style(Element::Accent)
        } else {
            theme.ratatui_style(Element::Border)
        };
        let content = if value.is_empty() && !focused {
            Line::from(Span::styled(placeholder, theme.inactive_style()))
        } else if focused {
            Line::from(vec![
                Span::styled(value, theme.text_style()),
                Span::styled("_", theme.highlight_style()),
            ])
        } else {
            Line::from(Span::styled(value, theme.text_style()))
        };
        let input = Paragraph::new(content).block(
            Block::new()
                .borders(Borders::ALL)
                .title(Span::styled(
                    format!(" {} ", label),
                    border_style.add_modifier(Modifier::BOLD),
                ))
                .border_style(border_style),
        );
        frame.render_widget(input, *chunk);
    }
}
