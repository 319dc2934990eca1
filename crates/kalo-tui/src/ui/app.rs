use super::{
    dialog::{render_dialog, render_progress, Dialog, Progress},
    footer::{
        render_footer, Hint, DROPDOWN_HINTS, EDITING_HINTS, LOGIN_HINTS, PLUGIN_LIST_HINTS,
        PLUGIN_SETTING_HINTS,
    },
    header::{render_header, Location},
    login::{render_login, LoginAction, LoginScreen},
    plugin_list::{PluginListAction, PluginListScreen},
    plugin_setting::{PluginSettingScreen, SettingAction},
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use kalo_core::{
    client::HaloClient,
    envelope::Envelope,
    login::{LoginController, LoginForm, User, LOGIN_PROGRESS_TIMEOUT},
    observe::EnvelopeReceiver,
    settings::Settings,
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Constraint, CrosstermBackend, Direction, Layout, Terminal},
    widgets::{Block, Borders},
};
use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

enum Screen {
    Login(LoginScreen),
    Plugins(PluginListScreen),
    PluginSetting {
        list: PluginListScreen,
        setting: PluginSettingScreen,
    },
}

impl Screen {
    fn poll(&mut self) -> Option<Dialog> {
        match self {
            Screen::Login(_) => None,
            Screen::Plugins(list) => list.poll().map(|text| Dialog::new("Error", text)),
            // The list keeps its news until the user is back on it.
            Screen::PluginSetting { setting, .. } => setting.poll(),
        }
    }
}

struct Session {
    client: Arc<HaloClient>,
    user: User,
}

pub struct App {
    should_quit: bool,
    theme: Theme,
    settings: Settings,
    screen: Screen,
    dialog: Option<Dialog>,
    progress: Option<Progress>,
    login: LoginController,
    login_rx: EnvelopeReceiver<User>,
    pending: Option<Arc<HaloClient>>,
    session: Option<Session>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let theme = Theme::new(settings.theme);
        let login = LoginController::new();
        let login_rx = login.subscribe();
        Self {
            should_quit: false,
            theme,
            screen: Screen::Login(LoginScreen::new(&settings.site_url)),
            settings,
            dialog: None,
            progress: None,
            login,
            login_rx,
            pending: None,
            session: None,
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        info!(site = %self.settings.site_url, "kalo started");
        while !self.should_quit {
            self.poll();
            self.draw(terminal)?;
            self.handle_events()?;
            tokio::task::yield_now().await;
        }
        info!("kalo stopped");
        Ok(())
    }

    /// Takes in everything the background requests published since the
    /// previous frame.
    fn poll(&mut self) {
        if self.login_rx.has_changed() {
            match self.login_rx.current() {
                Envelope::None => {}
                Envelope::Success(user) => self.logged_in(user),
                Envelope::Failure(message) => {
                    self.progress = None;
                    self.pending = None;
                    self.dialog = Some(Dialog::new("Login failed", message));
                }
            }
        }

        if self.progress.as_ref().is_some_and(Progress::is_expired) {
            self.progress = None;
        }

        let dialog = self.screen.poll();
        if dialog.is_some() {
            self.dialog = dialog;
        }
    }

    fn logged_in(&mut self, user: User) {
        self.progress = None;
        let Some(client) = self.pending.take() else {
            return;
        };
        info!(user = user.name(), site = %client.site(), "session started");

        let site = client.site().to_string();
        if self.settings.site_url != site {
            self.settings.site_url = site;
            if let Err(e) = self.settings.save() {
                warn!(error = %e, "failed to remember site address");
            }
        }

        self.screen = Screen::Plugins(PluginListScreen::new(client.clone()));
        self.session = Some(Session { client, user });
    }

    fn submit_login(&mut self, form: LoginForm) {
        if let Err(e) = form.validate() {
            self.login.reject(e);
            return;
        }
        let client = match HaloClient::new(
            form.url.trim(),
            &form.username,
            &form.password,
            self.settings.request_timeout(),
        ) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                self.dialog = Some(Dialog::new("Login failed", e.to_string()));
                return;
            }
        };
        self.pending = Some(client.clone());
        self.progress = Some(Progress::new("Logging in...", LOGIN_PROGRESS_TIMEOUT));
        self.login.login(client);
    }

    fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user = session.user.name(), "logged out");
        }
        self.login.reset();
        self.screen = Screen::Login(LoginScreen::new(&self.settings.site_url));
    }

    fn draw(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        terminal.draw(|frame| {
            let main_layout = Block::new()
                .borders(Borders::NONE)
                .style(self.theme.ratatui_style(Element::Background));

            let area = frame.size();
            frame.render_widget(main_layout, area);

            let app_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(0),
                    Constraint::Length(3),
                ])
                .split(area);

            let location = match &self.screen {
                Screen::Login(_) => Location::Login,
                Screen::Plugins(_) => Location::Plugins,
                Screen::PluginSetting { setting, .. } => {
                    Location::PluginSetting(setting.display_name())
                }
            };
            let site = self.session.as_ref().map(|s| s.client.site().as_str());
            let user = self.session.as_ref().map(|s| &s.user);
            render_header(frame, app_chunks[0], &self.theme, location, site, user);

            match &self.screen {
                Screen::Login(login) => render_login(frame, app_chunks[1], &self.theme, login),
                Screen::Plugins(list) => list.render(frame, app_chunks[1], &self.theme),
                Screen::PluginSetting { setting, .. } => {
                    setting.render(frame, app_chunks[1], &self.theme)
                }
            }

            render_footer(frame, app_chunks[2], &self.theme, self.hints());

            if let Some(progress) = &self.progress {
                render_progress(frame, &self.theme, progress);
            } else if let Some(dialog) = &self.dialog {
                render_dialog(frame, &self.theme, dialog);
            }
        })?;
        Ok(())
    }

    fn hints(&self) -> &'static [Hint] {
        match &self.screen {
            Screen::Login(_) => LOGIN_HINTS,
            Screen::Plugins(_) => PLUGIN_LIST_HINTS,
            Screen::PluginSetting { setting, .. } => match setting.form() {
                Some(form) if form.is_dropdown_open() => DROPDOWN_HINTS,
                Some(form) if form.is_editing() => EDITING_HINTS,
                _ => PLUGIN_SETTING_HINTS,
            },
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.progress.is_some() {
            return;
        }
        if self.dialog.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.dialog = None;
            }
            return;
        }

        let typing = match &self.screen {
            Screen::Login(_) => true,
            Screen::Plugins(_) => false,
            Screen::PluginSetting { setting, .. } => setting.is_capturing(),
        };
        if key.code == KeyCode::Char('t') && !typing {
            self.toggle_theme();
            return;
        }

        match &mut self.screen {
            Screen::Login(login) => match login.handle_key(key) {
                LoginAction::None => {}
                LoginAction::Submit(form) => self.submit_login(form),
                LoginAction::Quit => self.should_quit = true,
            },
            Screen::Plugins(list) => match list.handle_key(key) {
                PluginListAction::None => {}
                PluginListAction::Logout => self.logout(),
                PluginListAction::Open { name, display_name } => {
                    self.open_plugin(name, display_name)
                }
            },
            Screen::PluginSetting { setting, .. } => match setting.handle_key(key) {
                SettingAction::None => {}
                SettingAction::Back => self.close_plugin(),
            },
        }
    }

    fn open_plugin(&mut self, name: String, display_name: String) {
        let Some(session) = &self.session else {
            return;
        };
        let setting = PluginSettingScreen::new(session.client.clone(), name, display_name);
        let previous = std::mem::replace(&mut self.screen, Screen::Login(LoginScreen::default()));
        if let Screen::Plugins(list) = previous {
            self.screen = Screen::PluginSetting { list, setting };
        } else {
            self.screen = previous;
        }
    }

    fn close_plugin(&mut self) {
        let previous = std::mem::replace(&mut self.screen, Screen::Login(LoginScreen::default()));
        self.screen = match previous {
            Screen::PluginSetting { list, .. } => Screen::Plugins(list),
            other => other,
        };
    }

    fn toggle_theme(&mut self) {
        self.theme.toggle();
        self.settings.theme = self.theme.variant();
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "failed to save theme");
        }
    }
}
