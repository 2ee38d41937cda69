use crate::api::ApiError;
use crate::auth::{LoginState, SessionStore, normalize_token};
use crate::cache::Resolved;
use crate::clipboard::Clipboard;
use crate::config::{Config, Keybindings, matches_key};
use crate::event::{AppEvent, Dispatch, Mutation};
use crate::interaction::StatusLine;
use crate::pages::dashboard::{Dashboard, DashboardFocus};
use crate::pages::settings::Settings;
use crate::pages::threads::Threads;
use crate::refresh::AutoRefresh;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tracing::{debug, info, warn};
use tui_textarea::TextArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Inbox,
    Threads,
    Settings,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Inbox, Route::Threads, Route::Settings];

    pub fn label(self) -> &'static str {
        match self {
            Route::Inbox => "Inbox",
            Route::Threads => "Threads",
            Route::Settings => "Settings",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Route::Inbox => Route::Threads,
            Route::Threads => Route::Settings,
            Route::Settings => Route::Inbox,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Route::Inbox => Route::Settings,
            Route::Threads => Route::Inbox,
            Route::Settings => Route::Threads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Waiting for `/auth/me`.
    Checking,
    SignedIn,
    SignedOut(LoginState),
}

fn open_in_browser(url: &str) -> std::io::Result<()> {
    open::that(url)
}

fn token_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_placeholder_text("Paste the access_token cookie value");
    input.set_cursor_line_style(ratatui::style::Style::default());
    input
}

pub struct App {
    pub route: Route,
    pub session: Session,
    pub dashboard: Dashboard,
    pub threads: Threads,
    pub settings: Settings,
    pub status: StatusLine,
    pub token_input: TextArea<'static>,
    pub should_quit: bool,
    refresh: AutoRefresh,
    keys: Keybindings,
    dispatch: Dispatch,
    sessions: Box<dyn SessionStore>,
    clipboard: Box<dyn Clipboard>,
    browser: fn(&str) -> std::io::Result<()>,
}

impl App {
    pub fn new(
        config: &Config,
        dispatch: Dispatch,
        sessions: Box<dyn SessionStore>,
        clipboard: Box<dyn Clipboard>,
        now: Instant,
    ) -> Self {
        Self {
            route: Route::Inbox,
            session: Session::Checking,
            dashboard: Dashboard::new(config.filters.clone()),
            threads: Threads::new(),
            settings: Settings::new(),
            status: StatusLine::default(),
            token_input: token_input(),
            should_quit: false,
            refresh: AutoRefresh::new(config.refresh_interval(), now),
            keys: config.keybindings.clone(),
            dispatch,
            sessions,
            clipboard,
            browser: open_in_browser,
        }
    }

    /// Restores the stored session, or goes straight to login without one.
    pub fn start(&mut self) {
        match self.sessions.load() {
            Ok(Some(token)) => {
                debug!("restored stored session");
                self.dispatch.backend().set_session(Some(token));
                self.session = Session::Checking;
                self.pump();
            }
            Ok(None) => self.begin_login(),
            Err(e) => {
                warn!("could not read stored session: {:#}", e);
                self.begin_login();
            }
        }
    }

    pub fn is_refresh_paused(&self) -> bool {
        !self.refresh.is_focused()
    }

    /// Starts every fetch the visible screen is missing.
    pub fn pump(&mut self) {
        match self.session {
            Session::Checking => self.settings.sync_session(&self.dispatch),
            Session::SignedOut(_) => {}
            Session::SignedIn => match self.route {
                Route::Inbox => {
                    self.dashboard.sync(&self.dispatch);
                    if self.dashboard.show_selector {
                        self.settings.sync_selector(&self.dispatch);
                    } else {
                        self.settings.sync_session(&self.dispatch);
                    }
                }
                Route::Threads => self.threads.sync(&self.dispatch),
                Route::Settings => self.settings.sync(&self.dispatch),
            },
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.dashboard.copy.tick(now);
        self.status.tick(now);
        if self.refresh.poll(now) && self.session == Session::SignedIn && self.route == Route::Inbox
        {
            debug!("auto refresh");
            self.dashboard.refresh();
        }
        self.pump();
    }

    pub fn set_focused(&mut self, focused: bool) {
        debug!("terminal focus {}", focused);
        self.refresh.set_focused(focused);
    }

    pub fn handle_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Emails {
                key,
                ticket,
                result,
            } => {
                let outcome = self.dashboard.handle_emails(key, ticket, result, now);
                self.report(outcome, "Could not refresh emails", now);
            }
            AppEvent::EmailDetail {
                key,
                ticket,
                result,
            } => {
                let outcome = self.dashboard.handle_detail(key, ticket, result, now);
                self.report(outcome, "Could not refresh this email", now);
            }
            AppEvent::Threads {
                key,
                ticket,
                result,
            } => {
                let outcome = self.threads.handle(key, ticket, result, now);
                self.report(outcome, "Could not refresh threads", now);
            }
            AppEvent::Models { ticket, result } => {
                let outcome = self.settings.handle_models(ticket, result, now);
                self.report(outcome, "Could not refresh models", now);
            }
            AppEvent::Styles { ticket, result } => {
                let outcome = self.settings.handle_styles(ticket, result, now);
                self.report(outcome, "Could not refresh summary styles", now);
            }
            AppEvent::Digest { ticket, result } => {
                let outcome = self.settings.handle_digest(ticket, result, now);
                self.report(outcome, "Could not refresh digest settings", now);
            }
            AppEvent::CurrentUser { ticket, result } => {
                let accepted = result.is_ok();
                let outcome = self.settings.handle_me(ticket, result, now);
                let signed_out = matches!(self.session, Session::SignedOut(_));
                if outcome == Resolved::Discarded {
                    debug!("dropped session check from a previous session");
                } else if accepted && self.session == Session::Checking {
                    info!("signed in");
                    self.session = Session::SignedIn;
                    self.refresh.reset(now);
                } else if !accepted && !signed_out {
                    info!("session rejected, showing login");
                    self.show_login();
                }
            }
            AppEvent::AuthUrl(result) => self.finish_auth_url(result),
            AppEvent::Mutation { mutation, result } => self.finish_mutation(mutation, result, now),
        }
        self.pump();
    }

    /// Toasts a failed refetch whose older data is still shown.
    fn report(&mut self, outcome: Resolved, message: &str, now: Instant) {
        if outcome.is_refresh_failure() {
            self.status.error(message, now);
        }
    }

    fn begin_login(&mut self) {
        self.session = Session::SignedOut(LoginState::FetchingUrl);
        self.dispatch
            .spawn(|api| async move { AppEvent::AuthUrl(api.gmail_auth_url().await) });
    }

    fn finish_auth_url(&mut self, result: Result<String, ApiError>) {
        if self.session != Session::SignedOut(LoginState::FetchingUrl) {
            return;
        }
        match result {
            Ok(url) => {
                self.open_url(&url);
                self.session = Session::SignedOut(LoginState::AwaitingToken { url });
            }
            Err(e) => {
                warn!("could not get login url: {}", e);
                self.session = Session::SignedOut(LoginState::Failed);
            }
        }
    }

    fn open_url(&self, url: &str) {
        if let Err(e) = (self.browser)(url) {
            warn!("could not open browser: {}", e);
        }
    }

    /// Drops user data and returns to the login screen. The keyring is left alone.
    fn show_login(&mut self) {
        self.dashboard.emails.clear();
        self.dashboard.details.clear();
        self.dashboard.close_detail();
        self.threads.cache.clear();
        self.settings.clear();
        self.route = Route::Inbox;
        self.begin_login();
    }

    fn submit_token(&mut self, now: Instant) {
        let input = self.token_input.lines().join("");
        let Some(token) = normalize_token(&input) else {
            self.status.error("Paste the access_token value first", now);
            return;
        };
        if let Err(e) = self.sessions.save(&token) {
            warn!("could not store session: {:#}", e);
            self.status.error("Could not save the session to the keyring", now);
        }
        self.dispatch.backend().set_session(Some(token));
        self.token_input = token_input();
        self.settings.me.clear();
        self.session = Session::Checking;
    }

    fn logout(&self) {
        info!("signing out");
        self.dispatch
            .mutate(Mutation::Logout, |api| async move { api.logout().await });
    }

    fn finish_mutation(&mut self, mutation: Mutation, result: Result<(), ApiError>, now: Instant) {
        match result {
            Ok(()) => {
                info!("{:?} succeeded", mutation);
                self.status.info(mutation.success_message(), now);
                match mutation {
                    Mutation::Resummarize { .. } => self.dashboard.on_summarized(),
                    Mutation::UpdateLlm => self.settings.on_llm_updated(),
                    Mutation::UpdateDigest => self.settings.on_digest_updated(),
                    Mutation::Logout => {
                        if let Err(e) = self.sessions.clear() {
                            warn!("could not clear stored session: {:#}", e);
                        }
                        self.show_login();
                    }
                }
            }
            Err(e) => {
                warn!("{:?} failed: {}", mutation, e);
                self.status.error(mutation.failure_message(), now);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match self.session.clone() {
            Session::SignedOut(state) => self.handle_login_key(key, state, now),
            Session::Checking => {
                if matches_key(key, &self.keys.quit) {
                    self.should_quit = true;
                }
            }
            Session::SignedIn => self.handle_signed_in_key(key, now),
        }
        self.pump();
    }

    fn handle_login_key(&mut self, key: KeyEvent, state: LoginState, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('c')) {
            self.should_quit = true;
            return;
        }
        match state {
            LoginState::FetchingUrl => {}
            LoginState::Failed => {
                if key.code == KeyCode::Char('r') {
                    self.begin_login();
                }
            }
            LoginState::AwaitingToken { url } => match key.code {
                KeyCode::Enter => self.submit_token(now),
                KeyCode::Char('o') if ctrl => self.open_url(&url),
                _ => {
                    self.token_input.input(key);
                }
            },
        }
    }

    fn handle_signed_in_key(&mut self, key: KeyEvent, now: Instant) {
        if self.route == Route::Inbox {
            if self.dashboard.detail.is_some() {
                self.handle_detail_key(key);
                return;
            }
            if self.dashboard.focus == DashboardFocus::Search {
                self.handle_search_key(key);
                return;
            }
        }

        if matches_key(key, &self.keys.quit) {
            self.should_quit = true;
        } else if matches_key(key, &self.keys.next_route) {
            self.route = self.route.next();
        } else if matches_key(key, &self.keys.prev_route) {
            self.route = self.route.prev();
        } else if matches_key(key, &self.keys.logout) {
            self.logout();
        } else {
            match self.route {
                Route::Inbox => self.handle_inbox_key(key, now),
                Route::Threads => self.handle_threads_key(key),
                Route::Settings => self.handle_settings_key(key, now),
            }
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc
            || matches_key(key, &self.keys.view_email)
            || matches_key(key, &self.keys.quit)
        {
            self.dashboard.close_detail();
        } else if matches_key(key, &self.keys.move_down) {
            self.dashboard.detail_scroll = self.dashboard.detail_scroll.saturating_add(1);
        } else if matches_key(key, &self.keys.move_up) {
            self.dashboard.detail_scroll = self.dashboard.detail_scroll.saturating_sub(1);
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.dashboard.focus = DashboardFocus::List,
            _ => {
                if self.dashboard.search.input(key) {
                    self.dashboard.search_changed();
                }
            }
        }
    }

    fn handle_inbox_key(&mut self, key: KeyEvent, now: Instant) {
        if self.dashboard.focus == DashboardFocus::Selector {
            if key.code == KeyCode::Esc || matches_key(key, &self.keys.toggle_selector) {
                self.dashboard.show_selector = false;
                self.dashboard.focus = DashboardFocus::List;
            } else if matches_key(key, &self.keys.move_down) {
                self.settings.move_selector_cursor(true);
            } else if matches_key(key, &self.keys.move_up) {
                self.settings.move_selector_cursor(false);
            } else if matches_key(key, &self.keys.toggle) {
                if let Some(row) = self.settings.selected_selector_row() {
                    self.settings
                        .activate(row, &self.dispatch, &mut self.status, now);
                }
            }
            return;
        }

        if matches_key(key, &self.keys.move_down) {
            self.dashboard.move_cursor(true);
        } else if matches_key(key, &self.keys.move_up) {
            self.dashboard.move_cursor(false);
        } else if matches_key(key, &self.keys.next_tab) {
            self.dashboard.next_tab();
        } else if matches_key(key, &self.keys.prev_tab) {
            self.dashboard.prev_tab();
        } else if matches_key(key, &self.keys.toggle) {
            self.dashboard.toggle_selected();
        } else if matches_key(key, &self.keys.refresh) {
            if self.dashboard.refresh() {
                self.refresh.reset(now);
            } else {
                debug!("refresh ignored, fetch in flight");
            }
        } else if matches_key(key, &self.keys.resummarize) {
            if self
                .dashboard
                .resummarize(&self.dispatch, self.settings.current_user())
            {
                self.status.info("Regenerating summary…", now);
            }
        } else if matches_key(key, &self.keys.view_email) {
            self.dashboard.open_detail();
        } else if matches_key(key, &self.keys.search) {
            self.dashboard.focus = DashboardFocus::Search;
        } else if matches_key(key, &self.keys.toggle_selector) {
            self.dashboard.show_selector = true;
            self.dashboard.focus = DashboardFocus::Selector;
        } else if let KeyCode::Char(c @ '1'..='9') = key.code {
            let index = c as usize - '1' as usize;
            match self
                .dashboard
                .copy_reply(index, self.clipboard.as_mut(), now)
            {
                Ok(copied) => debug!("copy reply {} -> {}", index + 1, copied),
                Err(e) => {
                    warn!("clipboard: {:#}", e);
                    self.status.error("Could not copy to clipboard", now);
                }
            }
        }
    }

    fn handle_threads_key(&mut self, key: KeyEvent) {
        if matches_key(key, &self.keys.move_down) {
            self.threads.move_cursor(true);
        } else if matches_key(key, &self.keys.move_up) {
            self.threads.move_cursor(false);
        } else if matches_key(key, &self.keys.toggle) {
            self.threads.toggle_selected();
        } else if matches_key(key, &self.keys.next_tab) {
            self.threads.next_page();
        } else if matches_key(key, &self.keys.prev_tab) {
            self.threads.prev_page();
        } else if matches_key(key, &self.keys.refresh) {
            self.threads.refresh();
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent, now: Instant) {
        if matches_key(key, &self.keys.move_down) {
            self.settings.move_cursor(true);
        } else if matches_key(key, &self.keys.move_up) {
            self.settings.move_cursor(false);
        } else if matches_key(key, &self.keys.refresh) {
            self.settings.refresh();
        } else if let Some(row) = self.settings.selected_row() {
            if matches_key(key, &self.keys.toggle) {
                self.settings
                    .activate(row, &self.dispatch, &mut self.status, now);
            } else if matches_key(key, &self.keys.next_tab) {
                self.settings
                    .adjust(row, 1, &self.dispatch, &mut self.status, now);
            } else if matches_key(key, &self.keys.prev_tab) {
                self.settings
                    .adjust(row, -1, &self.dispatch, &mut self.status, now);
            }
        }
    }

    /// Bracketed paste goes to whichever text input has focus.
    pub fn handle_paste(&mut self, text: &str) {
        let flat = text.replace(['\r', '\n'], "");
        let awaiting_token = matches!(
            self.session,
            Session::SignedOut(LoginState::AwaitingToken { .. })
        );
        let searching = self.session == Session::SignedIn
            && self.route == Route::Inbox
            && self.dashboard.focus == DashboardFocus::Search;

        if awaiting_token {
            self.token_input.insert_str(&flat);
        } else if searching && self.dashboard.search.insert_str(&flat) {
            self.dashboard.search_changed();
            self.pump();
        }
    }
}
