use crate::api::ApiError;
use crate::cache::{QueryCache, QueryKey, Resolved, Ticket, View};
use crate::event::{AppEvent, Dispatch, Mutation};
use crate::interaction::StatusLine;
use crate::models::{
    CurrentUser, DigestSchedule, DigestUpdate, LlmPreferences, Model, SummaryStyle,
};
use std::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_LANGUAGE: &str = "zh-TW";

pub const LANGUAGES: [(&str, &str); 4] = [
    ("zh-TW", "繁體中文"),
    ("zh-CN", "简体中文"),
    ("en", "English"),
    ("ja", "日本語"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    Model(usize),
    Style(usize),
    Language,
    DigestEnabled,
    SendHour,
    Frequency,
}

fn models_key() -> QueryKey {
    QueryKey::new("models")
}

fn styles_key() -> QueryKey {
    QueryKey::new("styles")
}

fn me_key() -> QueryKey {
    QueryKey::new("me")
}

fn digest_key() -> QueryKey {
    QueryKey::new("digest")
}

/// Rejects anything outside 0-23 before it reaches the server.
pub fn validate_hour(hour: i32) -> Option<u8> {
    u8::try_from(hour).ok().filter(|h| *h <= 23)
}

/// Cycles through `LANGUAGES` starting from `current`; unknown codes start at the default.
pub fn cycle_language(current: &str, forward: bool) -> &'static str {
    let len = LANGUAGES.len();
    let index = LANGUAGES
        .iter()
        .position(|(code, _)| *code == current)
        .unwrap_or(0);
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    LANGUAGES[next].0
}

/// Server-backed preferences: models, styles, the signed-in user and the digest schedule.
#[derive(Default)]
pub struct Settings {
    pub cursor: usize,
    /// Cursor inside the dashboard's model/style panel.
    pub selector_cursor: usize,
    pub models: QueryCache<Vec<Model>>,
    pub styles: QueryCache<Vec<SummaryStyle>>,
    pub me: QueryCache<CurrentUser>,
    pub digest: QueryCache<DigestSchedule>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the session check.
    pub fn sync_session(&mut self, dispatch: &Dispatch) {
        let key = me_key();
        if !self.me.needs_fetch(&key) {
            return;
        }
        if let Some(ticket) = self.me.begin(&key) {
            debug!("checking session");
            dispatch.spawn(move |api| async move {
                AppEvent::CurrentUser {
                    ticket,
                    result: api.current_user().await,
                }
            });
        }
    }

    /// What the model/style panel needs.
    pub fn sync_selector(&mut self, dispatch: &Dispatch) {
        self.sync_session(dispatch);

        let key = models_key();
        if self.models.needs_fetch(&key) {
            if let Some(ticket) = self.models.begin(&key) {
                dispatch.spawn(move |api| async move {
                    AppEvent::Models {
                        ticket,
                        result: api.list_models().await,
                    }
                });
            }
        }

        let key = styles_key();
        if self.styles.needs_fetch(&key) {
            if let Some(ticket) = self.styles.begin(&key) {
                dispatch.spawn(move |api| async move {
                    AppEvent::Styles {
                        ticket,
                        result: api.list_styles().await,
                    }
                });
            }
        }
    }

    pub fn sync(&mut self, dispatch: &Dispatch) {
        self.sync_selector(dispatch);

        let key = digest_key();
        if self.digest.needs_fetch(&key) {
            if let Some(ticket) = self.digest.begin(&key) {
                dispatch.spawn(move |api| async move {
                    AppEvent::Digest {
                        ticket,
                        result: api.get_digest().await,
                    }
                });
            }
        }
    }

    pub fn handle_models(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Model>, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            warn!("models failed: {}", e);
        }
        self.models.resolve(&models_key(), ticket, result, now)
    }

    pub fn handle_styles(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<SummaryStyle>, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            warn!("styles failed: {}", e);
        }
        self.styles.resolve(&styles_key(), ticket, result, now)
    }

    pub fn handle_me(
        &mut self,
        ticket: Ticket,
        result: Result<CurrentUser, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            debug!("session check failed: {}", e);
        }
        self.me.resolve(&me_key(), ticket, result, now)
    }

    pub fn handle_digest(
        &mut self,
        ticket: Ticket,
        result: Result<DigestSchedule, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            warn!("digest failed: {}", e);
        }
        self.digest.resolve(&digest_key(), ticket, result, now)
    }

    pub fn models(&self) -> &[Model] {
        self.models.data(&models_key()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn styles(&self) -> &[SummaryStyle] {
        self.styles.data(&styles_key()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn models_view(&self) -> View<'_, Vec<Model>> {
        self.models.view(&models_key())
    }

    pub fn styles_view(&self) -> View<'_, Vec<SummaryStyle>> {
        self.styles.view(&styles_key())
    }

    pub fn digest_view(&self) -> View<'_, DigestSchedule> {
        self.digest.view(&digest_key())
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.me.data(&me_key())
    }

    pub fn language(&self) -> &str {
        self.current_user()
            .and_then(|u| u.summary_language.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// The schedule as last confirmed by the server, or the form defaults.
    pub fn schedule(&self) -> DigestSchedule {
        self.digest.data(&digest_key()).cloned().unwrap_or_default()
    }

    pub fn is_default_model(&self, id: &str) -> bool {
        self.current_user()
            .and_then(|u| u.default_model.as_deref())
            .is_some_and(|m| m == id)
    }

    pub fn is_default_style(&self, id: &str) -> bool {
        self.current_user()
            .and_then(|u| u.default_summary_style.as_deref())
            .is_some_and(|s| s == id)
    }

    /// Model and style entries, in panel order.
    pub fn selector_rows(&self) -> Vec<SettingsRow> {
        (0..self.models().len())
            .map(SettingsRow::Model)
            .chain((0..self.styles().len()).map(SettingsRow::Style))
            .collect()
    }

    /// Every row of the settings page.
    pub fn rows(&self) -> Vec<SettingsRow> {
        let mut rows = self.selector_rows();
        rows.extend([
            SettingsRow::Language,
            SettingsRow::DigestEnabled,
            SettingsRow::SendHour,
            SettingsRow::Frequency,
        ]);
        rows
    }

    pub fn selected_row(&self) -> Option<SettingsRow> {
        self.rows().get(self.cursor).copied()
    }

    pub fn selected_selector_row(&self) -> Option<SettingsRow> {
        self.selector_rows().get(self.selector_cursor).copied()
    }

    pub fn move_cursor(&mut self, down: bool) {
        self.cursor = step(self.cursor, self.rows().len(), down);
    }

    pub fn move_selector_cursor(&mut self, down: bool) {
        self.selector_cursor = step(self.selector_cursor, self.selector_rows().len(), down);
    }

    /// Enter on a row.
    pub fn activate(&self, row: SettingsRow, dispatch: &Dispatch, status: &mut StatusLine, now: Instant) {
        match row {
            SettingsRow::Model(i) => {
                if let Some(model) = self.models().get(i) {
                    self.update_llm(
                        LlmPreferences {
                            default_model: Some(model.id.clone()),
                            ..Default::default()
                        },
                        dispatch,
                    );
                }
            }
            SettingsRow::Style(i) => {
                if let Some(style) = self.styles().get(i) {
                    self.update_llm(
                        LlmPreferences {
                            default_summary_style: Some(style.id.clone()),
                            ..Default::default()
                        },
                        dispatch,
                    );
                }
            }
            _ => self.adjust(row, 1, dispatch, status, now),
        }
    }

    /// Left/right on a row. `delta` is +1 or -1.
    pub fn adjust(
        &self,
        row: SettingsRow,
        delta: i32,
        dispatch: &Dispatch,
        status: &mut StatusLine,
        now: Instant,
    ) {
        let schedule = self.schedule();
        match row {
            SettingsRow::Language => {
                let language = cycle_language(self.language(), delta > 0);
                self.update_llm(
                    LlmPreferences {
                        summary_language: Some(language.to_string()),
                        ..Default::default()
                    },
                    dispatch,
                );
            }
            SettingsRow::DigestEnabled => self.update_digest(
                DigestUpdate {
                    is_enabled: Some(!schedule.is_enabled),
                    ..Default::default()
                },
                dispatch,
            ),
            SettingsRow::SendHour => {
                self.set_send_hour(i32::from(schedule.send_at_hour) + delta, dispatch, status, now);
            }
            SettingsRow::Frequency => self.update_digest(
                DigestUpdate {
                    frequency: Some(schedule.frequency.next()),
                    ..Default::default()
                },
                dispatch,
            ),
            SettingsRow::Model(_) | SettingsRow::Style(_) => {}
        }
    }

    /// Returns false, with an error toast, when the hour is out of range.
    pub fn set_send_hour(
        &self,
        hour: i32,
        dispatch: &Dispatch,
        status: &mut StatusLine,
        now: Instant,
    ) -> bool {
        match validate_hour(hour) {
            Some(hour) => {
                self.update_digest(
                    DigestUpdate {
                        send_at_hour: Some(hour),
                        ..Default::default()
                    },
                    dispatch,
                );
                true
            }
            None => {
                status.error("Send hour must be between 0 and 23", now);
                false
            }
        }
    }

    pub fn update_llm(&self, prefs: LlmPreferences, dispatch: &Dispatch) {
        debug!("update llm {:?}", prefs);
        dispatch.mutate(Mutation::UpdateLlm, move |api| async move {
            api.update_llm(&prefs).await
        });
    }

    pub fn update_digest(&self, update: DigestUpdate, dispatch: &Dispatch) {
        debug!("update digest {:?}", update);
        dispatch.mutate(Mutation::UpdateDigest, move |api| async move {
            api.update_digest(&update).await
        });
    }

    pub fn on_llm_updated(&mut self) {
        self.me.invalidate("me");
    }

    pub fn on_digest_updated(&mut self) {
        self.digest.invalidate("digest");
    }

    /// Manual refresh of every settings query that is not already loading.
    pub fn refresh(&mut self) {
        if !self.models.is_fetching(&models_key()) {
            self.models.invalidate_key(&models_key());
        }
        if !self.styles.is_fetching(&styles_key()) {
            self.styles.invalidate_key(&styles_key());
        }
        if !self.me.is_fetching(&me_key()) {
            self.me.invalidate_key(&me_key());
        }
        if !self.digest.is_fetching(&digest_key()) {
            self.digest.invalidate_key(&digest_key());
        }
    }

    /// Drops everything tied to the signed-in user.
    pub fn clear(&mut self) {
        self.me.clear();
        self.digest.clear();
        self.cursor = 0;
        self.selector_cursor = 0;
    }
}

fn step(cursor: usize, len: usize, down: bool) -> usize {
    if down {
        if cursor + 1 < len { cursor + 1 } else { cursor }
    } else {
        cursor.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;
    use crate::models::{DigestFrequency, fixtures};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn loaded() -> Settings {
        let mut settings = Settings::new();
        let now = Instant::now();
        let t = settings.models.begin(&models_key()).unwrap();
        settings.handle_models(t, Ok(fixtures::models()), now);
        let t = settings.styles.begin(&styles_key()).unwrap();
        settings.handle_styles(t, Ok(fixtures::styles()), now);
        let t = settings.me.begin(&me_key()).unwrap();
        settings.handle_me(t, Ok(fixtures::user()), now);
        let t = settings.digest.begin(&digest_key()).unwrap();
        settings.handle_digest(t, Ok(DigestSchedule::default()), now);
        settings
    }

    async fn mutation(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> (Mutation, bool) {
        match rx.recv().await.unwrap() {
            AppEvent::Mutation { mutation, result } => (mutation, result.is_ok()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_validate_hour() {
        assert_eq!(validate_hour(0), Some(0));
        assert_eq!(validate_hour(23), Some(23));
        assert_eq!(validate_hour(24), None);
        assert_eq!(validate_hour(-1), None);
    }

    #[test]
    fn test_cycle_language() {
        assert_eq!(cycle_language("zh-TW", true), "zh-CN");
        assert_eq!(cycle_language("ja", true), "zh-TW");
        assert_eq!(cycle_language("zh-TW", false), "ja");
        assert_eq!(cycle_language("fr", true), "zh-CN");
    }

    #[test]
    fn test_rows_and_defaults() {
        let settings = loaded();
        assert_eq!(settings.selector_rows().len(), 4);
        assert_eq!(settings.rows().len(), 8);
        assert!(settings.is_default_model("claude-haiku"));
        assert!(!settings.is_default_model("gpt-4o"));
        assert!(settings.is_default_style("bullet_points"));
        assert_eq!(settings.language(), "en");
        assert_eq!(Settings::new().language(), DEFAULT_LANGUAGE);
    }

    #[tokio::test]
    async fn test_out_of_range_hour_sends_nothing() {
        let mut mock = MockBackend::new();
        mock.expect_update_digest().times(0);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let settings = loaded();
        let mut status = StatusLine::default();
        assert!(!settings.set_send_hour(24, &dispatch, &mut status, Instant::now()));
        assert!(!settings.set_send_hour(-1, &dispatch, &mut status, Instant::now()));
        assert_eq!(
            status.current().map(|t| t.message.as_str()),
            Some("Send hour must be between 0 and 23")
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_frequency_toggles_to_weekly() {
        let mut mock = MockBackend::new();
        mock.expect_update_digest()
            .withf(|u| {
                *u == DigestUpdate {
                    frequency: Some(DigestFrequency::Weekly),
                    ..Default::default()
                }
            })
            .times(1)
            .returning(|_| Ok(()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut settings = loaded();
        let mut status = StatusLine::default();
        settings.activate(SettingsRow::Frequency, &dispatch, &mut status, Instant::now());
        assert_eq!(mutation(&mut rx).await, (Mutation::UpdateDigest, true));

        settings.on_digest_updated();
        assert!(settings.digest.needs_fetch(&digest_key()));
        assert!(!settings.me.needs_fetch(&me_key()));
    }

    #[tokio::test]
    async fn test_choosing_model_updates_llm_prefs() {
        let mut mock = MockBackend::new();
        mock.expect_update_llm()
            .withf(|p| p.default_model.as_deref() == Some("gpt-4o") && p.default_summary_style.is_none())
            .times(1)
            .returning(|_| Ok(()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut settings = loaded();
        let mut status = StatusLine::default();
        settings.move_selector_cursor(true);
        let row = settings.selected_selector_row().unwrap();
        assert_eq!(row, SettingsRow::Model(1));
        settings.activate(row, &dispatch, &mut status, Instant::now());
        assert_eq!(mutation(&mut rx).await, (Mutation::UpdateLlm, true));

        settings.on_llm_updated();
        assert!(settings.me.needs_fetch(&me_key()));
    }

    #[tokio::test]
    async fn test_send_hour_steps_from_current_schedule() {
        let mut mock = MockBackend::new();
        mock.expect_update_digest()
            .withf(|u| u.send_at_hour == Some(7) && u.is_enabled.is_none())
            .times(1)
            .returning(|_| Ok(()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let settings = loaded();
        let mut status = StatusLine::default();
        settings.adjust(SettingsRow::SendHour, -1, &dispatch, &mut status, Instant::now());
        assert_eq!(mutation(&mut rx).await, (Mutation::UpdateDigest, true));
    }
}
