use crate::api::{ApiError, EmailQuery};
use crate::cache::{QueryCache, QueryKey, Resolved, Ticket};
use crate::clipboard::Clipboard;
use crate::config::Filters;
use crate::event::{AppEvent, Dispatch, Mutation};
use crate::interaction::{CopyFeedback, Expansion};
use crate::models::{CurrentUser, Email, EmailListResponse};
use anyhow::Result;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};
use tui_textarea::TextArea;

/// Style used when neither the email nor the user carries one.
const FALLBACK_STYLE: &str = "bullet_points";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabFilter {
    All,
    ActionRequired,
    Urgent,
    Work,
    Newsletter,
}

pub const FILTER_TABS: [TabFilter; 5] = [
    TabFilter::All,
    TabFilter::ActionRequired,
    TabFilter::Urgent,
    TabFilter::Work,
    TabFilter::Newsletter,
];

impl TabFilter {
    pub fn label(self) -> &'static str {
        match self {
            TabFilter::All => "All",
            TabFilter::ActionRequired => "Action required",
            TabFilter::Urgent => "Urgent",
            TabFilter::Work => "Work",
            TabFilter::Newsletter => "Newsletters",
        }
    }
}

/// The list request for a tab: always page 1, the tab's filter, and the search text.
pub fn email_query(tab: TabFilter, search: &str, filters: &Filters) -> EmailQuery {
    let search = search.trim();
    let mut query = EmailQuery {
        page: Some(1),
        search: (!search.is_empty()).then(|| search.to_string()),
        ..Default::default()
    };
    match tab {
        TabFilter::All => {}
        TabFilter::ActionRequired => query.action_required = Some(true),
        TabFilter::Urgent => query.urgency_min = Some(4),
        TabFilter::Work => query.category = Some(filters.work_category.clone()),
        TabFilter::Newsletter => query.category = Some(filters.newsletter_category.clone()),
    }
    query
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardFocus {
    #[default]
    List,
    Search,
    Selector,
}

pub struct Dashboard {
    pub tab: usize,
    pub search: TextArea<'static>,
    pub focus: DashboardFocus,
    pub cursor: usize,
    /// First card drawn; the renderer moves it to keep the cursor visible.
    pub offset: usize,
    pub show_selector: bool,
    pub copy: CopyFeedback,
    /// Email id shown in the body popup.
    pub detail: Option<String>,
    pub detail_scroll: u16,
    pub emails: QueryCache<EmailListResponse>,
    pub details: QueryCache<Email>,
    expansions: HashMap<String, Expansion>,
    filters: Filters,
}

impl Dashboard {
    pub fn new(filters: Filters) -> Self {
        let mut search = TextArea::default();
        search.set_placeholder_text("Search emails...");
        search.set_cursor_line_style(ratatui::style::Style::default());
        Self {
            tab: 0,
            search,
            focus: DashboardFocus::List,
            cursor: 0,
            offset: 0,
            show_selector: false,
            copy: CopyFeedback::default(),
            detail: None,
            detail_scroll: 0,
            emails: QueryCache::default(),
            details: QueryCache::default(),
            expansions: HashMap::new(),
            filters,
        }
    }

    pub fn active_tab(&self) -> TabFilter {
        FILTER_TABS[self.tab % FILTER_TABS.len()]
    }

    pub fn search_text(&self) -> String {
        self.search.lines().join(" ")
    }

    pub fn query(&self) -> EmailQuery {
        email_query(self.active_tab(), &self.search_text(), &self.filters)
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::with_params("emails", self.query().params())
    }

    fn detail_key(id: &str) -> QueryKey {
        QueryKey::new("email").param("id", id)
    }

    /// Starts whatever fetches the current view is missing.
    pub fn sync(&mut self, dispatch: &Dispatch) {
        let key = self.key();
        if self.emails.needs_fetch(&key) {
            if let Some(ticket) = self.emails.begin(&key) {
                let query = self.query();
                debug!("fetching emails {:?}", key.params());
                dispatch.spawn(move |api| async move {
                    let result = api.list_emails(&query).await;
                    AppEvent::Emails {
                        key,
                        ticket,
                        result,
                    }
                });
            }
        }

        if let Some(id) = self.detail.clone() {
            let key = Self::detail_key(&id);
            if self.details.needs_fetch(&key) {
                if let Some(ticket) = self.details.begin(&key) {
                    dispatch.spawn(move |api| async move {
                        let result = api.get_email(&id).await;
                        AppEvent::EmailDetail {
                            key,
                            ticket,
                            result,
                        }
                    });
                }
            }
        }
    }

    pub fn handle_emails(
        &mut self,
        key: QueryKey,
        ticket: Ticket,
        result: Result<EmailListResponse, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            warn!("email list {:?} failed: {}", key.params(), e);
        }
        let outcome = self.emails.resolve(&key, ticket, result, now);
        let len = self.visible_emails().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
        outcome
    }

    pub fn handle_detail(
        &mut self,
        key: QueryKey,
        ticket: Ticket,
        result: Result<Email, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            warn!("email detail {:?} failed: {}", key.params(), e);
        }
        self.details.resolve(&key, ticket, result, now)
    }

    pub fn visible_emails(&self) -> &[Email] {
        self.emails
            .data(&self.key())
            .map(|resp| resp.emails.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_email(&self) -> Option<&Email> {
        self.visible_emails().get(self.cursor)
    }

    pub fn detail_view(&self) -> Option<crate::cache::View<'_, Email>> {
        let id = self.detail.as_deref()?;
        Some(self.details.view(&Self::detail_key(id)))
    }

    pub fn select_tab(&mut self, index: usize) {
        self.tab = index % FILTER_TABS.len();
        self.reset_position();
    }

    pub fn next_tab(&mut self) {
        self.select_tab(self.tab + 1);
    }

    pub fn prev_tab(&mut self) {
        self.select_tab(self.tab + FILTER_TABS.len() - 1);
    }

    /// Called after every search edit; the key change triggers the fetch.
    pub fn search_changed(&mut self) {
        self.reset_position();
    }

    fn reset_position(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_cursor(&mut self, down: bool) {
        let len = self.visible_emails().len();
        if down {
            if self.cursor + 1 < len {
                self.cursor += 1;
            }
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    pub fn expansion(&self, id: &str) -> Expansion {
        self.expansions.get(id).copied().unwrap_or_default()
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_email().map(|e| e.id.clone()) {
            let next = self.expansion(&id).toggle();
            self.expansions.insert(id, next);
        }
    }

    /// Manual refresh; ignored while the current list is already loading.
    pub fn refresh(&mut self) -> bool {
        let key = self.key();
        if self.emails.is_fetching(&key) {
            return false;
        }
        self.emails.invalidate_key(&key);
        true
    }

    /// Re-summarizes the selected email with its current style and model,
    /// falling back to the user's defaults.
    pub fn resummarize(&self, dispatch: &Dispatch, user: Option<&CurrentUser>) -> bool {
        let Some(email) = self.selected_email() else {
            return false;
        };
        let id = email.id.clone();
        let style = email
            .summary
            .as_ref()
            .map(|s| s.style.clone())
            .or_else(|| user.and_then(|u| u.default_summary_style.clone()))
            .unwrap_or_else(|| FALLBACK_STYLE.to_string());
        let model = email
            .summary
            .as_ref()
            .map(|s| s.model_used.clone())
            .or_else(|| user.and_then(|u| u.default_model.clone()));

        debug!("resummarize {} style={} model={:?}", id, style, model);
        let mutation = Mutation::Resummarize {
            email_id: id.clone(),
        };
        dispatch.mutate(mutation, move |api| async move {
            let result = api.summarize(&id, &style, model).await?;
            debug!(
                "summary for {} by {:?}, {:?} tokens",
                id, result.model_used, result.tokens_used
            );
            Ok(())
        });
        true
    }

    pub fn on_summarized(&mut self) {
        self.emails.invalidate("emails");
        self.details.invalidate("email");
    }

    /// Copies reply suggestion `index` of the selected, expanded email.
    pub fn copy_reply(
        &mut self,
        index: usize,
        clipboard: &mut dyn Clipboard,
        now: Instant,
    ) -> Result<bool> {
        let Some(email) = self.selected_email() else {
            return Ok(false);
        };
        if !self.expansion(&email.id).is_expanded() {
            return Ok(false);
        }
        let Some(reply) = email
            .summary
            .as_ref()
            .and_then(|s| s.reply_suggestions.get(index))
            .cloned()
        else {
            return Ok(false);
        };
        clipboard.copy(&reply)?;
        self.copy.copied(reply, now);
        Ok(true)
    }

    pub fn open_detail(&mut self) {
        self.detail = self.selected_email().map(|e| e.id.clone());
        self.detail_scroll = 0;
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;
    use crate::clipboard::recording::RecordingClipboard;
    use crate::models::fixtures;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn page(emails: Vec<Email>) -> EmailListResponse {
        EmailListResponse {
            total: emails.len() as u64,
            emails,
            page: 1,
            page_size: 20,
        }
    }

    async fn deliver(dashboard: &mut Dashboard, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        match rx.recv().await.unwrap() {
            AppEvent::Emails {
                key,
                ticket,
                result,
            } => {
                dashboard.handle_emails(key, ticket, result, Instant::now());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_each_tab_merges_its_filter_with_search() {
        let filters = Filters::default();
        let expected: [Vec<(&str, String)>; 5] = [
            vec![],
            vec![("action_required", "true".to_string())],
            vec![("urgency_min", "4".to_string())],
            vec![("category", "工作信件".to_string())],
            vec![("category", "電子報".to_string())],
        ];
        for (tab, extra) in FILTER_TABS.iter().zip(expected) {
            let mut want = vec![("page", "1".to_string()), ("search", "invoice".to_string())];
            want.extend(extra);
            assert_eq!(email_query(*tab, " invoice ", &filters).params(), want);
        }
        assert_eq!(
            email_query(TabFilter::Urgent, "", &filters).params(),
            vec![("page", "1".to_string()), ("urgency_min", "4".to_string())]
        );
    }

    #[test]
    fn test_tab_cycling_wraps_and_resets_cursor() {
        let mut dashboard = Dashboard::new(Filters::default());
        dashboard.cursor = 3;
        dashboard.prev_tab();
        assert_eq!(dashboard.active_tab(), TabFilter::Newsletter);
        assert_eq!(dashboard.cursor, 0);
        dashboard.next_tab();
        assert_eq!(dashboard.active_tab(), TabFilter::All);
    }

    #[tokio::test]
    async fn test_sync_requests_current_tab_once() {
        let mut mock = MockBackend::new();
        mock.expect_list_emails()
            .withf(|q| q.action_required == Some(true) && q.page == Some(1) && q.search.is_none())
            .times(1)
            .returning(|_| Ok(page(vec![fixtures::email("a", Some(4.0))])));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut dashboard = Dashboard::new(Filters::default());
        dashboard.select_tab(1);
        dashboard.sync(&dispatch);
        dashboard.sync(&dispatch);
        deliver(&mut dashboard, &mut rx).await;
        dashboard.sync(&dispatch);

        assert_eq!(dashboard.visible_emails().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_tab_result_is_superseded() {
        let mut mock = MockBackend::new();
        mock.expect_list_emails()
            .returning(|q| {
                let id = if q.urgency_min.is_some() { "urgent" } else { "all" };
                Ok(page(vec![fixtures::email(id, None)]))
            });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut dashboard = Dashboard::new(Filters::default());
        dashboard.sync(&dispatch);
        dashboard.select_tab(2);
        dashboard.sync(&dispatch);

        deliver(&mut dashboard, &mut rx).await;
        deliver(&mut dashboard, &mut rx).await;
        assert_eq!(dashboard.selected_email().unwrap().id, "urgent");

        dashboard.select_tab(0);
        assert_eq!(dashboard.selected_email().unwrap().id, "all");
    }

    #[tokio::test]
    async fn test_resummarize_uses_summary_style_and_model() {
        let mut mock = MockBackend::new();
        mock.expect_summarize()
            .withf(|id, style, model| {
                id == "a" && style == "bullet_points" && model.as_deref() == Some("claude-haiku")
            })
            .times(1)
            .returning(|_, _, _| Ok(Default::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut email = fixtures::email("a", Some(2.0));
        email.summary = Some(fixtures::summary(&[]));
        let mut dashboard = Dashboard::new(Filters::default());
        let key = dashboard.key();
        let ticket = dashboard.emails.begin(&key).unwrap();
        dashboard.handle_emails(key, ticket, Ok(page(vec![email])), Instant::now());

        assert!(dashboard.resummarize(&dispatch, None));
        match rx.recv().await.unwrap() {
            AppEvent::Mutation { mutation, result } => {
                assert_eq!(
                    mutation,
                    Mutation::Resummarize {
                        email_id: "a".to_string()
                    }
                );
                assert!(result.is_ok());
            }
            other => panic!("unexpected event {other:?}"),
        }

        dashboard.on_summarized();
        assert!(dashboard.emails.needs_fetch(&dashboard.key()));
    }

    #[tokio::test]
    async fn test_resummarize_without_summary_falls_back_to_user_defaults() {
        let mut mock = MockBackend::new();
        mock.expect_summarize()
            .withf(|_, style, model| style == "bullet_points" && model.as_deref() == Some("claude-haiku"))
            .times(1)
            .returning(|_, _, _| Ok(Default::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut dashboard = Dashboard::new(Filters::default());
        let key = dashboard.key();
        let ticket = dashboard.emails.begin(&key).unwrap();
        let emails = page(vec![fixtures::email("b", None)]);
        dashboard.handle_emails(key, ticket, Ok(emails), Instant::now());

        assert!(dashboard.resummarize(&dispatch, Some(&fixtures::user())));
        assert!(matches!(rx.recv().await, Some(AppEvent::Mutation { .. })));
    }

    #[test]
    fn test_copy_reply_requires_expanded_card() {
        let mut email = fixtures::email("a", None);
        email.summary = Some(fixtures::summary(&["Yes", "No"]));
        let mut dashboard = Dashboard::new(Filters::default());
        let key = dashboard.key();
        let ticket = dashboard.emails.begin(&key).unwrap();
        dashboard.handle_emails(key, ticket, Ok(page(vec![email])), Instant::now());

        let clipboard = RecordingClipboard::default();
        let mut sink = clipboard.clone();
        let t0 = Instant::now();
        assert!(!dashboard.copy_reply(0, &mut sink, t0).unwrap());

        dashboard.toggle_selected();
        assert!(dashboard.copy_reply(1, &mut sink, t0).unwrap());
        assert!(!dashboard.copy_reply(5, &mut sink, t0).unwrap());
        assert_eq!(*clipboard.0.lock().unwrap(), vec!["No".to_string()]);
        assert!(dashboard.copy.is_copied("No"));

        dashboard.copy.tick(t0 + Duration::from_millis(2000));
        assert!(!dashboard.copy.is_copied("No"));
    }

    #[test]
    fn test_manual_refresh_ignored_while_fetching() {
        let mut dashboard = Dashboard::new(Filters::default());
        let key = dashboard.key();
        let ticket = dashboard.emails.begin(&key).unwrap();
        assert!(!dashboard.refresh());
        dashboard.handle_emails(key.clone(), ticket, Ok(page(vec![])), Instant::now());
        assert!(dashboard.refresh());
        assert!(dashboard.emails.needs_fetch(&key));
    }
}
