use crate::api::ApiError;
use crate::cache::{QueryCache, QueryKey, Resolved, Ticket};
use crate::event::{AppEvent, Dispatch};
use crate::interaction::Expansion;
use crate::models::{Thread, ThreadsResponse};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

pub const THREADS_PAGE_SIZE: u64 = 20;

#[derive(Default)]
pub struct Threads {
    pub page: u32,
    pub cursor: usize,
    /// First card drawn; the renderer moves it to keep the cursor visible.
    pub offset: usize,
    pub cache: QueryCache<ThreadsResponse>,
    expansions: HashMap<String, Expansion>,
}

impl Threads {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new("threads").param("page", self.page)
    }

    pub fn sync(&mut self, dispatch: &Dispatch) {
        let key = self.key();
        if !self.cache.needs_fetch(&key) {
            return;
        }
        let Some(ticket) = self.cache.begin(&key) else {
            return;
        };
        let page = self.page;
        debug!("fetching threads page {}", page);
        dispatch.spawn(move |api| async move {
            let result = api.list_threads(page).await;
            AppEvent::Threads {
                key,
                ticket,
                result,
            }
        });
    }

    pub fn handle(
        &mut self,
        key: QueryKey,
        ticket: Ticket,
        result: Result<ThreadsResponse, ApiError>,
        now: Instant,
    ) -> Resolved {
        if let Err(e) = &result {
            warn!("threads {:?} failed: {}", key.params(), e);
        }
        let outcome = self.cache.resolve(&key, ticket, result, now);
        let len = self.rows().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
        outcome
    }

    pub fn response(&self) -> Option<&ThreadsResponse> {
        self.cache.data(&self.key())
    }

    pub fn rows(&self) -> &[Thread] {
        self.response()
            .map(|r| r.threads.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> u64 {
        self.response().map(ThreadsResponse::total).unwrap_or(0)
    }

    pub fn show_pagination(&self) -> bool {
        self.total() > THREADS_PAGE_SIZE
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        u64::from(self.page) * THREADS_PAGE_SIZE < self.total()
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.page -= 1;
        self.reset_position();
        true
    }

    pub fn next_page(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.page += 1;
        self.reset_position();
        true
    }

    fn reset_position(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_cursor(&mut self, down: bool) {
        let len = self.rows().len();
        if down {
            if self.cursor + 1 < len {
                self.cursor += 1;
            }
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    pub fn expansion(&self, thread_id: &str) -> Expansion {
        self.expansions.get(thread_id).copied().unwrap_or_default()
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.rows().get(self.cursor).map(|t| t.thread_id.clone()) {
            let next = self.expansion(&id).toggle();
            self.expansions.insert(id, next);
        }
    }

    pub fn refresh(&mut self) -> bool {
        let key = self.key();
        if self.cache.is_fetching(&key) {
            return false;
        }
        self.cache.invalidate_key(&key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockBackend;
    use crate::models::fixtures;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn response(count: usize, total: Option<u64>) -> ThreadsResponse {
        ThreadsResponse {
            threads: (0..count)
                .map(|i| fixtures::thread(&format!("t{i}"), None))
                .collect(),
            total,
        }
    }

    fn loaded(resp: ThreadsResponse) -> Threads {
        let mut threads = Threads::new();
        let key = threads.key();
        let ticket = threads.cache.begin(&key).unwrap();
        threads.handle(key, ticket, Ok(resp), Instant::now());
        threads
    }

    #[test]
    fn test_prev_disabled_on_first_page() {
        let mut threads = loaded(response(20, Some(45)));
        assert!(threads.show_pagination());
        assert!(!threads.can_prev());
        assert!(!threads.prev_page());
        assert_eq!(threads.page, 1);
    }

    #[test]
    fn test_pagination_hidden_for_single_page() {
        let threads = loaded(response(5, None));
        assert_eq!(threads.total(), 5);
        assert!(!threads.show_pagination());
        assert!(!threads.can_next());
    }

    #[test]
    fn test_next_page_moves_key_and_resets_cursor() {
        let mut threads = loaded(response(20, Some(45)));
        threads.move_cursor(true);
        assert!(threads.next_page());
        assert_eq!(threads.page, 2);
        assert_eq!(threads.cursor, 0);
        assert!(threads.cache.needs_fetch(&threads.key()));
        assert!(threads.rows().is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_collapsed() {
        let mut threads = loaded(response(2, None));
        threads.toggle_selected();
        assert!(threads.expansion("t0").is_expanded());
        assert!(!threads.expansion("t1").is_expanded());
        threads.toggle_selected();
        assert_eq!(threads.expansion("t0"), Expansion::Collapsed);
    }

    #[tokio::test]
    async fn test_sync_fetches_current_page() {
        let mut mock = MockBackend::new();
        mock.expect_list_threads()
            .withf(|page| *page == 1)
            .times(1)
            .returning(|_| Ok(response(3, None)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatch = Dispatch::new(Arc::new(mock), tx);

        let mut threads = Threads::new();
        threads.sync(&dispatch);
        threads.sync(&dispatch);
        match rx.recv().await.unwrap() {
            AppEvent::Threads {
                key,
                ticket,
                result,
            } => {
                threads.handle(key, ticket, result, Instant::now());
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(threads.rows().len(), 3);
    }
}
