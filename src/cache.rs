//! Read-through cache of server responses, keyed by request signature.
//!
//! Each entry remembers whether a request is in flight and whether it has been
//! invalidated since that request started, so a response that raced with a
//! mutation never clears the stale mark.

use crate::api::ApiError;
use std::collections::HashMap;
use std::time::Instant;

/// Endpoint name plus the ordered parameters that were sent with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    endpoint: &'static str,
    params: Vec<(&'static str, String)>,
}

impl QueryKey {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
        }
    }

    pub fn with_params(endpoint: &'static str, params: Vec<(&'static str, String)>) -> Self {
        Self { endpoint, params }
    }

    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }
}

/// Cache epoch and entry generation at the moment a fetch started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    generation: u64,
}

/// What `resolve` did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Stored,
    Failed { kept_data: bool },
    /// The cache was cleared after the request started.
    Discarded,
}

impl Resolved {
    /// A refetch failed but older data is still on screen.
    pub fn is_refresh_failure(self) -> bool {
        self == Resolved::Failed { kept_data: true }
    }
}

#[derive(Debug)]
struct Entry<T> {
    data: Option<T>,
    failed: bool,
    in_flight: bool,
    stale: bool,
    generation: u64,
    updated_at: Option<Instant>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            failed: false,
            in_flight: false,
            stale: false,
            generation: 0,
            updated_at: None,
        }
    }
}

/// What a view should show for one key.
#[derive(Debug, PartialEq)]
pub enum View<'a, T> {
    Loading,
    Failed,
    Ready { data: &'a T, fetching: bool },
}

#[derive(Debug)]
pub struct QueryCache<T> {
    entries: HashMap<QueryKey, Entry<T>>,
    /// Bumped by `clear`, so responses from before it are dropped.
    epoch: u64,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            epoch: 0,
        }
    }
}

impl<T> QueryCache<T> {
    /// True when the key has never been fetched or was invalidated, and no
    /// request for it is running. A plain failure is not retried here.
    pub fn needs_fetch(&self, key: &QueryKey) -> bool {
        match self.entries.get(key) {
            None => true,
            Some(entry) => !entry.in_flight && entry.stale,
        }
    }

    /// Marks the key as in flight. Returns `None` if a request is already running.
    pub fn begin(&mut self, key: &QueryKey) -> Option<Ticket> {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.in_flight {
            return None;
        }
        entry.in_flight = true;
        Some(Ticket {
            epoch: self.epoch,
            generation: entry.generation,
        })
    }

    pub fn resolve(
        &mut self,
        key: &QueryKey,
        ticket: Ticket,
        result: Result<T, ApiError>,
        now: Instant,
    ) -> Resolved {
        if ticket.epoch != self.epoch {
            return Resolved::Discarded;
        }
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = false;
        entry.stale = ticket.generation != entry.generation;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.failed = false;
                entry.updated_at = Some(now);
                Resolved::Stored
            }
            // Keep whatever was shown before.
            Err(_) => {
                entry.failed = true;
                Resolved::Failed {
                    kept_data: entry.data.is_some(),
                }
            }
        }
    }

    pub fn view(&self, key: &QueryKey) -> View<'_, T> {
        match self.entries.get(key) {
            Some(Entry {
                data: Some(data),
                in_flight,
                ..
            }) => View::Ready {
                data,
                fetching: *in_flight,
            },
            Some(entry) if entry.failed && !entry.in_flight => View::Failed,
            _ => View::Loading,
        }
    }

    pub fn data(&self, key: &QueryKey) -> Option<&T> {
        self.entries.get(key).and_then(|e| e.data.as_ref())
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.in_flight)
    }

    pub fn updated_at(&self, key: &QueryKey) -> Option<Instant> {
        self.entries.get(key).and_then(|e| e.updated_at)
    }

    /// Marks one key for refetch.
    pub fn invalidate_key(&mut self, key: &QueryKey) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.stale = true;
        entry.generation += 1;
    }

    /// Marks every key of an endpoint for refetch.
    pub fn invalidate(&mut self, endpoint: &str) {
        for (key, entry) in self.entries.iter_mut() {
            if key.endpoint == endpoint {
                entry.stale = true;
                entry.generation += 1;
            }
        }
    }

    /// Drops every entry and any response still in flight.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, StatusCode};

    fn failure() -> ApiError {
        ApiError::Status {
            method: Method::GET,
            path: "/api/v1/emails".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn key(search: &str) -> QueryKey {
        QueryKey::new("emails").param("search", search)
    }

    #[test]
    fn test_fresh_key_needs_fetch_once() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let k = key("a");
        assert!(cache.needs_fetch(&k));
        let ticket = cache.begin(&k).unwrap();
        assert!(!cache.needs_fetch(&k));
        assert!(cache.begin(&k).is_none());
        assert_eq!(cache.view(&k), View::Loading);

        cache.resolve(&k, ticket, Ok(7), Instant::now());
        assert!(!cache.needs_fetch(&k));
        assert_eq!(
            cache.view(&k),
            View::Ready {
                data: &7,
                fetching: false
            }
        );
    }

    #[test]
    fn test_result_for_other_key_does_not_change_current_view() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let old = key("old");
        let current = key("new");
        let old_ticket = cache.begin(&old).unwrap();
        let _ = cache.begin(&current).unwrap();

        cache.resolve(&old, old_ticket, Ok(1), Instant::now());
        assert_eq!(cache.view(&current), View::Loading);
        assert_eq!(cache.data(&old), Some(&1));
    }

    #[test]
    fn test_invalidation_during_flight_keeps_entry_stale() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let k = key("a");
        let ticket = cache.begin(&k).unwrap();
        cache.invalidate("emails");
        cache.resolve(&k, ticket, Ok(1), Instant::now());
        assert!(cache.needs_fetch(&k));

        let ticket = cache.begin(&k).unwrap();
        cache.resolve(&k, ticket, Ok(2), Instant::now());
        assert!(!cache.needs_fetch(&k));
        assert_eq!(cache.data(&k), Some(&2));
    }

    #[test]
    fn test_failure_keeps_previous_data_and_is_not_retried() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let k = key("a");
        let ticket = cache.begin(&k).unwrap();
        assert_eq!(
            cache.resolve(&k, ticket, Err(failure()), Instant::now()),
            Resolved::Failed { kept_data: false }
        );
        assert_eq!(cache.view(&k), View::Failed);
        assert!(!cache.needs_fetch(&k));

        cache.invalidate_key(&k);
        let ticket = cache.begin(&k).unwrap();
        cache.resolve(&k, ticket, Ok(5), Instant::now());
        cache.invalidate_key(&k);
        let ticket = cache.begin(&k).unwrap();
        let outcome = cache.resolve(&k, ticket, Err(failure()), Instant::now());
        assert!(outcome.is_refresh_failure());
        assert_eq!(
            cache.view(&k),
            View::Ready {
                data: &5,
                fetching: false
            }
        );
    }

    #[test]
    fn test_invalidate_only_touches_matching_endpoint() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let emails = key("a");
        let digest = QueryKey::new("digest");
        for k in [&emails, &digest] {
            let t = cache.begin(k).unwrap();
            cache.resolve(k, t, Ok(1), Instant::now());
        }
        cache.invalidate("digest");
        assert!(!cache.needs_fetch(&emails));
        assert!(cache.needs_fetch(&digest));
    }

    #[test]
    fn test_response_after_clear_is_dropped() {
        let mut cache: QueryCache<u32> = QueryCache::default();
        let k = key("a");
        let ticket = cache.begin(&k).unwrap();
        cache.clear();

        assert_eq!(
            cache.resolve(&k, ticket, Ok(9), Instant::now()),
            Resolved::Discarded
        );
        assert!(cache.needs_fetch(&k));
        assert_eq!(cache.data(&k), None);
        assert_eq!(cache.view(&k), View::Loading);

        let ticket = cache.begin(&k).unwrap();
        assert_eq!(
            cache.resolve(&k, ticket, Ok(10), Instant::now()),
            Resolved::Stored
        );
        assert_eq!(cache.data(&k), Some(&10));
    }
}
