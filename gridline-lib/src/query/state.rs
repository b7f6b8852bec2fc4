//! Typed handle bound to one query parameter.

use log::debug;

use super::Codec;
use super::Location;
use super::PendingUpdate;
use super::QueryParams;
use super::UrlParam;
use super::UrlStateContext;

/// A value whose canonical form lives in the URL query.
///
/// The handle caches the last value it read or wrote. Writes go through the
/// shared [`UrlStateContext`], so several handles updated in one batch
/// produce a single navigation.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use gridline_lib::query::{MemoryHistory, Navigator, UrlState, UrlStateContext};
///
/// let history = Arc::new(MemoryHistory::from_href("/users?page=3"));
/// let ctx = UrlStateContext::new(history.clone());
/// let mut page = UrlState::new(&ctx, "page", 1usize);
/// assert_eq!(*page.get(), 3);
///
/// page.set(1);
/// assert_eq!(history.location().to_string(), "/users");
/// ```
pub struct UrlState<T> {
    ctx: UrlStateContext,
    key: String,
    default: T,
    codec: Codec<T>,
    value: T,
    last_set: Option<T>,
}

impl<T: UrlParam> UrlState<T> {
    /// Binds `key` using the type's default codec.
    pub fn new(ctx: &UrlStateContext, key: &str, default: T) -> Self {
        Self::with_codec(ctx, key, default, Codec::for_key(key))
    }
}

impl<T> UrlState<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Binds `key` with a custom codec.
    pub fn with_codec(ctx: &UrlStateContext, key: &str, default: T, codec: Codec<T>) -> Self {
        ctx.claim_key(key);
        let value = read(&ctx.location(), key, &default, &codec);
        Self {
            ctx: ctx.clone(),
            key: key.to_string(),
            default,
            codec,
            value,
            last_set: None,
        }
    }

    /// Current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Parameter name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Declared default.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Writes a new value and returns the params the URL resolves to.
    ///
    /// Setting the current value again does not queue anything.
    pub fn set(&mut self, value: T) -> QueryParams {
        if value == self.value {
            return self.ctx.resolved_params();
        }
        let update = PendingUpdate {
            value: self.codec.serialize(&value),
            is_default: value == self.default,
        };
        self.value = value.clone();
        self.last_set = Some(value);
        self.ctx.enqueue(&self.key, update)
    }

    /// Queues the current value even though it did not change, so keys
    /// coupled to it in the same batch see it.
    pub fn touch(&mut self) -> QueryParams {
        let update = PendingUpdate {
            value: self.codec.serialize(&self.value),
            is_default: self.value == self.default,
        };
        self.ctx.enqueue(&self.key, update)
    }

    /// Writes `f(current)`.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) -> QueryParams {
        let next = f(&self.value);
        self.set(next)
    }

    /// Re-reads the value after an external navigation.
    ///
    /// Returns `true` only when the value actually changed. A location that
    /// merely echoes this handle's own last write reports no change.
    pub fn sync(&mut self, location: &Location) -> bool {
        let parsed = read(location, &self.key, &self.default, &self.codec);
        if parsed == self.value {
            return false;
        }
        if self.last_set.as_ref() == Some(&parsed) {
            self.value = parsed;
            return false;
        }
        debug!("url key {:?} changed externally", self.key);
        self.value = parsed;
        self.last_set = None;
        true
    }

    /// Re-reads from the context's current location.
    pub fn refresh(&mut self) -> bool {
        let location = self.ctx.location();
        self.sync(&location)
    }
}

impl<T> Drop for UrlState<T> {
    fn drop(&mut self) {
        self.ctx.release_key(&self.key);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for UrlState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlState")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

fn read<T: Clone>(location: &Location, key: &str, default: &T, codec: &Codec<T>) -> T {
    match location.params.get(key) {
        Some(raw) => codec.deserialize(raw, default),
        None => default.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::query::Json;
    use crate::query::MemoryHistory;
    use crate::query::Navigator;

    fn setup(href: &str) -> (Arc<MemoryHistory>, UrlStateContext) {
        let history = Arc::new(MemoryHistory::from_href(href));
        let ctx = UrlStateContext::new(history.clone());
        (history, ctx)
    }

    #[test]
    fn test_reads_param_or_default() {
        let (_, ctx) = setup("/t?pageSize=25&archived=true");
        assert_eq!(*UrlState::new(&ctx, "pageSize", 10usize).get(), 25);
        assert!(*UrlState::new(&ctx, "archived", false).get());
        assert_eq!(*UrlState::new(&ctx, "page", 1usize).get(), 1);
    }

    #[test]
    fn test_malformed_param_uses_default() {
        let (_, ctx) = setup("/t?page=abc&filters=%7Bbad");
        assert_eq!(*UrlState::new(&ctx, "page", 1usize).get(), 1);
        let filters = UrlState::new(&ctx, "filters", Json(vec!["x".to_string()]));
        assert_eq!(filters.get().0, vec!["x".to_string()]);
    }

    #[test]
    fn test_same_value_twice_navigates_once() {
        let (history, ctx) = setup("/t");
        let mut page = UrlState::new(&ctx, "page", 1usize);

        page.set(2);
        let params = page.set(2);

        assert_eq!(history.replace_count(), 1);
        assert_eq!(params.get("page"), Some("2"));
    }

    #[test]
    fn test_page_size_resets_page_in_same_batch() {
        let (history, ctx) = setup("/t?page=3");
        let mut page = UrlState::new(&ctx, "page", 1usize);
        let mut page_size = UrlState::new(&ctx, "pageSize", 10usize);

        ctx.batch(|| {
            page.set(4);
            page_size.set(50);
        });

        let location = history.location();
        assert_eq!(location.params.get("page"), Some("1"));
        assert_eq!(location.params.get("pageSize"), Some("50"));
        assert_eq!(history.replace_count(), 1);
        assert!(page.refresh());
        assert_eq!(*page.get(), 1);
    }

    #[test]
    fn test_sort_by_keeps_sort_order() {
        let (history, ctx) = setup("/t");
        let mut sort_by = UrlState::new(&ctx, "sortBy", "created_at".to_string());

        sort_by.set("name".to_string());

        let params = history.location().params;
        assert_eq!(params.get("sortBy"), Some("name"));
        assert_eq!(params.get("sortOrder"), Some("desc"));
    }

    #[test]
    fn test_writers_of_different_keys_do_not_clobber() {
        let (history, ctx) = setup("/t?search=old");
        let mut search = UrlState::new(&ctx, "search", String::new());
        let mut from = UrlState::new(&ctx, "from_date", String::new());
        let mut to = UrlState::new(&ctx, "to_date", String::new());

        ctx.batch(|| {
            search.set("new query".to_string());
            from.set("2024-01-01".to_string());
        });
        to.set("2024-02-01".to_string());

        let params = history.location().params;
        assert_eq!(params.get("search"), Some("new%20query"));
        assert_eq!(params.get("from_date"), Some("2024-01-01"));
        assert_eq!(params.get("to_date"), Some("2024-02-01"));
        assert_eq!(*search.get(), "new query");
    }

    #[test]
    fn test_echo_is_suppressed() {
        let (history, ctx) = setup("/t");
        let mut page = UrlState::new(&ctx, "page", 1usize);

        page.set(2);
        assert!(!page.sync(&history.location()));

        history.push(Location::parse("/t?page=5"));
        assert!(page.sync(&history.location()));
        assert_eq!(*page.get(), 5);

        history.back();
        assert!(page.sync(&history.location()));
        assert_eq!(*page.get(), 2);
    }

    #[test]
    fn test_update_applies_function() {
        let (history, ctx) = setup("/t?page=2");
        let mut page = UrlState::new(&ctx, "page", 1usize);
        page.update(|p| p + 1);
        assert_eq!(history.location().params.get("page"), Some("3"));
    }

    #[test]
    fn test_separate_contexts_do_not_share_pending_writes() {
        let left = Arc::new(MemoryHistory::from_href("/a"));
        let right = Arc::new(MemoryHistory::from_href("/b"));
        let left_ctx = UrlStateContext::new(left.clone());
        let right_ctx = UrlStateContext::new(right.clone());
        let mut left_page = UrlState::new(&left_ctx, "page", 1usize);
        let mut right_page = UrlState::new(&right_ctx, "page", 1usize);

        left_ctx.batch(|| {
            left_page.set(2);
            right_page.set(7);
        });

        assert_eq!(left.location().to_string(), "/a?page=2");
        assert_eq!(right.location().to_string(), "/b?page=7");
    }
}
