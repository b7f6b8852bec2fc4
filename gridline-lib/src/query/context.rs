//! Batched URL writes.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use indexmap::IndexMap;
use log::debug;
use log::warn;

use super::Location;
use super::Navigator;
use super::PAGE;
use super::PAGE_SIZE;
use super::QueryParams;
use super::SORT_BY;
use super::SORT_ORDER;

/// Sort order written alongside `sortBy` when nothing else is known.
const DEFAULT_SORT_ORDER: &str = "desc";

/// One queued parameter write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    /// Serialized value.
    pub value: String,
    /// The value equals the state's default, so the parameter is omitted.
    pub is_default: bool,
}

#[derive(Debug, Default)]
struct BatchState {
    pending: IndexMap<String, PendingUpdate>,
    /// Open `batch` scopes. Writes flush when the outermost one closes.
    depth: usize,
    /// Set while a flush is running; blocks re-entrant flushes.
    flushing: bool,
    keys: HashSet<String>,
}

struct ContextInner {
    navigator: Arc<dyn Navigator>,
    state: Mutex<BatchState>,
}

/// Shared batching context for URL-bound state.
///
/// Every [`UrlState`](super::UrlState) created from the same context queues
/// its writes here; all writes made inside one [`batch`](Self::batch) (one
/// event-loop tick) are merged into a single `replace` navigation. Tables
/// that must not share keys get separate contexts.
#[derive(Clone)]
pub struct UrlStateContext {
    inner: Arc<ContextInner>,
}

impl std::fmt::Debug for UrlStateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlStateContext")
            .field("location", &self.location())
            .finish_non_exhaustive()
    }
}

impl UrlStateContext {
    /// Creates a context writing through the given navigator.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                navigator,
                state: Mutex::new(BatchState::default()),
            }),
        }
    }

    /// Current location as seen by the navigator.
    pub fn location(&self) -> Location {
        self.inner.navigator.location()
    }

    fn state(&self) -> MutexGuard<'_, BatchState> {
        // A poisoned lock only means a panic happened mid-update; the map
        // itself is still usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records that a state handle owns `key`. Returns `false` (and logs) if
    /// another handle on this context already claimed it.
    pub(crate) fn claim_key(&self, key: &str) -> bool {
        let fresh = self.state().keys.insert(key.to_string());
        if !fresh {
            warn!("query key {:?} is bound twice on the same context", key);
        }
        fresh
    }

    pub(crate) fn release_key(&self, key: &str) {
        self.state().keys.remove(key);
    }

    /// Returns `true` while inside a [`batch`](Self::batch).
    pub fn in_batch(&self) -> bool {
        self.state().depth > 0
    }

    /// Queues a write. Outside a batch the write is flushed immediately.
    pub fn enqueue(&self, key: &str, update: PendingUpdate) -> QueryParams {
        let depth = {
            let mut state = self.state();
            state.pending.insert(key.to_string(), update);
            state.depth
        };
        let resolved = self.resolved_params();
        if depth == 0 {
            self.flush();
        }
        resolved
    }

    /// Runs `f` as one tick: writes made inside are flushed once, at the end
    /// of the outermost batch.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state().depth += 1;
        let result = f();
        let close = {
            let mut state = self.state();
            state.depth -= 1;
            state.depth == 0
        };
        if close {
            self.flush();
        }
        result
    }

    /// Params the URL would have if pending writes were flushed now.
    pub fn resolved_params(&self) -> QueryParams {
        let current = self.location().params;
        let state = self.state();
        resolve_params(&current, &state.pending)
    }

    /// Applies all pending writes with one `replace` navigation.
    ///
    /// Returns the new location, or `None` if nothing changed.
    pub fn flush(&self) -> Option<Location> {
        let pending = {
            let mut state = self.state();
            if state.flushing || state.pending.is_empty() {
                return None;
            }
            state.flushing = true;
            std::mem::take(&mut state.pending)
        };

        let current = self.location();
        let params = resolve_params(&current.params, &pending);
        let result = if params == current.params {
            debug!("url flush of {} key(s) is a no-op", pending.len());
            None
        } else {
            let next = current.with_params(params);
            debug!("url replace -> {}", next);
            self.inner.navigator.replace(next.clone());
            Some(next)
        };

        self.state().flushing = false;
        result
    }
}

/// Applies pending writes to `current`.
///
/// - a value equal to its default removes the parameter
/// - `pageSize` forces `page=1`
/// - a non-default `sortBy` always keeps a `sortOrder`
/// - `sortOrder` is only emitted next to a `sortBy`, or when not default
/// - a default `sortBy` drops `sortOrder` unless a pending non-default order
///   keeps it
pub fn resolve_params(current: &QueryParams, pending: &IndexMap<String, PendingUpdate>) -> QueryParams {
    let mut params = current.clone();

    for (key, update) in pending {
        if key == SORT_ORDER {
            continue;
        }
        if update.is_default {
            params.delete(key);
        } else {
            params.set(key, update.value.clone());
        }

        if key == SORT_BY && update.is_default {
            if !pending.contains_key(SORT_ORDER) {
                params.delete(SORT_ORDER);
            }
        } else if key == SORT_BY {
            let order = pending
                .get(SORT_ORDER)
                .map(|u| u.value.clone())
                .or_else(|| current.get(SORT_ORDER).map(str::to_string))
                .unwrap_or_else(|| DEFAULT_SORT_ORDER.to_string());
            params.set(SORT_ORDER, order);
        }
    }

    if let Some(update) = pending.get(SORT_ORDER) {
        if params.has(SORT_BY) || !update.is_default {
            params.set(SORT_ORDER, update.value.clone());
        } else {
            params.delete(SORT_ORDER);
        }
    }

    if pending.contains_key(PAGE_SIZE) {
        params.set(PAGE, "1");
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MemoryHistory;

    fn update(value: &str, is_default: bool) -> PendingUpdate {
        PendingUpdate {
            value: value.to_string(),
            is_default,
        }
    }

    fn pending(entries: &[(&str, PendingUpdate)]) -> IndexMap<String, PendingUpdate> {
        entries
            .iter()
            .map(|(k, u)| (k.to_string(), u.clone()))
            .collect()
    }

    #[test]
    fn test_default_values_are_removed() {
        let current = QueryParams::parse("page=3&search=x");
        let params = resolve_params(&current, &pending(&[("page", update("1", true))]));
        assert_eq!(params.to_query_string(), "search=x");
    }

    #[test]
    fn test_page_size_forces_first_page() {
        let current = QueryParams::parse("page=4&pageSize=10");
        let params = resolve_params(
            &current,
            &pending(&[("pageSize", update("50", false)), ("page", update("3", false))]),
        );
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("pageSize"), Some("50"));
    }

    #[test]
    fn test_sort_by_keeps_existing_sort_order() {
        let current = QueryParams::parse("sortOrder=asc");
        let params = resolve_params(&current, &pending(&[("sortBy", update("name", false))]));
        assert_eq!(params.get("sortBy"), Some("name"));
        assert_eq!(params.get("sortOrder"), Some("asc"));
    }

    #[test]
    fn test_sort_by_defaults_sort_order_to_desc() {
        let params = resolve_params(
            &QueryParams::new(),
            &pending(&[("sortBy", update("name", false))]),
        );
        assert_eq!(params.get("sortOrder"), Some("desc"));
    }

    #[test]
    fn test_sort_order_default_without_sort_by_is_dropped() {
        let current = QueryParams::parse("sortOrder=asc");
        let params = resolve_params(&current, &pending(&[("sortOrder", update("desc", true))]));
        assert!(!params.has("sortOrder"));

        let current = QueryParams::parse("sortBy=name&sortOrder=asc");
        let params = resolve_params(&current, &pending(&[("sortOrder", update("desc", true))]));
        assert_eq!(params.get("sortOrder"), Some("desc"));
    }

    #[test]
    fn test_default_sort_drops_both_keys() {
        let current = QueryParams::parse("sortBy=name&sortOrder=asc");
        let params = resolve_params(
            &current,
            &pending(&[("sortBy", update("created_at", true)), ("sortOrder", update("desc", true))]),
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_default_sort_by_keeps_explicit_order() {
        let current = QueryParams::parse("sortBy=name&sortOrder=asc");
        let params = resolve_params(
            &current,
            &pending(&[("sortBy", update("created_at", true)), ("sortOrder", update("asc", false))]),
        );
        assert_eq!(params.to_query_string(), "sortOrder=asc");
    }

    #[test]
    fn test_batch_coalesces_into_one_navigation() {
        let history = Arc::new(MemoryHistory::from_href("/users"));
        let ctx = UrlStateContext::new(history.clone());

        ctx.batch(|| {
            ctx.enqueue("page", update("2", false));
            ctx.enqueue("search", update("ada", false));
            assert_eq!(history.replace_count(), 0);
        });

        assert_eq!(history.replace_count(), 1);
        assert_eq!(history.location().to_string(), "/users?page=2&search=ada");
    }

    #[test]
    fn test_nested_batches_flush_once() {
        let history = Arc::new(MemoryHistory::from_href("/users"));
        let ctx = UrlStateContext::new(history.clone());

        ctx.batch(|| {
            ctx.enqueue("page", update("2", false));
            ctx.batch(|| ctx.enqueue("pageSize", update("20", false)));
            assert!(ctx.in_batch());
        });

        assert_eq!(history.replace_count(), 1);
        assert_eq!(history.location().params.get("page"), Some("1"));
    }

    #[test]
    fn test_flush_without_change_does_not_navigate() {
        let history = Arc::new(MemoryHistory::from_href("/users?page=2"));
        let ctx = UrlStateContext::new(history.clone());

        assert_eq!(ctx.enqueue("page", update("2", false)).get("page"), Some("2"));
        assert_eq!(history.replace_count(), 0);
    }

    #[test]
    fn test_claim_key_detects_duplicates() {
        let ctx = UrlStateContext::new(Arc::new(MemoryHistory::default()));
        assert!(ctx.claim_key("page"));
        assert!(!ctx.claim_key("page"));
        ctx.release_key("page");
        assert!(ctx.claim_key("page"));
    }
}
