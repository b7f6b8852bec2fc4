//! Navigation boundary.

use std::sync::Mutex;

use super::Location;

/// The navigation collaborator that owns the current URL.
pub trait Navigator: Send + Sync {
    /// Returns the current location.
    fn location(&self) -> Location;

    /// Replaces the current history entry without adding a new one.
    fn replace(&self, location: Location);
}

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<Location>,
    index: usize,
    replace_count: usize,
}

/// In-memory browser-style history with back/forward stacks.
///
/// `push`, `back` and `forward` model external navigation (links, browser
/// buttons); `replace` is what URL state writes use.
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<HistoryInner>,
}

impl MemoryHistory {
    /// Creates a history with one entry.
    pub fn new(initial: Location) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![initial],
                index: 0,
                replace_count: 0,
            }),
        }
    }

    /// Creates a history from an href such as `/users?page=2`.
    pub fn from_href(href: &str) -> Self {
        Self::new(Location::parse(href))
    }

    /// Navigates to a new entry, dropping any forward entries.
    pub fn push(&self, location: Location) {
        if let Ok(mut guard) = self.inner.lock() {
            let keep = guard.index + 1;
            guard.entries.truncate(keep);
            guard.entries.push(location);
            guard.index = keep;
        }
    }

    /// Moves one entry back. Returns the new location, if it moved.
    pub fn back(&self) -> Option<Location> {
        let mut guard = self.inner.lock().ok()?;
        if guard.index == 0 {
            return None;
        }
        guard.index -= 1;
        Some(guard.entries[guard.index].clone())
    }

    /// Moves one entry forward. Returns the new location, if it moved.
    pub fn forward(&self) -> Option<Location> {
        let mut guard = self.inner.lock().ok()?;
        if guard.index + 1 >= guard.entries.len() {
            return None;
        }
        guard.index += 1;
        Some(guard.entries[guard.index].clone())
    }

    /// Number of `replace` navigations performed so far.
    pub fn replace_count(&self) -> usize {
        self.inner.lock().map(|g| g.replace_count).unwrap_or(0)
    }

    /// Number of entries in the history stack.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.entries.len()).unwrap_or(0)
    }

    /// Always `false`; a history has at least one entry.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(Location::new("/"))
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> Location {
        self.inner
            .lock()
            .map(|g| g.entries[g.index].clone())
            .unwrap_or_default()
    }

    fn replace(&self, location: Location) {
        if let Ok(mut guard) = self.inner.lock() {
            let index = guard.index;
            guard.entries[index] = location;
            guard.replace_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_forward() {
        let history = MemoryHistory::from_href("/users?page=1");
        history.push(Location::parse("/users?page=2"));
        history.push(Location::parse("/users?page=3"));

        assert_eq!(history.back(), Some(Location::parse("/users?page=2")));
        assert_eq!(history.back(), Some(Location::parse("/users?page=1")));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), Some(Location::parse("/users?page=2")));

        // Pushing from the middle drops forward entries.
        history.push(Location::parse("/projects"));
        assert_eq!(history.forward(), None);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_replace_does_not_grow_stack() {
        let history = MemoryHistory::default();
        history.replace(Location::parse("/?page=4"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.replace_count(), 1);
        assert_eq!(history.location().params.get("page"), Some("4"));
    }
}
