//! Toolbar model: debounced search and date range

use std::time::Duration;
use std::time::Instant;

use chrono::NaiveDate;

/// Delay between the last keystroke and the search being applied.
pub const SEARCH_DEBOUNCE_MS: u64 = 500;

/// Search text as typed, applied once typing pauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInput {
    draft: String,
    applied: String,
    last_changed: Option<Instant>,
}

impl SearchInput {
    /// Starts with `applied` already committed, e.g. the URL's `search`.
    pub fn new(applied: impl Into<String>) -> Self {
        let applied = applied.into();
        Self {
            draft: applied.clone(),
            applied,
            last_changed: None,
        }
    }

    /// Text shown in the input.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Text last handed to the table.
    pub fn applied(&self) -> &str {
        &self.applied
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.applied
    }

    /// Records a keystroke at `now`.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.draft = text.into();
        self.last_changed = Some(now);
    }

    /// Returns `true` once the debounce period elapsed since the last edit.
    pub fn debounce_elapsed(&self, now: Instant) -> bool {
        self.last_changed
            .is_some_and(|t| now.duration_since(t) >= Duration::from_millis(SEARCH_DEBOUNCE_MS))
    }

    /// Time left until the pending edit is due, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let changed = self.last_changed?;
        Some(Duration::from_millis(SEARCH_DEBOUNCE_MS).saturating_sub(now.duration_since(changed)))
    }

    /// Commits the draft if it is due and differs from the applied text.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if !self.debounce_elapsed(now) {
            return None;
        }
        self.commit()
    }

    /// Commits the draft immediately, e.g. on Enter.
    pub fn commit(&mut self) -> Option<String> {
        self.last_changed = None;
        if !self.is_dirty() {
            return None;
        }
        self.applied = self.draft.clone();
        Some(self.applied.clone())
    }

    /// Replaces both texts after an external change (back/forward).
    pub fn reset(&mut self, applied: impl Into<String>) {
        *self = Self::new(applied);
    }
}

/// Inclusive date filter. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Parses `YYYY-MM-DD` bounds; blank or malformed bounds are open.
    pub fn parse(from: &str, to: &str) -> Self {
        Self {
            from: parse_date(from),
            to: parse_date(to),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn from_param(&self) -> String {
        format_date(self.from)
    }

    pub fn to_param(&self) -> String {
        format_date(self.to)
    }

    /// e.g. `2024-01-10 - 2024-01-12`, `from 2024-01-10`.
    pub fn label(&self) -> Option<String> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some(format!("{from} - {to}")),
            (Some(from), None) => Some(format!("from {from}")),
            (None, Some(to)) => Some(format!("until {to}")),
            (None, None) => None,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// What the toolbar shows for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    pub search_placeholder: String,
    pub show_search: bool,
    pub show_date_filter: bool,
    pub show_view_options: bool,
    pub show_export: bool,
    pub search: String,
    pub date_range: DateRange,
    pub selected_count: usize,
    pub is_exporting: bool,
}

impl Toolbar {
    /// `true` when a reset button should clear search and dates.
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || !self.date_range.is_empty()
    }
}
