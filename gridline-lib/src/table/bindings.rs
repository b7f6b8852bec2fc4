//! Query parameters a table binds to.

use super::DateRange;
use super::TableQuery;
use crate::config::SortOrder;
use crate::config::TableConfig;
use crate::export::SortSpec;
use crate::query;
use crate::query::Location;
use crate::query::UrlState;
use crate::query::UrlStateContext;

/// The table's handles on one [`UrlStateContext`].
///
/// `page` is 1-based in the URL and 0-based in [`TableQuery`].
#[derive(Debug)]
pub(crate) struct UrlBindings {
    ctx: UrlStateContext,
    page: UrlState<usize>,
    page_size: UrlState<usize>,
    sort_by: UrlState<String>,
    sort_order: UrlState<SortOrder>,
    search: UrlState<String>,
    from_date: UrlState<String>,
    to_date: UrlState<String>,
}

impl UrlBindings {
    pub(crate) fn new(ctx: &UrlStateContext, config: &TableConfig) -> Self {
        Self {
            ctx: ctx.clone(),
            page: UrlState::new(ctx, query::PAGE, 1),
            page_size: UrlState::new(ctx, query::PAGE_SIZE, config.default_page_size()),
            sort_by: UrlState::new(ctx, query::SORT_BY, config.default_sort_by.clone()),
            sort_order: UrlState::new(ctx, query::SORT_ORDER, config.default_sort_order),
            search: UrlState::new(ctx, query::SEARCH, String::new()),
            from_date: UrlState::new(ctx, query::FROM_DATE, String::new()),
            to_date: UrlState::new(ctx, query::TO_DATE, String::new()),
        }
    }

    /// Reads the query currently in the URL. Filters are not URL-bound.
    pub(crate) fn read(&self) -> TableQuery {
        let sort_by = self.sort_by.get();
        TableQuery {
            page_index: self.page.get().saturating_sub(1),
            page_size: (*self.page_size.get()).max(1),
            sort: (!sort_by.is_empty()).then(|| SortSpec::new(sort_by.clone(), *self.sort_order.get())),
            search: self.search.get().clone(),
            date_range: DateRange::parse(self.from_date.get(), self.to_date.get()),
            filters: Default::default(),
        }
    }

    /// Writes `query` as a single navigation.
    pub(crate) fn write(&mut self, query: &TableQuery) {
        let (sort_by, sort_order) = match &query.sort {
            Some(sort) => (sort.column.clone(), sort.order),
            None => (
                self.sort_by.default_value().clone(),
                *self.sort_order.default_value(),
            ),
        };

        let ctx = self.ctx.clone();
        ctx.batch(|| {
            self.page_size.set(query.page_size);
            self.page.set(query.page_index + 1);
            self.sort_by.set(sort_by);
            self.sort_order.set(sort_order);
            // a default sortBy only keeps sortOrder if it is pending
            self.sort_order.touch();
            self.search.set(query.search.clone());
            self.from_date.set(query.date_range.from_param());
            self.to_date.set(query.date_range.to_param());
        });
        self.refresh();
    }

    /// Re-reads every handle after an external navigation. Returns `true`
    /// if any bound value changed.
    pub(crate) fn sync(&mut self, location: &Location) -> bool {
        // no short-circuit: every handle must see the location
        [
            self.page.sync(location),
            self.page_size.sync(location),
            self.sort_by.sync(location),
            self.sort_order.sync(location),
            self.search.sync(location),
            self.from_date.sync(location),
            self.to_date.sync(location),
        ]
        .contains(&true)
    }

    fn refresh(&mut self) {
        let location = self.ctx.location();
        self.sync(&location);
    }
}
