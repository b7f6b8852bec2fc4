//! URL state synchronization.
//!
//! Table state that should survive reloads and be shareable as a link lives
//! in the URL query. [`UrlState`] binds one parameter to a typed value;
//! handles created from the same [`UrlStateContext`] batch their writes into
//! a single history replace.

mod codec;
mod context;
mod history;
mod params;
mod state;

pub use codec::Codec;
pub use codec::Json;
pub use codec::UrlParam;
pub use context::PendingUpdate;
pub use context::UrlStateContext;
pub use context::resolve_params;
pub use history::MemoryHistory;
pub use history::Navigator;
pub use params::Location;
pub use params::QueryParams;
pub use state::UrlState;

/// 1-based page number.
pub const PAGE: &str = "page";
/// Rows per page.
pub const PAGE_SIZE: &str = "pageSize";
/// Sort column id.
pub const SORT_BY: &str = "sortBy";
/// `asc` or `desc`.
pub const SORT_ORDER: &str = "sortOrder";
/// Global search text.
pub const SEARCH: &str = "search";
/// Inclusive start of the date filter, `YYYY-MM-DD`.
pub const FROM_DATE: &str = "from_date";
/// Inclusive end of the date filter, `YYYY-MM-DD`.
pub const TO_DATE: &str = "to_date";
