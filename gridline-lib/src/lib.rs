//! Data table state engine
//!
//! Headless state for admin-dashboard data tables: URL-bound query state,
//! persisted column layout, identity-keyed selection, CSV/XLSX export and a
//! REST boundary that normalizes list responses.

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod query;
pub mod selection;
pub mod storage;
pub mod table;

pub use error::Error;
pub use error::Result;
