//! REST boundary.
//!
//! Every list endpoint is normalized to [`PaginatedResult`] here, whichever
//! envelope shape it answers with, so tables never see raw responses.

mod client;
mod envelope;
mod params;
mod resource;
mod retry;
mod source;

pub use client::*;
pub use envelope::*;
pub use params::*;
pub use resource::*;
pub use retry::*;
pub use source::*;
