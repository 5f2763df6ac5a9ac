//! Race-safe, sortable, page-numbered list state.

pub mod controller;
pub mod page;
pub mod sequence;

pub use controller::{FetchOutcome, ListView, PageSource, PagedListController};
pub use page::{PageQuery, PageResult};
pub use sequence::FetchSequence;
