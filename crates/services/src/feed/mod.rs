//! Listing pipeline: tag filter, sort policy, pagination planner.

pub mod pagination;
pub mod sort;
pub mod tag_filter;

pub use pagination::{PageRequest, PageWindow, PaginationPlanner};
pub use tag_filter::TagFilter;
