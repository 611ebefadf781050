pub mod parallel_processor;
pub mod row_filter;

pub use parallel_processor::{FilterReport, ParallelProcessor};
pub use row_filter::{EmptyResultPolicy, FileOutcome, RowFilter};
