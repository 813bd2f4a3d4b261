//! Export functionality for extraction reports.

mod report;

pub use report::*;
