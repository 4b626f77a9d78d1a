//! In-page extraction: embedded scripts and the per-page pipeline that turns
//! their raw JSON output into a `PageRecord`.

pub mod page;
pub mod scripts;

pub use page::{ExtractedPage, PageExtractor};
