//! Per-page classification: image roles and logo selection, color palette
//! extraction and filtering, typography detection.
//!
//! Everything in here is a pure function over extracted data, so it is
//! unit-testable without a browser.

pub mod colors;
pub mod images;
pub mod keywords;
pub mod logo;
pub mod typography;
