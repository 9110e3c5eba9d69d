//! Page buffer and file header layout.
//!
//! This module contains:
//! - [`Page`] - An in-memory copy of one page
//! - [`FileHeader`] - The database file header stored at the start of page 1

mod file_header;
#[allow(clippy::module_inception)]
mod page;

pub use file_header::FileHeader;
pub use page::Page;
