//! Storage layer - file I/O and page formats.
//!
//! - [`Pager`] - Page-granular reads and writes against the database file
//! - [`page`] - Page buffers and the file header

pub mod page;
mod pager;

pub use pager::Pager;
