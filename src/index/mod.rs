//! Index structures.
//!
//! - [`btree`] - B-Tree file format: header, nodes and cells

pub mod btree;
