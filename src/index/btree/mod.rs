//! B-Tree file format.
//!
//! Nodes live one per page. Page 1 holds the file header in its first
//! `HEADER_SIZE` bytes and the root node after it; every other page is a
//! node from byte 0.
//!
//! # Node Layout
//! ```text
//! ┌──────────────┬───────────────────┬────────────┬──────────────┐
//! │ header (12B) │ cell offset array │ free space │ cells        │
//! │              │ 2B per cell  ──▶  │            │ ◀── grow     │
//! └──────────────┴───────────────────┴────────────┴──────────────┘
//! 0              12              free_offset   cells_offset
//! ```
//!
//! All offsets are relative to the node's region within its page.

#[allow(clippy::module_inception)]
mod btree;
mod cell;
mod node;

pub use btree::BTree;
pub use cell::BTreeCell;
pub use node::{BTreeNode, NodeHeader, NodeType, CELL_POINTER_SIZE};
