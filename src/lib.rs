//! pagedb - the page-level storage format of a B-Tree database file.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                             pagedb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              B-Tree Layer (index/btree/)                 │   │
//! │  │   BTree: open/validate file, allocate/load/write nodes   │   │
//! │  │   BTreeNode + NodeHeader + BTreeCell (in-page codecs)    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │      Pager + Page + FileHeader (100-byte header)         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │                     single database file                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, Config, byte cursors)
//! - [`storage`] - File I/O and page formats
//! - [`index`] - B-Tree file format
//!
//! # Quick Start
//! ```no_run
//! use pagedb::{BTree, BTreeCell, NodeType, PageId};
//!
//! // Opens (and initializes, if empty) a database file
//! let btree = BTree::open("my_database.db")?;
//!
//! // Allocate a node, add a cell, persist it
//! let mut node = btree.new_node(NodeType::LeafTable)?;
//! node.insert_cell(0, &BTreeCell::table_leaf(1, "Hello World"))?;
//! btree.write_node(&mut node)?;
//!
//! // Load it back
//! let loaded = btree.get_node_by_page(node.page_id())?;
//! assert_eq!(loaded.get_cell(0)?.data(), Some(&b"Hello World"[..]));
//!
//! let root = btree.get_node_by_page(PageId::ROOT)?;
//! assert_eq!(root.node_type, NodeType::LeafTable);
//! btree.close()?;
//! # Ok::<(), pagedb::Error>(())
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_PAGE_SIZE, HEADER_SIZE, MAGIC};
pub use common::{Config, Error, PageId, Result};

pub use index::btree::{BTree, BTreeCell, BTreeNode, NodeHeader, NodeType};
pub use storage::page::{FileHeader, Page};
pub use storage::Pager;
