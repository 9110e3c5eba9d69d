//! Error types for pagedb.

use thiserror::Error;

use crate::index::btree::NodeType;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the pager and the B-Tree codec.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from file operations, propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file header failed validation on open.
    ///
    /// The file is left untouched.
    #[error("corrupt file header: {0}")]
    CorruptHeader(&'static str),

    /// Page number is 0 or beyond the last allocated page.
    #[error("invalid page number: {0}")]
    InvalidPageNumber(u32),

    /// A page buffer handed to the pager has the wrong length.
    #[error("invalid page buffer length: expected {expected} bytes, got {actual}")]
    InvalidPageLength { expected: usize, actual: usize },

    /// The file holds more pages than a 32-bit page number can address.
    #[error("file of {file_size} bytes exceeds the addressable page count at {page_size}-byte pages")]
    FileTooLarge { file_size: u64, page_size: usize },

    /// A header buffer handed to the pager is not exactly `HEADER_SIZE` bytes.
    #[error("invalid header length: {0}")]
    InvalidHeaderLength(usize),

    /// Page size is not a power of two in the supported range.
    #[error("invalid page size: {0}")]
    InvalidPageSize(usize),

    /// The node type byte is not one of the four recognized node types.
    #[error("invalid node type byte: {0:#04x}")]
    InvalidNodeType(u8),

    /// The cell layout for this node type has no codec yet.
    ///
    /// Signals an incomplete feature, not data corruption.
    #[error("cell layout for {0} nodes is not implemented")]
    UnsupportedCellLayout(NodeType),

    /// A cell was inserted into a node of a different type.
    #[error("cannot store a {cell} cell in a {node} node")]
    CellTypeMismatch { node: NodeType, cell: NodeType },

    /// The requested slot is outside the node's offset array.
    #[error("slot {slot} not found (node holds {n_cells} cells)")]
    SlotNotFound { slot: u16, n_cells: u16 },

    /// Not enough free space between the offset array and the cell area.
    #[error("node full: need {needed} bytes, {available} available")]
    NodeFull { needed: usize, available: usize },

    /// A decoder ran past the end of its buffer.
    #[error("buffer too short: need {needed} bytes at offset {offset}, buffer holds {len}")]
    ShortBuffer {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// Node header fields on disk describe an impossible layout.
    #[error("corrupt node on page {page}: {reason}")]
    CorruptNode { page: u32, reason: String },
}
