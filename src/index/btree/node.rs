//! B-Tree node - the structural view of one page's content.
//!
//! # Content Layout
//! Offsets are relative to the page's node content region, which starts
//! after the file header on page 1 and at byte 0 everywhere else.
//! ```text
//! ┌──────────────┬─────────────────┬──────────────┬──────────────────────┐
//! │ node header  │ offset array    │ free space   │ cells                │
//! │ [0, 12)      │ [12, free_off)  │              │ [cells_off, end)     │
//! └──────────────┴─────────────────┴──────────────┴──────────────────────┘
//!                  2 bytes / cell  ──▶          ◀── newest cell lowest
//! ```
//!
//! Header fields live in [`BTreeNode`] and only reach the page on
//! [`BTreeNode::write_header`]; the offset array and cell bytes are edited
//! in the page buffer directly by [`BTreeNode::insert_cell`].

use std::fmt;

use crate::common::codec::{ByteReader, ByteWriter};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

use super::cell::BTreeCell;

/// Size of one offset array entry.
pub const CELL_POINTER_SIZE: usize = 2;

/// Role of a node, stored as the first byte of the node header.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Index internal node: index keys plus child pointers.
    InternalIndex = 0x02,
    /// Table internal node: row keys plus child pointers.
    InternalTable = 0x05,
    /// Index leaf node: index keys pointing at primary keys.
    LeafIndex = 0x0A,
    /// Table leaf node: rows.
    LeafTable = 0x0D,
}

impl NodeType {
    /// Convert from u8, returning None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(NodeType::InternalIndex),
            0x05 => Some(NodeType::InternalTable),
            0x0A => Some(NodeType::LeafIndex),
            0x0D => Some(NodeType::LeafTable),
            _ => None,
        }
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeType::LeafIndex | NodeType::LeafTable)
    }

    #[inline]
    pub fn is_table(self) -> bool {
        matches!(self, NodeType::InternalTable | NodeType::LeafTable)
    }

    /// Whether cells of this node type can be encoded and decoded.
    #[inline]
    pub fn has_cell_codec(self) -> bool {
        self == NodeType::LeafTable
    }
}

impl TryFrom<u8> for NodeType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(Error::InvalidNodeType(value))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::InternalIndex => "internal index",
            NodeType::InternalTable => "internal table",
            NodeType::LeafIndex => "leaf index",
            NodeType::LeafTable => "leaf table",
        };
        f.write_str(name)
    }
}

/// The fixed node header fields.
///
/// # Layout (12 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     node_type
/// 1       2     free_offset
/// 3       2     n_cells
/// 5       2     cells_offset
/// 7       2     right_page
/// 9       1     cell offset array start (always 12, never read back)
/// 10      2     zero
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub free_offset: u16,
    pub n_cells: u16,
    pub cells_offset: u16,
    pub right_page: u16,
}

impl NodeHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 12;

    /// Where the offset array begins, right after the header.
    pub const CELL_OFFSET_ARRAY_START: u16 = Self::SIZE as u16;

    /// Offset of each field within the header.
    pub const OFFSET_NODE_TYPE: usize = 0;
    pub const OFFSET_FREE_OFFSET: usize = 1;
    pub const OFFSET_N_CELLS: usize = 3;
    pub const OFFSET_CELLS_OFFSET: usize = 5;
    pub const OFFSET_RIGHT_PAGE: usize = 7;
    pub const OFFSET_CELL_OFFSET_ARRAY: usize = 9;

    /// Header of an empty node whose content region is `content_len` bytes.
    pub fn empty(node_type: NodeType, content_len: u16) -> Self {
        Self {
            node_type,
            free_offset: Self::CELL_OFFSET_ARRAY_START,
            n_cells: 0,
            cells_offset: content_len,
            right_page: 0,
        }
    }

    /// Decode a header from the start of `data`.
    ///
    /// # Errors
    /// Returns `Error::ShortBuffer` if `data` is shorter than the header,
    /// or `Error::InvalidNodeType` for an unknown type byte.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        let node_type = NodeType::try_from(reader.read_u8()?)?;
        let header = Self {
            node_type,
            free_offset: reader.read_u16_le()?,
            n_cells: reader.read_u16_le()?,
            cells_offset: reader.read_u16_le()?,
            right_page: reader.read_u16_le()?,
        };
        // The array start byte and the padding complete the header
        reader.read_bytes(Self::SIZE - reader.position())?;
        Ok(header)
    }

    /// Write this header to the start of `data`.
    ///
    /// # Errors
    /// Returns `Error::ShortBuffer` if `data.len() < NodeHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        let mut writer = ByteWriter::new(data);
        writer.put_u8(self.node_type as u8)?;
        writer.put_u16_le(self.free_offset)?;
        writer.put_u16_le(self.n_cells)?;
        writer.put_u16_le(self.cells_offset)?;
        writer.put_u16_le(self.right_page)?;
        writer.put_u8(Self::CELL_OFFSET_ARRAY_START as u8)?;
        writer.put_bytes(&[0u8; 2])?;
        Ok(())
    }
}

/// In-memory B-Tree node backed by a page buffer.
///
/// Header fields are plain public fields: mutate them directly and persist
/// with [`BTree::write_node`](crate::BTree::write_node). Cell insertions edit
/// the page buffer in place and also need `write_node` to become durable.
/// There is no dirty tracking.
///
/// # Offsets
/// `free_offset`, `cells_offset` and the offset array entries count from
/// the start of the node content region, not from the start of the page.
/// On page 1 that region begins after the `HEADER_SIZE`-byte file header,
/// so an empty root stores `cells_offset = page_size - HEADER_SIZE` where a
/// page-relative format would store `page_size`. Every other page starts
/// its content region at byte 0 and the two conventions agree there.
#[derive(Debug)]
pub struct BTreeNode {
    page: Page,
    pub node_type: NodeType,
    /// Offset where free space begins (end of the offset array).
    pub free_offset: u16,
    /// Number of cells stored.
    pub n_cells: u16,
    /// Offset where cell storage begins; the content length when empty
    /// (`page_size`, or `page_size - HEADER_SIZE` on page 1).
    pub cells_offset: u16,
    /// Right child page (internal nodes only); 0 if unused.
    pub right_page: u16,
}

impl BTreeNode {
    /// Wrap `page` as an empty node of `node_type`.
    ///
    /// Only the in-memory fields are initialized; the page bytes are left
    /// as they are until [`write_header`](BTreeNode::write_header).
    ///
    /// # Errors
    /// Returns `Error::InvalidPageSize` if the content region is too long for
    /// the 16-bit `cells_offset` field.
    pub fn new(page: Page, node_type: NodeType) -> Result<Self> {
        let content_len =
            u16::try_from(page.content().len()).map_err(|_| Error::InvalidPageSize(page.len()))?;
        let header = NodeHeader::empty(node_type, content_len);
        Ok(Self::with_header(page, header))
    }

    /// Decode the node stored in `page`.
    ///
    /// # Errors
    /// Returns `Error::InvalidNodeType` for an unknown type byte, or
    /// `Error::CorruptNode` if the header fields describe a layout that does
    /// not fit the page.
    pub fn from_page(page: Page) -> Result<Self> {
        let header = NodeHeader::from_bytes(page.content())?;
        let node = Self::with_header(page, header);
        node.validate_layout()?;
        Ok(node)
    }

    /// Check that the header fields describe a layout that fits the page:
    /// `12 <= free_offset <= cells_offset <= content_len`.
    ///
    /// Runs on every load and before every header write, so any header that
    /// reaches disk through this type can be loaded again.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` naming the violated bound.
    pub fn validate_layout(&self) -> Result<()> {
        let free = usize::from(self.free_offset);
        let cells = usize::from(self.cells_offset);
        if free < NodeHeader::SIZE {
            return Err(self.corrupt("free offset points into the node header"));
        }
        if free > cells {
            return Err(self.corrupt("free offset lies past the cell area"));
        }
        if cells > self.content_len() {
            return Err(self.corrupt("cell area extends past the end of the page"));
        }
        Ok(())
    }

    fn with_header(page: Page, header: NodeHeader) -> Self {
        Self {
            page,
            node_type: header.node_type,
            free_offset: header.free_offset,
            n_cells: header.n_cells,
            cells_offset: header.cells_offset,
            right_page: header.right_page,
        }
    }

    /// Page number backing this node.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page.id()
    }

    /// The backing page buffer.
    #[inline]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Give up the node view and keep the page buffer.
    pub fn into_page(self) -> Page {
        self.page
    }

    /// Snapshot of the current header fields.
    pub fn header(&self) -> NodeHeader {
        NodeHeader {
            node_type: self.node_type,
            free_offset: self.free_offset,
            n_cells: self.n_cells,
            cells_offset: self.cells_offset,
            right_page: self.right_page,
        }
    }

    /// Fixed start of the offset array.
    #[inline]
    pub fn cell_offset_array_start(&self) -> u16 {
        NodeHeader::CELL_OFFSET_ARRAY_START
    }

    /// Length of the node content region.
    #[inline]
    pub fn content_len(&self) -> usize {
        self.page.content().len()
    }

    /// Bytes between the end of the offset array and the start of the cells.
    #[inline]
    pub fn free_space(&self) -> usize {
        usize::from(self.cells_offset).saturating_sub(usize::from(self.free_offset))
    }

    /// Serialize the header fields into bytes `[0, 12)` of the content
    /// region. Offset array and cell bytes are untouched.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` if the fields fail
    /// [`validate_layout`](BTreeNode::validate_layout); the page is not
    /// modified in that case.
    pub fn write_header(&mut self) -> Result<()> {
        self.validate_layout()?;
        let header = self.header();
        header.write_to(self.page.content_mut())
    }

    /// Full serialized content region: header, resident offset array and
    /// cells, with the free space between them zeroed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = self.page.content().to_vec();
        self.header().write_to(&mut out)?;

        let free = usize::from(self.free_offset).min(out.len());
        let cells = usize::from(self.cells_offset).clamp(free, out.len());
        out[free..cells].fill(0);
        Ok(out)
    }

    /// Insert `cell` at ordinal position `slot` in `[0, n_cells]`.
    ///
    /// The cell bytes go right below the current cell area and a new offset
    /// array entry is inserted at `slot`, shifting the entries at or after
    /// `slot` one position outward.
    ///
    /// # Errors
    /// - `Error::UnsupportedCellLayout` if this node type has no cell codec
    /// - `Error::CellTypeMismatch` if `cell` belongs in another node type
    /// - `Error::SlotNotFound` if `slot > n_cells`
    /// - `Error::NodeFull` if the cell and its pointer don't fit in free space
    ///
    /// On error the node is left unmodified.
    pub fn insert_cell(&mut self, slot: u16, cell: &BTreeCell) -> Result<()> {
        if !self.node_type.has_cell_codec() {
            return Err(Error::UnsupportedCellLayout(self.node_type));
        }
        if cell.node_type() != self.node_type {
            return Err(Error::CellTypeMismatch {
                node: self.node_type,
                cell: cell.node_type(),
            });
        }
        if slot > self.n_cells {
            return Err(Error::SlotNotFound {
                slot,
                n_cells: self.n_cells,
            });
        }
        self.check_cell_layout()?;

        let bytes = cell.encode()?;
        let needed = bytes.len() + CELL_POINTER_SIZE;
        let available = self.free_space();
        if needed > available {
            return Err(Error::NodeFull { needed, available });
        }

        let free = usize::from(self.free_offset);
        let cells = usize::from(self.cells_offset);
        let new_cells = cells - bytes.len();
        let entry = Self::entry_offset(slot);

        let content = self.page.content_mut();
        content[new_cells..cells].copy_from_slice(&bytes);
        content.copy_within(entry..free, entry + CELL_POINTER_SIZE);
        // new_cells < cells_offset, so it fits in u16
        content[entry..entry + CELL_POINTER_SIZE].copy_from_slice(&(new_cells as u16).to_le_bytes());

        self.cells_offset = new_cells as u16;
        self.n_cells += 1;
        self.free_offset += CELL_POINTER_SIZE as u16;

        debug_assert_eq!(
            usize::from(self.free_offset),
            Self::entry_offset(self.n_cells)
        );
        Ok(())
    }

    /// Read the cell at ordinal position `slot` in `[0, n_cells)`.
    ///
    /// # Errors
    /// - `Error::SlotNotFound` if `slot >= n_cells`
    /// - `Error::UnsupportedCellLayout` if this node type has no cell codec
    /// - `Error::CorruptNode` if the offset array points outside the cell area
    pub fn get_cell(&self, slot: u16) -> Result<BTreeCell> {
        if slot >= self.n_cells {
            return Err(Error::SlotNotFound {
                slot,
                n_cells: self.n_cells,
            });
        }
        if !self.node_type.has_cell_codec() {
            return Err(Error::UnsupportedCellLayout(self.node_type));
        }
        self.check_cell_layout()?;

        let offset = usize::from(self.cell_offset(slot)?);
        if offset < usize::from(self.cells_offset) || offset >= self.content_len() {
            return Err(self.corrupt(format!("cell {} offset {} outside the cell area", slot, offset)));
        }

        BTreeCell::decode(self.node_type, &self.page.content()[offset..])
    }

    /// Decode every cell in slot order.
    pub fn cells(&self) -> impl Iterator<Item = Result<BTreeCell>> + '_ {
        (0..self.n_cells).map(move |slot| self.get_cell(slot))
    }

    /// Stored offset array entry for `slot`.
    fn cell_offset(&self, slot: u16) -> Result<u16> {
        let mut reader = ByteReader::new(self.page.content());
        reader.seek(Self::entry_offset(slot))?;
        reader.read_u16_le()
    }

    #[inline]
    fn entry_offset(slot: u16) -> usize {
        usize::from(NodeHeader::CELL_OFFSET_ARRAY_START) + CELL_POINTER_SIZE * usize::from(slot)
    }

    /// The header fields must describe a dense offset array that ends where
    /// free space begins, with the cell area inside the page.
    fn check_cell_layout(&self) -> Result<()> {
        if usize::from(self.free_offset) != Self::entry_offset(self.n_cells) {
            return Err(self.corrupt(format!(
                "free offset {} does not match {} cells",
                self.free_offset, self.n_cells
            )));
        }
        self.validate_layout()
    }

    fn corrupt(&self, reason: impl Into<String>) -> Error {
        Error::CorruptNode {
            page: self.page.id().0,
            reason: reason.into(),
        }
    }
}
