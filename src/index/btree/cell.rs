//! Cell codec - variable-length records stored inside a node.
//!
//! A cell has no identity of its own on disk: it is a packed byte run in
//! the node's cell area, addressed by one entry of the offset array.
//!
//! # Table leaf layout (little-endian)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     size (payload length)
//! 4       4     key
//! 8       size  data
//! ```
//!
//! The other three cell kinds have a known format but no codec yet; their
//! encode and decode paths return [`Error::UnsupportedCellLayout`].

use crate::common::codec::{ByteReader, ByteWriter};
use crate::common::{Error, Result};

use super::node::NodeType;

/// In-memory representation of one cell, keyed by the owning node's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BTreeCell {
    /// Row stored in a table leaf.
    TableLeaf { key: u32, data: Vec<u8> },
    /// Routing entry of a table internal node.
    TableInternal { key: u32, child_page: u32 },
    /// Index entry pointing at the primary key of a row.
    IndexLeaf { key: u32, key_pk: u32 },
    /// Routing entry of an index internal node.
    IndexInternal {
        key: u32,
        key_pk: u32,
        child_page: u32,
    },
}

impl BTreeCell {
    /// Length of the fixed `size` + `key` prefix of a table leaf cell.
    pub const TABLE_LEAF_PREFIX: usize = 8;

    /// Build a table leaf cell.
    pub fn table_leaf(key: u32, data: impl Into<Vec<u8>>) -> Self {
        BTreeCell::TableLeaf {
            key,
            data: data.into(),
        }
    }

    /// The cell's key.
    pub fn key(&self) -> u32 {
        match self {
            BTreeCell::TableLeaf { key, .. }
            | BTreeCell::TableInternal { key, .. }
            | BTreeCell::IndexLeaf { key, .. }
            | BTreeCell::IndexInternal { key, .. } => *key,
        }
    }

    /// Type of node this cell belongs in.
    pub fn node_type(&self) -> NodeType {
        match self {
            BTreeCell::TableLeaf { .. } => NodeType::LeafTable,
            BTreeCell::TableInternal { .. } => NodeType::InternalTable,
            BTreeCell::IndexLeaf { .. } => NodeType::LeafIndex,
            BTreeCell::IndexInternal { .. } => NodeType::InternalIndex,
        }
    }

    /// Payload length of a table leaf cell.
    pub fn size(&self) -> Option<u32> {
        match self {
            BTreeCell::TableLeaf { data, .. } => u32::try_from(data.len()).ok(),
            _ => None,
        }
    }

    /// Payload of a table leaf cell.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            BTreeCell::TableLeaf { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Number of bytes the encoded cell occupies.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedCellLayout` for cell kinds without a codec.
    pub fn encoded_len(&self) -> Result<usize> {
        match self {
            BTreeCell::TableLeaf { data, .. } => Ok(Self::TABLE_LEAF_PREFIX + data.len()),
            other => Err(Error::UnsupportedCellLayout(other.node_type())),
        }
    }

    /// Pack the cell into its on-disk byte layout.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedCellLayout` for cell kinds without a
    /// codec, or `Error::NodeFull` if the payload length overflows `u32`.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.encoded_len()?];
        match self {
            BTreeCell::TableLeaf { key, data } => {
                let size = u32::try_from(data.len()).map_err(|_| Error::NodeFull {
                    needed: out.len(),
                    available: u32::MAX as usize,
                })?;
                let mut writer = ByteWriter::new(&mut out);
                writer.put_u32_le(size)?;
                writer.put_u32_le(*key)?;
                writer.put_bytes(data)?;
            }
            other => return Err(Error::UnsupportedCellLayout(other.node_type())),
        }
        Ok(out)
    }

    /// Unpack a cell of `node_type` from the start of `bytes`.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedCellLayout` for node types without a
    /// codec, or `Error::ShortBuffer` if the cell runs past `bytes`.
    pub fn decode(node_type: NodeType, bytes: &[u8]) -> Result<Self> {
        match node_type {
            NodeType::LeafTable => {
                let mut reader = ByteReader::new(bytes);
                let size = reader.read_u32_le()? as usize;
                let key = reader.read_u32_le()?;
                let data = reader.read_bytes(size)?.to_vec();
                Ok(BTreeCell::TableLeaf { key, data })
            }
            other => Err(Error::UnsupportedCellLayout(other)),
        }
    }
}
