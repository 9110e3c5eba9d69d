//! Page - the fixed-size unit of file I/O.
//!
//! A [`Page`] is an in-memory copy of one page of the database file. It is
//! owned by whoever read it and only reaches disk through
//! [`Pager::write_page`](crate::storage::Pager::write_page).

use crate::common::config::HEADER_SIZE;
use crate::common::PageId;

/// An in-memory page buffer.
///
/// # Layout
/// ```text
/// page 1:    ┌──────────────────┬─────────────────────────────────┐
///            │ file header      │ node content                    │
///            │ [0, HEADER_SIZE) │ [HEADER_SIZE, page_size)        │
///            └──────────────────┴─────────────────────────────────┘
/// page n>1:  ┌────────────────────────────────────────────────────┐
///            │ node content [0, page_size)                        │
///            └────────────────────────────────────────────────────┘
/// ```
///
/// The usable offset marks where node content starts. `content()` and
/// `content_mut()` expose only that region; `as_slice()` exposes the whole
/// buffer.
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code: repeated reads of
/// the same page already yield independent copies, and a silent copy would
/// make it easy to write back a stale one. A `#[cfg(test)]` Clone is
/// provided for tests.
///
/// # Example
/// ```
/// use pagedb::{Page, PageId};
///
/// let mut page = Page::new(PageId::new(2), 4096);
/// page.content_mut()[0] = 0x0D;
/// assert_eq!(page.as_slice()[0], 0x0D);
/// assert_eq!(page.usable_offset(), 0);
/// ```
pub struct Page {
    id: PageId,
    usable_offset: usize,
    data: Box<[u8]>,
}

impl Page {
    /// Create a new zeroed page.
    pub fn new(id: PageId, page_size: usize) -> Self {
        Self::from_bytes(id, vec![0u8; page_size])
    }

    /// Wrap raw bytes as the buffer of page `id`.
    ///
    /// The length is not checked here; the pager rejects buffers whose
    /// length differs from its page size on write.
    pub fn from_bytes(id: PageId, data: Vec<u8>) -> Self {
        let usable_offset = if id.is_root() { HEADER_SIZE } else { 0 };
        Self {
            id,
            usable_offset: usable_offset.min(data.len()),
            data: data.into_boxed_slice(),
        }
    }

    /// The page number.
    #[inline]
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Offset where node content starts: `HEADER_SIZE` on page 1, else 0.
    #[inline]
    pub fn usable_offset(&self) -> usize {
        self.usable_offset
    }

    /// Length of the whole buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get immutable slice of the whole page.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of the whole page.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The node content region, after the file header on page 1.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.data[self.usable_offset..]
    }

    /// Mutable node content region.
    #[inline]
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.usable_offset..]
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Zero the node content region, leaving any header bytes alone.
    pub fn reset_content(&mut self) {
        self.content_mut().fill(0);
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("usable_offset", &self.usable_offset)
            .field("len", &self.data.len())
            .finish()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            usable_offset: self.usable_offset,
            data: self.data.clone(),
        }
    }
}
