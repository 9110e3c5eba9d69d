//! Page identifier type.

use std::fmt;

/// Identifies a page in the database file.
///
/// Page numbers are 1-based: page 1 occupies bytes `[0, page_size)` and
/// also carries the file header. The value 0 never names a page; it is
/// used as the "no page" marker, e.g. for an unused right-child pointer.
///
/// # Example
/// ```
/// use pagedb::PageId;
///
/// let page_id = PageId::new(3);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.file_offset(4096), 8192);
/// assert!(!PageId::NONE.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel for "no page".
    pub const NONE: PageId = PageId(0);

    /// The root page, which also holds the file header.
    pub const ROOT: PageId = PageId(1);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID can name a page (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::NONE
    }

    /// Whether this is page 1.
    #[inline]
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    /// Byte offset of this page in a file of `page_size`-byte pages.
    ///
    /// Must only be called on a valid page ID.
    #[inline]
    pub fn file_offset(&self, page_size: usize) -> u64 {
        debug_assert!(self.is_valid());
        u64::from(self.0 - 1) * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            write!(f, "Page(NONE)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
