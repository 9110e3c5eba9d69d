//! Pager - page-granular access to the database file.
//!
//! The [`Pager`] handles all direct file operations:
//! - Translating page numbers to byte offsets
//! - Reading and writing whole pages
//! - Reading and writing the file header region
//! - Tracking how many pages are allocated

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::common::config::{validate_page_size, Config, HEADER_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Paged access to a single database file.
///
/// # File Layout
/// The database is stored as a single file with pages laid out sequentially.
/// Page numbers start at 1, and page 1 also carries the file header:
/// ```text
/// ┌────────┬──────────┬─────────┬─────────┬─────────┐
/// │ header │ page 1   │ page 2  │  ...    │ page N  │
/// │ (100B) │ content  │         │         │         │
/// └────────┴──────────┴─────────┴─────────┴─────────┘
/// Offset:  0        page_size  2×page_size     (N-1)×page_size
/// ```
///
/// Page N is located at file offset `(N - 1) × page_size`.
///
/// # Page Count
/// The allocated page count is derived from the file size on open
/// (rounded up, so a file holding only a header counts one page) and grows
/// with every [`allocate_page`](Pager::allocate_page). Pages are only
/// addressable once allocated.
///
/// # Thread Safety
/// `Pager` is **single-threaded**. [`BTree`](crate::BTree) serializes access
/// to its pager behind a mutex.
///
/// # Durability
/// Writes always cover a whole page or the whole header. When
/// `sync_on_write` is set, every write is followed by `fsync()`.
pub struct Pager {
    file: File,
    page_size: usize,
    /// Number of allocated pages; the highest valid page number.
    page_count: u32,
    sync_on_write: bool,
}

impl Pager {
    /// Open a database file with default options, creating it if absent.
    ///
    /// # Errors
    /// Returns an I/O error if the path cannot be opened for read-write access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &Config::default())
    }

    /// Open a database file, creating it if absent.
    ///
    /// # Errors
    /// Returns `Error::InvalidPageSize` for an unsupported page size, or an
    /// I/O error if the path cannot be opened for read-write access.
    pub fn open_with<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        config.validate()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let file_size = file.metadata()?.len();
        let page_count = Self::pages_for(file_size, config.page_size)?;
        debug!(
            path = %path.as_ref().display(),
            file_size,
            page_count,
            "pager.open"
        );

        Ok(Self {
            file,
            page_size: config.page_size,
            page_count,
            sync_on_write: config.sync_on_write,
        })
    }

    /// Whether the file holds no bytes at all.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.file.metadata()?.len() == 0)
    }

    /// Read the header region, bytes `[0, HEADER_SIZE)`.
    ///
    /// Works before any page is allocated and regardless of page size.
    /// Bytes past the end of the file read as zero.
    pub fn read_header(&mut self) -> Result<[u8; HEADER_SIZE]> {
        let mut header = [0u8; HEADER_SIZE];
        let count = self.read_at(0, &mut header)?;
        debug!(bytes = count, "pager.read_header");
        Ok(header)
    }

    /// Write exactly `HEADER_SIZE` bytes at file offset 0.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeaderLength` if `header` is not exactly
    /// `HEADER_SIZE` bytes long.
    pub fn write_header(&mut self, header: &[u8]) -> Result<()> {
        if header.len() != HEADER_SIZE {
            return Err(Error::InvalidHeaderLength(header.len()));
        }

        self.write_at(0, header)?;
        debug!(bytes = header.len(), "pager.write_header");
        Ok(())
    }

    /// Allocate the next page number.
    ///
    /// Only the in-memory count changes; the page reaches the file on its
    /// first [`write_page`](Pager::write_page). Until then it reads as zeros.
    pub fn allocate_page(&mut self) -> PageId {
        self.page_count += 1;
        debug!(page = self.page_count, "pager.allocate_page");
        PageId::new(self.page_count)
    }

    /// Read a page from disk.
    ///
    /// A page that was allocated but never (fully) written is zero-filled
    /// past the end of the file. On page 1 the returned page's usable offset
    /// skips the header region.
    ///
    /// # Errors
    /// Returns `Error::InvalidPageNumber` if the page is 0 or not allocated.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        self.check_page(page_id)?;

        let mut page = Page::new(page_id, self.page_size);
        let offset = page_id.file_offset(self.page_size);
        let count = self.read_at(offset, page.as_mut_slice())?;
        debug!(page = page_id.0, bytes = count, "pager.read_page");

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    /// On page 1 only the node content `[HEADER_SIZE, page_size)` is
    /// written; the header region belongs to [`write_header`](Pager::write_header).
    ///
    /// # Errors
    /// Returns `Error::InvalidPageNumber` if the page hasn't been allocated,
    /// or `Error::InvalidPageLength` if the buffer is not `page_size` long.
    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        let page_id = page.id();
        self.check_page(page_id)?;

        if page.len() != self.page_size {
            return Err(Error::InvalidPageLength {
                expected: self.page_size,
                actual: page.len(),
            });
        }

        let skip = if page_id.is_root() { HEADER_SIZE } else { 0 };
        let offset = page_id.file_offset(self.page_size) + skip as u64;
        self.write_at(offset, &page.as_slice()[skip..])?;
        debug!(page = page_id.0, bytes = page.len() - skip, "pager.write_page");

        Ok(())
    }

    /// Flush file contents and metadata to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Release the file handle after flushing it.
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        debug!(page_count = self.page_count, "pager.close");
        Ok(())
    }

    /// Get the number of allocated pages.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the page size in bytes.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Switch to the page size recorded by an existing file.
    ///
    /// The page count is recomputed from the file size.
    ///
    /// # Errors
    /// Returns `Error::InvalidPageSize` for an unsupported page size, or
    /// `Error::FileTooLarge` if the file holds more than `u32::MAX` pages at
    /// that size. The pager is unchanged on error.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        validate_page_size(page_size)?;
        let file_size = self.file.metadata()?.len();
        self.page_count = Self::pages_for(file_size, page_size)?;
        self.page_size = page_size;
        Ok(())
    }

    fn check_page(&self, page_id: PageId) -> Result<()> {
        if !page_id.is_valid() || page_id.0 > self.page_count {
            return Err(Error::InvalidPageNumber(page_id.0));
        }
        Ok(())
    }

    /// Pages covered by `file_size` bytes, counting a partial last page.
    fn pages_for(file_size: u64, page_size: usize) -> Result<u32> {
        u32::try_from(file_size.div_ceil(page_size as u64))
            .map_err(|_| Error::FileTooLarge { file_size, page_size })
    }

    /// Fill `buf` from `offset`, leaving bytes past end-of-file as they are.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        if self.sync_on_write {
            self.file.sync_all()?; // fsync for durability
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("page_size", &self.page_size)
            .field("page_count", &self.page_count)
            .field("sync_on_write", &self.sync_on_write)
            .finish()
    }
}
