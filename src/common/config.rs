//! Configuration constants and open-time options.

use crate::common::{Error, Result};

/// Default size of a page in bytes (16KB).
///
/// Must fit the node header's 16-bit `cells_offset`, which holds the page
/// size itself when a node is empty.
pub const DEFAULT_PAGE_SIZE: usize = 4096 * 4;

/// Smallest page size accepted by [`Config::validate`].
pub const MIN_PAGE_SIZE: usize = 512;

/// Largest page size accepted by [`Config::validate`].
///
/// 65536 would not fit in the header's 16-bit page size field.
pub const MAX_PAGE_SIZE: usize = 32768;

/// Size of the file header at the start of page 1.
pub const HEADER_SIZE: usize = 100;

/// Length of the format identifier.
pub const MAGIC_LEN: usize = 15;

/// Format identifier stored in the first bytes of every database file.
pub const MAGIC: &[u8; MAGIC_LEN] = b"SQLite format 3";

/// Initial value of the header's suggested page cache size.
pub const DEFAULT_PAGE_CACHE_SIZE: u32 = 20000;

/// Options applied when a database file is opened.
///
/// # Example
/// ```
/// use pagedb::Config;
///
/// let config = Config::default().with_page_size(4096).with_sync_on_write(true);
/// assert!(config.validate().is_ok());
/// assert!(Config::default().with_page_size(1000).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Page size used when creating a new file. Existing files keep the
    /// size recorded in their header.
    pub page_size: usize,
    /// Value written to the header's page cache size field on creation.
    pub page_cache_size: u32,
    /// Call `fsync()` after every page and header write.
    pub sync_on_write: bool,
}

impl Config {
    /// Set the page size for newly created files.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the suggested page cache size recorded in new headers.
    pub fn with_page_cache_size(mut self, page_cache_size: u32) -> Self {
        self.page_cache_size = page_cache_size;
        self
    }

    /// Enable or disable `fsync()` after each write.
    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    /// Check that the options describe a usable file layout.
    ///
    /// # Errors
    /// Returns `Error::InvalidPageSize` unless the page size is a power of
    /// two in `[MIN_PAGE_SIZE, MAX_PAGE_SIZE]`.
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_cache_size: DEFAULT_PAGE_CACHE_SIZE,
            sync_on_write: false,
        }
    }
}

/// Check a page size against the supported range.
pub fn validate_page_size(page_size: usize) -> Result<()> {
    if !page_size.is_power_of_two() || !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(Error::InvalidPageSize(page_size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_size_is_valid() {
        assert!(DEFAULT_PAGE_SIZE.is_power_of_two());
        assert_eq!(DEFAULT_PAGE_SIZE, 16384);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(validate_page_size(MIN_PAGE_SIZE).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
        assert!(validate_page_size(256).is_err());
        assert!(validate_page_size(65536).is_err());
        assert!(validate_page_size(3000).is_err());
        assert!(validate_page_size(0).is_err());
    }

    #[test]
    fn test_max_page_size_fits_header_field() {
        assert!(MAX_PAGE_SIZE <= u16::MAX as usize);
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_page_size(4096)
            .with_page_cache_size(10)
            .with_sync_on_write(true);
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.page_cache_size, 10);
        assert!(config.sync_on_write);
    }
}
