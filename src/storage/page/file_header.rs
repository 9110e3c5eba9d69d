//! File header stored in the first `HEADER_SIZE` bytes of page 1.

use crate::common::codec::ByteReader;
use crate::common::config::{
    validate_page_size, DEFAULT_PAGE_CACHE_SIZE, DEFAULT_PAGE_SIZE, HEADER_SIZE, MAGIC, MAGIC_LEN,
};
use crate::common::{Error, Result};

/// Metadata describing the whole database file.
///
/// # Layout (HEADER_SIZE = 100 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       15    magic ("SQLite format 3")
/// 15      2     page_size
/// 17      4     file_change_counter
/// 21      4     schema_version
/// 25      4     page_cache_size
/// 29      4     user_cookie
/// 33      67    zero padding
/// ```
///
/// The counters are never bumped by the codec itself; callers update them
/// and persist the header with [`BTree::write_header`](crate::BTree::write_header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format identifier; must equal [`MAGIC`].
    pub magic: [u8; MAGIC_LEN],
    /// Page size used to create the file.
    pub page_size: u16,
    /// Incremented by callers on each modification.
    pub file_change_counter: u32,
    /// Incremented by callers on each schema change.
    pub schema_version: u32,
    /// Suggested page cache size. Informational.
    pub page_cache_size: u32,
    /// Free for caller use.
    pub user_cookie: u32,
}

impl FileHeader {
    /// Size of the encoded header in bytes, padding included.
    pub const SIZE: usize = HEADER_SIZE;

    /// Offset of each field within the header.
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_PAGE_SIZE: usize = 15;
    pub const OFFSET_FILE_CHANGE_COUNTER: usize = 17;
    pub const OFFSET_SCHEMA_VERSION: usize = 21;
    pub const OFFSET_PAGE_CACHE_SIZE: usize = 25;
    pub const OFFSET_USER_COOKIE: usize = 29;

    /// Create a fresh header for a file with `page_size`-byte pages.
    ///
    /// Counters start at zero and the cache size at its initial value.
    pub fn new(page_size: u16) -> Self {
        Self {
            magic: *MAGIC,
            page_size,
            file_change_counter: 0,
            schema_version: 0,
            page_cache_size: DEFAULT_PAGE_CACHE_SIZE,
            user_cookie: 0,
        }
    }

    /// Decode a header from the start of `data`.
    ///
    /// Field values are not validated; see [`FileHeader::validate`].
    ///
    /// # Errors
    /// Returns `Error::ShortBuffer` if `data` is shorter than the fields.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        Ok(Self {
            magic: reader.read_array()?,
            page_size: reader.read_u16_le()?,
            file_change_counter: reader.read_u32_le()?,
            schema_version: reader.read_u32_le()?,
            page_cache_size: reader.read_u32_le()?,
            user_cookie: reader.read_u32_le()?,
        })
    }

    /// Write this header, zero padding included, to the start of `data`.
    ///
    /// # Errors
    /// Returns `Error::ShortBuffer` if `data.len() < FileHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        let len = data.len();
        let region = data.get_mut(..Self::SIZE).ok_or(Error::ShortBuffer {
            offset: 0,
            needed: Self::SIZE,
            len,
        })?;
        region.copy_from_slice(&self.to_bytes());
        Ok(())
    }

    /// Encode into a fresh `HEADER_SIZE` buffer.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut raw = [0u8; HEADER_SIZE];
        raw[Self::OFFSET_MAGIC..Self::OFFSET_PAGE_SIZE].copy_from_slice(&self.magic);
        raw[Self::OFFSET_PAGE_SIZE..Self::OFFSET_FILE_CHANGE_COUNTER]
            .copy_from_slice(&self.page_size.to_le_bytes());
        raw[Self::OFFSET_FILE_CHANGE_COUNTER..Self::OFFSET_SCHEMA_VERSION]
            .copy_from_slice(&self.file_change_counter.to_le_bytes());
        raw[Self::OFFSET_SCHEMA_VERSION..Self::OFFSET_PAGE_CACHE_SIZE]
            .copy_from_slice(&self.schema_version.to_le_bytes());
        raw[Self::OFFSET_PAGE_CACHE_SIZE..Self::OFFSET_USER_COOKIE]
            .copy_from_slice(&self.page_cache_size.to_le_bytes());
        raw[Self::OFFSET_USER_COOKIE..Self::OFFSET_USER_COOKIE + 4]
            .copy_from_slice(&self.user_cookie.to_le_bytes());
        raw
    }

    /// Whether the magic bytes identify this file format.
    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        &self.magic == MAGIC
    }

    /// Page size as a byte count.
    #[inline]
    pub fn page_size(&self) -> usize {
        usize::from(self.page_size)
    }

    /// Check the header of an existing file.
    ///
    /// # Errors
    /// Returns `Error::CorruptHeader` if the magic does not match or the
    /// recorded page size is not a supported page size.
    pub fn validate(&self) -> Result<()> {
        if !self.has_valid_magic() {
            return Err(Error::CorruptHeader("magic bytes do not match"));
        }
        validate_page_size(self.page_size())
            .map_err(|_| Error::CorruptHeader("unsupported page size"))
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_header() {
        let header = FileHeader::default();
        assert!(header.has_valid_magic());
        assert_eq!(header.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(header.file_change_counter, 0);
        assert_eq!(header.schema_version, 0);
        assert_eq!(header.page_cache_size, DEFAULT_PAGE_CACHE_SIZE);
        assert_eq!(header.user_cookie, 0);
        assert!(header.validate().is_ok());
    }

    #[test]
    fn test_header_byte_layout() {
        let header = FileHeader {
            magic: *MAGIC,
            page_size: 0x0201,
            file_change_counter: 0x06050403,
            schema_version: 0x0A090807,
            page_cache_size: 0x0E0D0C0B,
            user_cookie: 0x1211100F,
        };

        let raw = header.to_bytes();

        assert_eq!(&raw[..15], b"SQLite format 3");
        assert_eq!(raw[FileHeader::OFFSET_PAGE_SIZE], 0x01);
        assert_eq!(raw[FileHeader::OFFSET_PAGE_SIZE + 1], 0x02);
        assert_eq!(raw[FileHeader::OFFSET_FILE_CHANGE_COUNTER], 0x03);
        assert_eq!(raw[FileHeader::OFFSET_SCHEMA_VERSION], 0x07);
        assert_eq!(raw[FileHeader::OFFSET_PAGE_CACHE_SIZE], 0x0B);
        assert_eq!(raw[FileHeader::OFFSET_USER_COOKIE], 0x0F);
        assert_eq!(raw[FileHeader::OFFSET_USER_COOKIE + 3], 0x12);
        assert!(raw[FileHeader::OFFSET_USER_COOKIE + 4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_to_overwrites_stale_padding() {
        let mut raw = [0xFFu8; HEADER_SIZE];
        FileHeader::default().write_to(&mut raw).unwrap();
        assert_eq!(raw[HEADER_SIZE - 1], 0);
    }

    #[test]
    fn test_write_to_matches_to_bytes() {
        let mut header = FileHeader::new(4096);
        header.schema_version = 0xDEADBEEF;
        let mut raw = [0xAAu8; HEADER_SIZE + 8];
        header.write_to(&mut raw).unwrap();

        assert_eq!(&raw[..HEADER_SIZE], &header.to_bytes()[..]);
        // Bytes past the header are not touched
        assert_eq!(&raw[HEADER_SIZE..], &[0xAA; 8]);
    }

    #[test]
    fn test_write_to_rejects_short_buffer() {
        let mut raw = [0u8; HEADER_SIZE - 1];
        assert!(matches!(
            FileHeader::default().write_to(&mut raw),
            Err(Error::ShortBuffer { .. })
        ));
    }

    #[test]
    fn test_from_bytes_rejects_short_buffer() {
        assert!(FileHeader::from_bytes(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_magic() {
        let mut header = FileHeader::default();
        header.magic[0] = b'X';
        assert!(matches!(header.validate(), Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_validate_rejects_bad_page_size() {
        let header = FileHeader::new(1000);
        assert!(matches!(header.validate(), Err(Error::CorruptHeader(_))));
    }

    proptest! {
        #[test]
        fn header_roundtrip(
            page_size in any::<u16>(),
            file_change_counter in any::<u32>(),
            schema_version in any::<u32>(),
            page_cache_size in any::<u32>(),
            user_cookie in any::<u32>(),
        ) {
            let original = FileHeader {
                magic: *MAGIC,
                page_size,
                file_change_counter,
                schema_version,
                page_cache_size,
                user_cookie,
            };
            let raw = original.to_bytes();
            prop_assert_eq!(raw.len(), HEADER_SIZE);
            prop_assert_eq!(FileHeader::from_bytes(&raw).unwrap(), original);
        }
    }
}
