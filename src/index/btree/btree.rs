//! BTree - file and node lifecycle on top of the pager.

use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::common::{Config, Error, PageId, Result};
use crate::storage::page::FileHeader;
use crate::storage::Pager;

use super::node::{BTreeNode, NodeType};

/// A B-Tree file: header validation plus node allocation, loading and
/// persistence.
///
/// # Lifecycle
/// ```text
/// open ──▶ new_node / get_node_by_page ──▶ insert_cell / mutate fields
///                                                  │
///                                   write_node ◀───┘   (only way to persist)
/// ```
///
/// # Thread Safety
/// The pager sits behind a `parking_lot::Mutex`, so every method takes
/// `&self` and runs as one atomic step against the file. Nodes are
/// independent copies: two nodes loaded from the same page diverge until
/// one of them is written back.
///
/// # Example
/// ```no_run
/// use pagedb::{BTree, BTreeCell, NodeType};
///
/// let btree = BTree::open("my_database.db")?;
/// let mut node = btree.new_node(NodeType::LeafTable)?;
/// node.insert_cell(0, &BTreeCell::table_leaf(1, "Hello World"))?;
/// btree.write_node(&mut node)?;
/// btree.close()?;
/// # Ok::<(), pagedb::Error>(())
/// ```
pub struct BTree {
    /// Handles all disk I/O.
    pager: Mutex<Pager>,
    config: Config,
}

impl BTree {
    /// Open a B-Tree file with default options.
    ///
    /// See [`BTree::open_with`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, Config::default())
    }

    /// Open a B-Tree file, creating and initializing it if empty.
    ///
    /// An empty file gets a default header using `config.page_size` and an
    /// empty table leaf node in page 1. A non-empty file must carry a valid
    /// header; its recorded page size replaces `config.page_size`. Node
    /// content is not validated here.
    ///
    /// # Errors
    /// - `Error::CorruptHeader` if the magic bytes or page size are invalid
    /// - `Error::InvalidPageSize` if `config` is invalid
    /// - I/O errors from the pager
    pub fn open_with<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let mut pager = Pager::open_with(path, &config)?;
        let mut config = config;

        if pager.is_empty()? {
            let mut header = FileHeader::new(config.page_size as u16);
            header.page_cache_size = config.page_cache_size;
            pager.write_header(&header.to_bytes())?;

            let root = pager.allocate_page();
            Self::init_node(&mut pager, root, NodeType::LeafTable)?;
            info!(page_size = config.page_size, "btree.open.initialized");
        } else {
            let header = FileHeader::from_bytes(&pager.read_header()?)?;
            if let Err(err) = header.validate() {
                warn!(error = %err, "btree.open.corrupt_header");
                return Err(err);
            }
            if header.page_size() != pager.page_size() {
                info!(
                    configured = config.page_size,
                    recorded = header.page_size(),
                    "btree.open.adopt_page_size"
                );
                pager.set_page_size(header.page_size())?;
                config.page_size = header.page_size();
            }
            debug!(page_count = pager.page_count(), "btree.open.validated");
        }

        Ok(Self {
            pager: Mutex::new(pager),
            config,
        })
    }

    /// Load the node stored in page `page_id`.
    ///
    /// The returned node is an in-memory copy; changes to it are not
    /// persisted until [`write_node`](BTree::write_node) is called.
    ///
    /// # Errors
    /// - `Error::InvalidPageNumber` if the page is not allocated
    /// - `Error::InvalidNodeType` if the stored type byte is unknown
    /// - `Error::CorruptNode` if the header offsets don't fit the page
    pub fn get_node_by_page(&self, page_id: PageId) -> Result<BTreeNode> {
        let page = self.pager.lock().read_page(page_id)?;
        BTreeNode::from_page(page)
    }

    /// Allocate a new page and persist it as an empty node of `node_type`.
    pub fn new_node(&self, node_type: NodeType) -> Result<BTreeNode> {
        let mut pager = self.pager.lock();
        let page_id = pager.allocate_page();
        Self::init_node(&mut pager, page_id, node_type)
    }

    /// Re-initialize an already allocated page as an empty node of
    /// `node_type` and persist it. Any cells on the page are discarded.
    ///
    /// # Errors
    /// Returns `Error::InvalidPageNumber` if the page is not allocated.
    pub fn init_empty_node(&self, page_id: PageId, node_type: NodeType) -> Result<BTreeNode> {
        let mut pager = self.pager.lock();
        Self::init_node(&mut pager, page_id, node_type)
    }

    /// Serialize the node's header fields into its page and write the page.
    ///
    /// Cell insertions already edited the page buffer, so this also
    /// persists them. On page 1 the file header is never touched.
    ///
    /// # Errors
    /// Returns `Error::CorruptNode` without writing anything if the header
    /// fields describe a layout [`get_node_by_page`](BTree::get_node_by_page)
    /// would reject.
    pub fn write_node(&self, node: &mut BTreeNode) -> Result<()> {
        node.write_header()?;
        self.pager.lock().write_page(node.page())?;
        debug!(
            page = node.page_id().0,
            node_type = %node.node_type,
            n_cells = node.n_cells,
            "btree.write_node"
        );
        Ok(())
    }

    /// Decode the current on-disk file header.
    pub fn read_header(&self) -> Result<FileHeader> {
        let raw = self.pager.lock().read_header()?;
        FileHeader::from_bytes(&raw)
    }

    /// Persist a caller-updated file header, e.g. after bumping counters.
    ///
    /// # Errors
    /// Returns `Error::CorruptHeader` if `header` would not pass validation
    /// on the next open, or if it changes the page size of the file.
    pub fn write_header(&self, header: &FileHeader) -> Result<()> {
        header.validate()?;
        let mut pager = self.pager.lock();
        if header.page_size() != pager.page_size() {
            return Err(Error::CorruptHeader(
                "page size cannot change after creation",
            ));
        }
        pager.write_header(&header.to_bytes())
    }

    /// Number of allocated pages.
    pub fn page_count(&self) -> u32 {
        self.pager.lock().page_count()
    }

    /// Page size of the open file.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Options in effect, with the page size of the open file.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flush and close the underlying file.
    pub fn close(self) -> Result<()> {
        self.pager.into_inner().close()
    }

    fn init_node(pager: &mut Pager, page_id: PageId, node_type: NodeType) -> Result<BTreeNode> {
        let mut page = pager.read_page(page_id)?;
        page.reset_content();

        let mut node = BTreeNode::new(page, node_type)?;
        node.write_header()?;
        pager.write_page(node.page())?;
        debug!(page = page_id.0, node_type = %node_type, "btree.init_node");

        Ok(node)
    }
}

impl std::fmt::Debug for BTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTree")
            .field("pager", &*self.pager.lock())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::{DEFAULT_PAGE_SIZE, HEADER_SIZE, MAGIC};
    use crate::index::btree::{BTreeCell, NodeHeader};
    use tempfile::tempdir;

    fn create_btree(page_size: usize) -> (BTree, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let btree = BTree::open_with(&path, Config::default().with_page_size(page_size)).unwrap();
        (btree, dir)
    }

    #[test]
    fn test_open_initializes_empty_file() {
        let (btree, _dir) = create_btree(DEFAULT_PAGE_SIZE);

        let header = btree.read_header().unwrap();
        assert_eq!(&header.magic, MAGIC);
        assert_eq!(header.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(header.file_change_counter, 0);
        assert_eq!(header.schema_version, 0);
        assert_eq!(header.user_cookie, 0);
        assert_eq!(btree.page_count(), 1);

        let root = btree.get_node_by_page(PageId::ROOT).unwrap();
        assert_eq!(root.node_type, NodeType::LeafTable);
        assert_eq!(root.n_cells, 0);
        assert_eq!(root.free_offset, 12);
        assert_eq!(root.cells_offset as usize, DEFAULT_PAGE_SIZE - HEADER_SIZE);
    }

    #[test]
    fn test_new_node_defaults() {
        let (btree, _dir) = create_btree(1024);

        let node = btree.new_node(NodeType::InternalTable).unwrap();
        assert_eq!(node.page_id(), PageId::new(2));
        assert_eq!(node.node_type, NodeType::InternalTable);
        assert_eq!(node.free_offset, 12);
        assert_eq!(node.n_cells, 0);
        assert_eq!(node.cells_offset, 1024);
        assert_eq!(node.right_page, 0);
        assert_eq!(node.cell_offset_array_start(), 12);

        let loaded = btree.get_node_by_page(node.page_id()).unwrap();
        assert_eq!(loaded.header(), node.header());
    }

    #[test]
    fn test_write_node_persists_mutations() {
        let (btree, _dir) = create_btree(1024);

        let mut node = btree.new_node(NodeType::InternalTable).unwrap();
        node.free_offset = 20;
        node.n_cells = 4;
        node.cells_offset = 900;
        node.right_page = 7;
        btree.write_node(&mut node).unwrap();

        let loaded = btree.get_node_by_page(node.page_id()).unwrap();
        assert_eq!(loaded.free_offset, 20);
        assert_eq!(loaded.n_cells, 4);
        assert_eq!(loaded.cells_offset, 900);
        assert_eq!(loaded.right_page, 7);
    }

    #[test]
    fn test_write_node_rejects_unloadable_header() {
        let (btree, _dir) = create_btree(1024);

        let mut node = btree.new_node(NodeType::InternalTable).unwrap();
        let page_id = node.page_id();
        node.free_offset = 500;
        node.n_cells = 3;
        node.cells_offset = 100;
        node.right_page = 7;

        assert!(matches!(
            btree.write_node(&mut node),
            Err(Error::CorruptNode { page: 2, .. })
        ));

        // Disk still holds the empty node written by new_node
        let loaded = btree.get_node_by_page(page_id).unwrap();
        assert_eq!(
            loaded.header(),
            NodeHeader::empty(NodeType::InternalTable, 1024)
        );
    }

    #[test]
    fn test_unwritten_mutations_are_lost() {
        let (btree, _dir) = create_btree(1024);

        let mut node = btree.new_node(NodeType::LeafTable).unwrap();
        node.insert_cell(0, &BTreeCell::table_leaf(1, b"gone".to_vec()))
            .unwrap();

        let loaded = btree.get_node_by_page(node.page_id()).unwrap();
        assert_eq!(loaded.n_cells, 0);
    }

    #[test]
    fn test_init_empty_node_discards_cells() {
        let (btree, _dir) = create_btree(1024);

        let mut node = btree.new_node(NodeType::LeafTable).unwrap();
        node.insert_cell(0, &BTreeCell::table_leaf(1, b"data".to_vec()))
            .unwrap();
        btree.write_node(&mut node).unwrap();

        let node = btree
            .init_empty_node(node.page_id(), NodeType::InternalIndex)
            .unwrap();
        assert_eq!(node.n_cells, 0);

        let loaded = btree.get_node_by_page(node.page_id()).unwrap();
        assert_eq!(loaded.node_type, NodeType::InternalIndex);
        assert_eq!(loaded.cells_offset, 1024);
        assert!(loaded.page().content()[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_init_empty_node_requires_allocated_page() {
        let (btree, _dir) = create_btree(1024);
        assert!(matches!(
            btree.init_empty_node(PageId::new(5), NodeType::LeafTable),
            Err(Error::InvalidPageNumber(5))
        ));
    }

    #[test]
    fn test_write_header_updates_counters() {
        let (btree, _dir) = create_btree(1024);

        let mut header = btree.read_header().unwrap();
        header.file_change_counter += 1;
        header.user_cookie = 0xC0FFEE;
        btree.write_header(&header).unwrap();

        assert_eq!(btree.read_header().unwrap(), header);
        // Root node is untouched
        let root = btree.get_node_by_page(PageId::ROOT).unwrap();
        assert_eq!(root.node_type, NodeType::LeafTable);
    }

    #[test]
    fn test_write_header_rejects_page_size_change() {
        let (btree, _dir) = create_btree(1024);

        let header = FileHeader::new(2048);
        assert!(matches!(
            btree.write_header(&header),
            Err(Error::CorruptHeader(_))
        ));
        assert_eq!(btree.read_header().unwrap().page_size(), 1024);
    }

    #[test]
    fn test_get_node_invalid_page() {
        let (btree, _dir) = create_btree(1024);
        assert!(matches!(
            btree.get_node_by_page(PageId::NONE),
            Err(Error::InvalidPageNumber(0))
        ));
        assert!(matches!(
            btree.get_node_by_page(PageId::new(2)),
            Err(Error::InvalidPageNumber(2))
        ));
    }
}
