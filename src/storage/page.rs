use super::{PageId, INVALID_PAGE_ID, OFFSET_PAGE_ID, PAGE_HEADER_SIZE};
use std::cell::RefCell;
use std::rc::Rc;

pub type PageRef<const PAGE_SIZE: usize> = Rc<RefCell<Page<PAGE_SIZE>>>;

/// A fixed-size in-memory frame holding one disk page. The first 8 bytes of
/// the buffer are the page header, bytes [4, 8) carry the page id; the dirty
/// flag is not part of the buffer and never hits disk.
pub struct Page<const PAGE_SIZE: usize> {
    buffer: [u8; PAGE_SIZE],
    is_dirty: bool,
}

impl<const PAGE_SIZE: usize> Page<PAGE_SIZE> {
    pub fn new() -> Self {
        assert!(PAGE_SIZE > PAGE_HEADER_SIZE);
        let mut page = Self {
            buffer: [0u8; PAGE_SIZE],
            is_dirty: false,
        };
        page.set_page_id(INVALID_PAGE_ID);
        page
    }
    pub fn new_shared() -> PageRef<PAGE_SIZE> {
        Rc::new(RefCell::new(Self::new()))
    }
    pub fn page_id(&self) -> PageId {
        PageId::from_le_bytes(
            self.buffer[OFFSET_PAGE_ID..PAGE_HEADER_SIZE]
                .try_into()
                .unwrap(),
        )
    }
    pub fn set_page_id(&mut self, page_id: PageId) {
        self.buffer[OFFSET_PAGE_ID..PAGE_HEADER_SIZE].copy_from_slice(&page_id.to_le_bytes());
    }
    /// user bytes, header skipped
    pub fn content(&self) -> &[u8] {
        &self.buffer[PAGE_HEADER_SIZE..]
    }
    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[PAGE_HEADER_SIZE..]
    }
    /// the whole buffer, header included, as written to disk
    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.buffer
    }
    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.buffer
    }
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }
    pub fn set_dirty(&mut self, is_dirty: bool) {
        self.is_dirty = is_dirty;
    }
    /// zero the whole buffer and clear the dirty flag
    pub fn reset(&mut self) {
        self.buffer.fill(0);
        self.is_dirty = false;
    }
}

impl<const PAGE_SIZE: usize> Default for Page<PAGE_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}
