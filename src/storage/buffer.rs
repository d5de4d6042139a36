use super::{DiskManager, FrameId, LruReplacer, Page, PageId, PageRef, INVALID_PAGE_ID};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A fixed set of frames caching disk pages, with pin-aware LRU replacement.
/// Single-threaded: callers serialise access themselves. Operations that
/// cannot find a victimisable frame return None, callers must check.
///
/// PAGE_SIZE must match the page size recorded in the db file.
pub struct BufferPoolManager<const PAGE_SIZE: usize> {
    disk: DiskManager,
    replacer: LruReplacer,
    frames: Vec<PageRef<PAGE_SIZE>>,
    page_table: HashMap<PageId, FrameId>,
    next_page_id: PageId,
}

pub type BufferPoolManagerRef<const PAGE_SIZE: usize> = Rc<RefCell<BufferPoolManager<PAGE_SIZE>>>;

impl<const PAGE_SIZE: usize> Drop for BufferPoolManager<PAGE_SIZE> {
    fn drop(&mut self) {
        self.flush_all();
    }
}

impl<const PAGE_SIZE: usize> BufferPoolManager<PAGE_SIZE> {
    pub fn new(pool_size: usize, disk: DiskManager) -> Self {
        assert_eq!(disk.page_size(), PAGE_SIZE);
        let frames = (0..pool_size).map(|_| Page::new_shared()).collect_vec();
        let next_page_id = disk.page_num() as PageId;
        Self {
            disk,
            replacer: LruReplacer::new(pool_size),
            frames,
            page_table: HashMap::new(),
            next_page_id,
        }
    }
    pub fn new_random(pool_size: usize) -> Self {
        Self::new(pool_size, DiskManager::open_random(PAGE_SIZE))
    }
    pub fn new_with_name(pool_size: usize, filename: String) -> Self {
        Self::new(pool_size, DiskManager::open(filename, PAGE_SIZE))
    }
    pub fn new_random_shared(pool_size: usize) -> BufferPoolManagerRef<PAGE_SIZE> {
        Rc::new(RefCell::new(Self::new_random(pool_size)))
    }
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }
    pub fn filename(&self) -> String {
        self.disk.filename()
    }
    pub fn num_pages(&self) -> usize {
        self.disk.page_num()
    }

    /// Allocate a fresh page id and stamp it on a free frame. The frame
    /// starts dirty so its zeroed content is persisted even if the caller
    /// never writes. Returns None when every frame is pinned.
    pub fn new_page(&mut self) -> Option<PageRef<PAGE_SIZE>> {
        let page_id = self.allocate_page_id();
        let frame_id = self.get_free_frame()?;
        let frame = self.frames[frame_id].clone();
        {
            let mut page = frame.borrow_mut();
            page.set_page_id(page_id);
            page.set_dirty(true);
        }
        let prev = self.page_table.insert(page_id, frame_id);
        assert!(prev.is_none(), "page {} already resident", page_id);
        Some(frame)
    }

    /// Return the frame holding page_id, re-pinning it if resident and
    /// reading it from disk otherwise. Returns None when the page is not
    /// resident and every frame is pinned.
    pub fn fetch_page(&mut self, page_id: PageId) -> Option<PageRef<PAGE_SIZE>> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            self.replacer.pin(frame_id);
            return Some(self.frames[frame_id].clone());
        }
        let frame_id = self.get_free_frame()?;
        let frame = self.frames[frame_id].clone();
        {
            let mut page = frame.borrow_mut();
            self.disk.read_page(page_id, page.data_mut());
            page.set_dirty(false);
        }
        let prev = self.page_table.insert(page_id, frame_id);
        assert!(prev.is_none(), "page {} already resident", page_id);
        Some(frame)
    }

    /// Drop one pin on a resident page, marking its frame dirty first when
    /// the caller wrote to it. The dirty flag is never cleared here.
    pub fn unpin_page(&mut self, page_id: PageId, is_dirty: bool) -> bool {
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return false,
        };
        if is_dirty {
            self.frames[frame_id].borrow_mut().set_dirty(true);
        }
        self.replacer.unpin(frame_id);
        true
    }

    /// Write every dirty resident page back to disk. Residency and pin
    /// state are untouched.
    pub fn flush_all(&mut self) {
        for (&page_id, &frame_id) in self.page_table.iter() {
            let mut page = self.frames[frame_id].borrow_mut();
            if page.is_dirty() {
                self.disk.write_page(page_id, page.data());
                page.set_dirty(false);
            }
        }
    }

    fn allocate_page_id(&mut self) -> PageId {
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        page_id
    }

    /// Victimise a frame, writing its old content back if dirty, and hand
    /// it over zeroed. The replacer has already pinned it.
    fn get_free_frame(&mut self) -> Option<FrameId> {
        let frame_id = self.replacer.victim()?;
        let mut page = self.frames[frame_id].borrow_mut();
        if page.is_dirty() {
            self.disk.write_page(page.page_id(), page.data());
        }
        if page.page_id() != INVALID_PAGE_ID {
            self.page_table.remove(&page.page_id());
        }
        page.reset();
        Some(frame_id)
    }
}
