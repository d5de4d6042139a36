use thiserror::Error;

mod buffer;
mod disk;
mod lru;
mod page;

pub use buffer::{BufferPoolManager, BufferPoolManagerRef};
pub use disk::DiskManager;
pub use lru::LruReplacer;
pub use page::{Page, PageRef};

/// id of a page within the db file, also stored in the page header
pub type PageId = u32;
/// index of a frame inside the buffer pool
pub type FrameId = usize;

pub const DEFAULT_PAGE_SIZE: usize = 4096;
/// every page starts with an 8 byte header, the page id lives in its second half
pub const PAGE_HEADER_SIZE: usize = 8;
const OFFSET_PAGE_ID: usize = 4;
/// the db file starts with a 16 byte header page: page_size and page_num
pub const DISK_HEADER_SIZE: usize = 16;
/// marks a frame that was never stamped with a page
pub const INVALID_PAGE_ID: PageId = PageId::MAX;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),
    #[error("IOError: read past end of file at offset {0}")]
    ReadPastEnd(u64),
}
