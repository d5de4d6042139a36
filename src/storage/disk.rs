use super::{PageId, StorageError, DISK_HEADER_SIZE, PAGE_HEADER_SIZE};
use log::{error, info};
use rand::Rng;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::process;

/// A page-oriented file: a 16 byte header page recording page_size and
/// page_num, followed by page_num pages of page_size bytes each. The header
/// words are in the host's native byte order, the file is not meant to move
/// between architectures.
///
/// I/O never fails upward: any error is logged and aborts the process, so
/// callers may assume reads and writes that return have succeeded.
pub struct DiskManager {
    file: File,
    filename: String,
    page_size: u64,
    page_num: u64,
}

impl DiskManager {
    /// Open the db file, creating it with a fresh header if it does not
    /// exist yet. For an existing file the header's page size wins over the
    /// argument.
    pub fn open(filename: String, page_size: usize) -> Self {
        assert!(page_size > PAGE_HEADER_SIZE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&filename)
            .unwrap_or_else(|err| Self::die(err.into()));
        let mut disk = DiskManager {
            file,
            filename,
            page_size: page_size as u64,
            page_num: 0,
        };
        let len = disk
            .file
            .metadata()
            .map(|meta| meta.len())
            .unwrap_or_else(|err| Self::die(err.into()));
        if len < DISK_HEADER_SIZE as u64 {
            info!("create db file {}", disk.filename);
            disk.write_header();
        } else {
            disk.read_header();
        }
        disk
    }

    /// Open a fresh file under a random name, for tests and scratch use.
    pub fn open_random(page_size: usize) -> Self {
        let filename = format!("naive-{:08x}.db", rand::thread_rng().gen::<u32>());
        Self::open(filename, page_size)
    }

    pub fn filename(&self) -> String {
        self.filename.clone()
    }
    pub fn page_size(&self) -> usize {
        self.page_size as usize
    }
    pub fn page_num(&self) -> usize {
        self.page_num as usize
    }

    pub fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) {
        assert_eq!(buf.len() as u64, self.page_size);
        let offset = DISK_HEADER_SIZE as u64 + page_id as u64 * self.page_size;
        let file_size = DISK_HEADER_SIZE as u64 + self.page_num * self.page_size;
        if offset + self.page_size > file_size {
            Self::die(StorageError::ReadPastEnd(offset));
        }
        self.read_at(offset, buf);
    }

    pub fn write_page(&mut self, page_id: PageId, buf: &[u8]) {
        assert_eq!(buf.len() as u64, self.page_size);
        let offset = DISK_HEADER_SIZE as u64 + page_id as u64 * self.page_size;
        self.write_at(offset, buf);
        // page_num is only raised in memory, the header page is rewritten on
        // shutdown
        self.page_num = self.page_num.max(page_id as u64 + 1);
    }

    /// Rewrite the header page and flush. Also performed on drop.
    pub fn shutdown(&mut self) {
        self.write_header();
    }

    fn write_header(&mut self) {
        let mut header = [0u8; DISK_HEADER_SIZE];
        header[0..8].copy_from_slice(&self.page_size.to_ne_bytes());
        header[8..16].copy_from_slice(&self.page_num.to_ne_bytes());
        self.write_at(0, &header);
    }

    fn read_header(&mut self) {
        let mut header = [0u8; DISK_HEADER_SIZE];
        self.read_at(0, &mut header);
        self.page_size = u64::from_ne_bytes(header[0..8].try_into().unwrap());
        self.page_num = u64::from_ne_bytes(header[8..16].try_into().unwrap());
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) {
        self.seek_read(offset, buf)
            .unwrap_or_else(|err| Self::die(err.into()));
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) {
        self.seek_write(offset, buf)
            .unwrap_or_else(|err| Self::die(err.into()));
    }

    fn seek_read(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)
    }

    fn seek_write(&mut self, offset: u64, buf: &[u8]) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        // keep the disk file in sync
        self.file.flush()
    }

    fn die(err: StorageError) -> ! {
        error!("{}", err);
        process::exit(1);
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
