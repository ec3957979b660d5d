mod disk_file;
mod mem_file;

pub use disk_file::DiskFile;
pub use mem_file::MemFile;

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::common::types::{FileId, Page, PageId};

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid page ID: {0}")]
    InvalidPageId(PageId),

    #[error("page {0} is not allocated")]
    PageNotAllocated(PageId),
}

/// Page-addressable durable store.
///
/// The buffer pool holds shared handles to open files but never owns or
/// closes them; the embedding system flushes the pool before dropping its
/// files.
pub trait DbFile {
    /// Identity of this handle. Two handles opened on the same path compare
    /// unequal.
    fn file_id(&self) -> FileId;

    /// Stable name of the underlying store.
    fn filename(&self) -> &str;

    /// Read a copy of the page stored under `page_no`.
    fn read_page(&self, page_no: PageId) -> Result<Page, FileError>;

    /// Durably write the page's bytes under its own page number.
    fn write_page(&self, page: &Page) -> Result<(), FileError>;

    /// Reserve a fresh page number and return a zeroed page carrying it.
    fn allocate_page(&self) -> Result<Page, FileError>;

    /// Release a page number for reuse. Reading it afterwards fails until it
    /// is allocated again.
    fn delete_page(&self, page_no: PageId) -> Result<(), FileError>;
}

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique handle identity, assigned once per opened file.
pub(crate) fn next_file_id() -> FileId {
    NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed)
}
