use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;
use parking_lot::Mutex;

use crate::common::types::{FileId, Page, PageId, INVALID_PAGE_ID, PAGE_SIZE};
use crate::storage::file::{next_file_id, DbFile, FileError};

/// One OS file holding fixed-size pages.
///
/// Page `n` lives at byte offset `(n - 1) * PAGE_SIZE`; page number 0 is the
/// invalid sentinel and never stored.
pub struct DiskFile {
    file_id: FileId,
    filename: String,
    inner: Mutex<DiskFileInner>,
}

struct DiskFileInner {
    file: File,
    /// Page numbers released by `delete_page`, reused before the file grows.
    /// In-memory only; a reopened file starts with an empty list.
    free_list: Vec<PageId>,
}

impl DiskFile {
    /// Open the file at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let filename = path.as_ref().to_string_lossy().into_owned();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            file_id: next_file_id(),
            filename,
            inner: Mutex::new(DiskFileInner {
                file,
                free_list: Vec::new(),
            }),
        })
    }

    fn page_offset(page_no: PageId) -> u64 {
        (page_no as u64 - 1) * PAGE_SIZE as u64
    }
}

impl DbFile for DiskFile {
    fn file_id(&self) -> FileId {
        self.file_id
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn read_page(&self, page_no: PageId) -> Result<Page, FileError> {
        if page_no == INVALID_PAGE_ID {
            return Err(FileError::InvalidPageId(page_no));
        }

        let offset = Self::page_offset(page_no);
        let mut inner = self.inner.lock();

        let file_size = inner.file.metadata()?.len();
        if offset >= file_size {
            return Err(FileError::PageNotAllocated(page_no));
        }

        let mut page = Page::new(page_no);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.read_exact(&mut page.data)?;

        Ok(page)
    }

    fn write_page(&self, page: &Page) -> Result<(), FileError> {
        if page.page_id == INVALID_PAGE_ID {
            return Err(FileError::InvalidPageId(page.page_id));
        }

        let offset = Self::page_offset(page.page_id);
        let mut inner = self.inner.lock();

        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&page.data)?;
        inner.file.flush()?;

        Ok(())
    }

    fn allocate_page(&self) -> Result<Page, FileError> {
        let mut inner = self.inner.lock();

        // Reuse a deleted page number before growing the file.
        let page_no = match inner.free_list.pop() {
            Some(reused) => reused,
            None => {
                let file_size = inner.file.metadata()?.len();
                (file_size / PAGE_SIZE as u64) as PageId + 1
            }
        };

        // Zero the page's region so a read before the first write-back
        // observes default contents.
        let zeros = [0u8; PAGE_SIZE];
        inner.file.seek(SeekFrom::Start(Self::page_offset(page_no)))?;
        inner.file.write_all(&zeros)?;
        inner.file.flush()?;

        debug!("allocated page {} in {}", page_no, self.filename);
        Ok(Page::new(page_no))
    }

    fn delete_page(&self, page_no: PageId) -> Result<(), FileError> {
        if page_no == INVALID_PAGE_ID {
            return Err(FileError::InvalidPageId(page_no));
        }

        let mut inner = self.inner.lock();

        let file_size = inner.file.metadata()?.len();
        if Self::page_offset(page_no) >= file_size {
            return Err(FileError::PageNotAllocated(page_no));
        }

        if !inner.free_list.contains(&page_no) {
            inner.free_list.push(page_no);
        }

        debug!("deleted page {} in {}", page_no, self.filename);
        Ok(())
    }
}
