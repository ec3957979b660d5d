use std::collections::HashMap;

use parking_lot::Mutex;

use crate::common::types::{FileId, Page, PageId, INVALID_PAGE_ID};
use crate::storage::file::{next_file_id, DbFile, FileError};

/// In-memory page store.
///
/// Behaves like [`DiskFile`](super::DiskFile) minus durability, and keeps
/// per-page write counts so tests can assert on write-back traffic.
pub struct MemFile {
    file_id: FileId,
    filename: String,
    inner: Mutex<MemFileInner>,
}

struct MemFileInner {
    pages: HashMap<PageId, Page>,
    free_list: Vec<PageId>,
    next_page_no: PageId,
    writes: HashMap<PageId, u64>,
}

impl MemFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            file_id: next_file_id(),
            filename: filename.into(),
            inner: Mutex::new(MemFileInner {
                pages: HashMap::new(),
                free_list: Vec::new(),
                next_page_no: 1,
                writes: HashMap::new(),
            }),
        }
    }

    /// Number of `write_page` calls observed for `page_no`.
    pub fn write_count(&self, page_no: PageId) -> u64 {
        self.inner.lock().writes.get(&page_no).copied().unwrap_or(0)
    }

    /// Total `write_page` calls across all pages.
    pub fn total_writes(&self) -> u64 {
        self.inner.lock().writes.values().sum()
    }

    /// Whether `page_no` is currently allocated in the store.
    pub fn contains(&self, page_no: PageId) -> bool {
        self.inner.lock().pages.contains_key(&page_no)
    }
}

impl DbFile for MemFile {
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

        let inner = self.inner.lock();
        inner
            .pages
            .get(&page_no)
            .cloned()
            .ok_or(FileError::PageNotAllocated(page_no))
    }

    fn write_page(&self, page: &Page) -> Result<(), FileError> {
        if page.page_id == INVALID_PAGE_ID {
            return Err(FileError::InvalidPageId(page.page_id));
        }

        let mut inner = self.inner.lock();
        if !inner.pages.contains_key(&page.page_id) {
            return Err(FileError::PageNotAllocated(page.page_id));
        }

        *inner.writes.entry(page.page_id).or_insert(0) += 1;
        inner.pages.insert(page.page_id, page.clone());
        Ok(())
    }

    fn allocate_page(&self) -> Result<Page, FileError> {
        let mut inner = self.inner.lock();

        let page_no = match inner.free_list.pop() {
            Some(reused) => reused,
            None => {
                let fresh = inner.next_page_no;
                inner.next_page_no += 1;
                fresh
            }
        };

        let page = Page::new(page_no);
        inner.pages.insert(page_no, page.clone());
        Ok(page)
    }

    fn delete_page(&self, page_no: PageId) -> Result<(), FileError> {
        let mut inner = self.inner.lock();

        if inner.pages.remove(&page_no).is_none() {
            return Err(FileError::PageNotAllocated(page_no));
        }
        inner.free_list.push(page_no);
        Ok(())
    }
}
