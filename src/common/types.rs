use std::fmt;

/// Page size in bytes (8KB)
pub const PAGE_SIZE: usize = 8192;

/// Page number within a file
pub type PageId = u32;

/// Buffer pool frame ID type
pub type FrameId = u32;

/// Identity of an open file handle
pub type FileId = u64;

/// Page number 0 is never handed out by a file.
pub const INVALID_PAGE_ID: PageId = 0;

/// Fixed-size page container. The buffer layer treats the contents as
/// opaque bytes; only the page number is interpreted.
#[derive(Clone)]
pub struct Page {
    pub data: [u8; PAGE_SIZE],
    pub page_id: PageId,
}

impl Page {
    pub fn new(page_id: PageId) -> Self {
        Self {
            data: [0; PAGE_SIZE],
            page_id,
        }
    }

    /// The page's identity within its file.
    pub fn page_number(&self) -> PageId {
        self.page_id
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("page_id", &self.page_id)
            .finish_non_exhaustive()
    }
}
