use std::fmt;
use std::sync::Arc;

use crate::common::types::{FrameId, PageId, INVALID_PAGE_ID};
use crate::storage::file::DbFile;

/// Replacement and pin state for one frame of the pool.
///
/// The manager is the only mutator. `set` and `clear` are the lifecycle
/// transitions between empty and resident; the remaining fields are adjusted
/// individually by the clock sweep and the pin bookkeeping.
pub struct FrameDesc<F: DbFile> {
    /// Fixed index into the pool, assigned at construction.
    pub(crate) frame_no: FrameId,
    /// File owning the resident page. `None` iff the frame is empty.
    pub(crate) file: Option<Arc<F>>,
    pub(crate) page_no: PageId,
    pub(crate) pin_count: u32,
    pub(crate) dirty: bool,
    pub(crate) valid: bool,
    pub(crate) ref_bit: bool,
}

impl<F: DbFile> FrameDesc<F> {
    pub(crate) fn new(frame_no: FrameId) -> Self {
        Self {
            frame_no,
            file: None,
            page_no: INVALID_PAGE_ID,
            pin_count: 0,
            dirty: false,
            valid: false,
            ref_bit: false,
        }
    }

    /// Transition an empty frame to freshly resident: pinned once, clean,
    /// with the reference bit granting its first clock pass.
    pub(crate) fn set(&mut self, file: Arc<F>, page_no: PageId) {
        self.file = Some(file);
        self.page_no = page_no;
        self.pin_count = 1;
        self.dirty = false;
        self.valid = true;
        self.ref_bit = true;
    }

    /// Reset to empty, forgetting the resident page.
    pub(crate) fn clear(&mut self) {
        self.file = None;
        self.page_no = INVALID_PAGE_ID;
        self.pin_count = 0;
        self.dirty = false;
        self.valid = false;
        self.ref_bit = false;
    }
}

impl<F: DbFile> fmt::Display for FrameDesc<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filename = self.file.as_deref().map(|file| file.filename()).unwrap_or("-");
        write!(
            f,
            "file:{} page_no:{} pin_count:{} dirty:{} valid:{} ref_bit:{}",
            filename, self.page_no, self.pin_count, self.dirty, self.valid, self.ref_bit
        )
    }
}
