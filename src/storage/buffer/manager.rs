use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, trace};

use crate::common::types::{FileId, FrameId, Page, PageId, INVALID_PAGE_ID};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::frame::FrameDesc;
use crate::storage::file::DbFile;

/// Fixed-size buffer pool mediating between clients and page files.
///
/// Pages are addressed by (file, page number). A bounded set of them is kept
/// resident in a pre-allocated frame array. Clients pin a page while using
/// it and unpin it when done; the clock sweep reclaims unpinned frames when
/// a new one is needed.
///
/// The pool is single-threaded: every public operation takes `&mut self` and
/// runs to completion. An embedding that needs multi-client access wraps the
/// whole manager in a mutex covering each call in full.
pub struct BufferPoolManager<F: DbFile> {
    /// Page frames, parallel to `descriptors`.
    pool: Vec<Page>,
    /// Per-frame replacement and pin state.
    descriptors: Vec<FrameDesc<F>>,
    /// Residency index: which frame holds (file, page_no).
    page_table: HashMap<(FileId, PageId), FrameId>,
    /// Clock sweep cursor, always in `[0, pool_size)`.
    clock_hand: usize,
}

impl<F: DbFile> BufferPoolManager<F> {
    /// Create a pool of `pool_size` empty frames.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "buffer pool needs at least one frame");

        let pool = (0..pool_size)
            .map(|_| Page::new(INVALID_PAGE_ID))
            .collect();
        let descriptors = (0..pool_size)
            .map(|i| FrameDesc::new(i as FrameId))
            .collect();

        Self {
            pool,
            descriptors,
            page_table: HashMap::with_capacity(pool_size),
            // The first advance lands the clock on frame 0.
            clock_hand: pool_size - 1,
        }
    }

    /// Number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Number of frames currently holding a resident page.
    pub fn valid_frame_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.valid).count()
    }

    fn advance_clock(&mut self) {
        self.clock_hand = (self.clock_hand + 1) % self.pool.len();
    }

    /// Choose a frame to reuse, evicting its resident page if it has one.
    ///
    /// The caller overwrites the frame's contents and calls `set` on its
    /// descriptor. The sweep gives every referenced frame a second chance,
    /// so it selects within two passes once the precheck has established
    /// that an unpinned frame exists.
    fn alloc_buf(&mut self) -> Result<FrameId, BufferPoolError> {
        // With every frame pinned the sweep below would never terminate.
        if self.descriptors.iter().all(|d| d.pin_count > 0) {
            return Err(BufferPoolError::BufferExceeded);
        }

        loop {
            self.advance_clock();
            let hand = self.clock_hand;

            if !self.descriptors[hand].valid {
                self.descriptors[hand].clear();
                return Ok(hand as FrameId);
            }
            if self.descriptors[hand].ref_bit {
                // Recently used: spare it this pass.
                self.descriptors[hand].ref_bit = false;
                continue;
            }
            if self.descriptors[hand].pin_count > 0 {
                continue;
            }

            // Unpinned with its reference bit spent: evict. The frame is
            // cleared only once the index entry is gone and any write-back
            // has succeeded.
            let page_no = self.descriptors[hand].page_no;
            let dirty = self.descriptors[hand].dirty;
            if let Some(file) = self.descriptors[hand].file.clone() {
                self.page_table.remove(&(file.file_id(), page_no));
                if dirty {
                    debug!(
                        "evicting dirty page {} of {} from frame {}",
                        page_no,
                        file.filename(),
                        hand
                    );
                    file.write_page(&self.pool[hand])?;
                }
            }
            self.descriptors[hand].clear();
            return Ok(hand as FrameId);
        }
    }

    /// Return the resident page for (`file`, `page_no`), reading it from the
    /// file on a miss.
    ///
    /// The page comes back pinned; every successful fetch must be matched by
    /// an `unpin_page` once the caller is done with the buffer.
    pub fn fetch_page(
        &mut self,
        file: &Arc<F>,
        page_no: PageId,
    ) -> Result<&mut Page, BufferPoolError> {
        let key = (file.file_id(), page_no);

        if let Some(&frame_no) = self.page_table.get(&key) {
            let frame = frame_no as usize;
            let desc = &mut self.descriptors[frame];
            desc.ref_bit = true;
            desc.pin_count += 1;
            trace!(
                "fetch hit: page {} of {} in frame {}",
                page_no,
                file.filename(),
                frame
            );
            return Ok(&mut self.pool[frame]);
        }

        let frame_no = self.alloc_buf()?;
        let frame = frame_no as usize;
        self.pool[frame] = file.read_page(page_no)?;
        self.page_table.insert(key, frame_no);
        self.descriptors[frame].set(Arc::clone(file), page_no);
        trace!(
            "fetch miss: page {} of {} into frame {}",
            page_no,
            file.filename(),
            frame
        );
        Ok(&mut self.pool[frame])
    }

    /// Allocate a fresh page on `file` and make it resident and pinned.
    ///
    /// Returns the new page number along with the buffer.
    pub fn new_page(&mut self, file: &Arc<F>) -> Result<(PageId, &mut Page), BufferPoolError> {
        let page = file.allocate_page()?;
        let page_no = page.page_number();

        let frame_no = self.alloc_buf()?;
        let frame = frame_no as usize;
        self.pool[frame] = page;
        self.page_table.insert((file.file_id(), page_no), frame_no);
        self.descriptors[frame].set(Arc::clone(file), page_no);
        debug!(
            "new page {} of {} in frame {}",
            page_no,
            file.filename(),
            frame
        );
        Ok((page_no, &mut self.pool[frame]))
    }

    /// Drop one pin on (`file`, `page_no`).
    ///
    /// `dirty` ORs into the frame's dirty bit; it never clears it. Unpinning
    /// a page that is not resident is tolerated as a no-op.
    pub fn unpin_page(
        &mut self,
        file: &Arc<F>,
        page_no: PageId,
        dirty: bool,
    ) -> Result<(), BufferPoolError> {
        let frame_no = match self.page_table.get(&(file.file_id(), page_no)) {
            Some(&frame_no) => frame_no,
            None => return Ok(()),
        };

        let desc = &mut self.descriptors[frame_no as usize];
        if desc.pin_count == 0 {
            return Err(BufferPoolError::PageNotPinned { page_no, frame_no });
        }
        desc.pin_count -= 1;
        if dirty {
            desc.dirty = true;
        }
        trace!(
            "unpin page {} of {} in frame {}, {} pins left",
            page_no,
            file.filename(),
            frame_no,
            desc.pin_count
        );
        Ok(())
    }

    /// Write back and evict every resident page belonging to `file`.
    ///
    /// Fails with `PagePinned` on the first pinned frame it meets; frames
    /// handled before the failure stay flushed and evicted.
    pub fn flush_file(&mut self, file: &Arc<F>) -> Result<(), BufferPoolError> {
        for frame in 0..self.pool.len() {
            // Both handle identity and filename have to match; an aliased
            // handle on the same path does not count.
            let matches = match &self.descriptors[frame].file {
                Some(resident) => {
                    resident.file_id() == file.file_id()
                        && resident.filename() == file.filename()
                }
                None => false,
            };
            if !matches {
                continue;
            }

            let desc = &self.descriptors[frame];
            if desc.pin_count > 0 {
                return Err(BufferPoolError::PagePinned {
                    filename: file.filename().to_string(),
                    page_no: desc.page_no,
                    frame_no: desc.frame_no,
                });
            }
            if !desc.valid {
                return Err(BufferPoolError::BadBuffer {
                    frame_no: desc.frame_no,
                });
            }

            let page_no = desc.page_no;
            if desc.dirty {
                debug!(
                    "flushing page {} of {} from frame {}",
                    page_no,
                    file.filename(),
                    frame
                );
                file.write_page(&self.pool[frame])?;
            }
            self.page_table.remove(&(file.file_id(), page_no));
            self.descriptors[frame].clear();
        }
        Ok(())
    }

    /// Remove (`file`, `page_no`) from the pool if resident, then delete it
    /// from the file.
    ///
    /// Fails with `PagePinned` while any client still holds a pin; a page
    /// with no resident copy is still deleted from the file.
    pub fn dispose_page(&mut self, file: &Arc<F>, page_no: PageId) -> Result<(), BufferPoolError> {
        let key = (file.file_id(), page_no);

        if let Some(&frame_no) = self.page_table.get(&key) {
            let frame = frame_no as usize;
            if self.descriptors[frame].pin_count > 0 {
                return Err(BufferPoolError::PagePinned {
                    filename: file.filename().to_string(),
                    page_no,
                    frame_no,
                });
            }
            self.page_table.remove(&key);
            self.descriptors[frame].clear();
        }

        file.delete_page(page_no)?;
        Ok(())
    }

    /// Checkpoint: write every dirty frame back to its file, leaving
    /// residency and pin counts untouched. Pinned frames are written too.
    pub fn flush_all_files(&mut self) -> Result<(), BufferPoolError> {
        for frame in 0..self.pool.len() {
            if !(self.descriptors[frame].valid && self.descriptors[frame].dirty) {
                continue;
            }
            if let Some(file) = self.descriptors[frame].file.clone() {
                debug!(
                    "checkpointing page {} of {} from frame {}",
                    self.descriptors[frame].page_no,
                    file.filename(),
                    frame
                );
                file.write_page(&self.pool[frame])?;
                self.descriptors[frame].dirty = false;
            }
        }
        Ok(())
    }

    /// Dump every frame descriptor and the resident-page count to stdout.
    pub fn print_self(&self) {
        for desc in &self.descriptors {
            println!("frame {}: {}", desc.frame_no, desc);
        }
        println!("valid frames: {}", self.valid_frame_count());
    }
}

impl<F: DbFile> Drop for BufferPoolManager<F> {
    /// Write back every dirty frame, pinned or not. Failures are logged;
    /// drop cannot propagate them.
    fn drop(&mut self) {
        for frame in 0..self.pool.len() {
            let desc = &self.descriptors[frame];
            if !(desc.valid && desc.dirty) {
                continue;
            }
            if let Some(file) = desc.file.clone() {
                if let Err(err) = file.write_page(&self.pool[frame]) {
                    error!(
                        "write-back of page {} of {} failed during shutdown: {}",
                        desc.page_no,
                        file.filename(),
                        err
                    );
                }
            }
        }
    }
}
