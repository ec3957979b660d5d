use thiserror::Error;

use crate::common::types::{FrameId, PageId};
use crate::storage::file::FileError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    /// Every frame is pinned; no eviction candidate exists.
    #[error("buffer pool exceeded: all frames are pinned")]
    BufferExceeded,

    #[error("page {page_no} of {filename} is pinned in frame {frame_no}")]
    PagePinned {
        filename: String,
        page_no: PageId,
        frame_no: FrameId,
    },

    #[error("page {page_no} in frame {frame_no} is not pinned")]
    PageNotPinned { page_no: PageId, frame_no: FrameId },

    /// A frame matched a file during flush but holds no valid page.
    #[error("frame {frame_no} is in an inconsistent state")]
    BadBuffer { frame_no: FrameId },

    #[error("file error: {0}")]
    File(#[from] FileError),
}
