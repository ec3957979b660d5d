pub mod common;
pub mod storage;

pub use storage::buffer::BufferPoolError;
pub use storage::buffer::BufferPoolManager;
pub use storage::file::{DbFile, DiskFile, FileError, MemFile};
