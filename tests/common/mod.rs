use std::sync::Arc;

use anyhow::Result;
use tempfile::NamedTempFile;

use bufpool::{BufferPoolManager, DiskFile, MemFile};

// Create a temporary database file for testing
#[allow(dead_code)]
pub fn create_temp_db_file() -> Result<(NamedTempFile, String)> {
    let file = NamedTempFile::new()?;
    let path = file.path().to_str().unwrap().to_string();
    Ok((file, path))
}

// Create a buffer pool over a temporary disk file
#[allow(dead_code)]
pub fn create_disk_pool(
    pool_size: usize,
) -> Result<(BufferPoolManager<DiskFile>, Arc<DiskFile>, NamedTempFile)> {
    let (temp, path) = create_temp_db_file()?;
    let file = Arc::new(DiskFile::open(path)?);
    Ok((BufferPoolManager::new(pool_size), file, temp))
}

// Create a buffer pool over an in-memory file
#[allow(dead_code)]
pub fn create_mem_pool(pool_size: usize) -> (BufferPoolManager<MemFile>, Arc<MemFile>) {
    (
        BufferPoolManager::new(pool_size),
        Arc::new(MemFile::new("test.db")),
    )
}

// Generate test data of specified size
#[allow(dead_code)]
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}
