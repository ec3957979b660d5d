use anyhow::Result;

use bufpool::{BufferPoolError, DbFile, DiskFile};

mod common;
use common::{create_disk_pool, create_mem_pool, generate_test_data};

#[test]
fn test_new_page() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(10)?;

    let (page_id, page) = pool.new_page(&file)?;

    // Page numbers start at 1; the buffer carries the same number
    assert!(page_id > 0);
    assert_eq!(page.page_number(), page_id);

    pool.unpin_page(&file, page_id, false)?;

    Ok(())
}

#[test]
fn test_fetch_page() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(10)?;

    let (page_id, _) = pool.new_page(&file)?;
    pool.unpin_page(&file, page_id, false)?;

    let fetched = pool.fetch_page(&file, page_id)?;
    assert_eq!(fetched.page_number(), page_id);

    pool.unpin_page(&file, page_id, false)?;

    Ok(())
}

#[test]
fn test_page_modification_survives_eviction() -> Result<()> {
    // A pool of one frame forces every fetch to evict the previous page
    let (mut pool, file, _temp) = create_disk_pool(1)?;

    let (first, page) = pool.new_page(&file)?;
    let test_data = generate_test_data(100);
    page.data[100..200].copy_from_slice(&test_data);
    pool.unpin_page(&file, first, true)?;

    // Evict the modified page by bringing in another one
    let (second, _) = pool.new_page(&file)?;
    pool.unpin_page(&file, second, false)?;

    // Fetch the first page back from disk
    let fetched = pool.fetch_page(&file, first)?;
    assert_eq!(&fetched.data[100..200], test_data.as_slice());
    pool.unpin_page(&file, first, false)?;

    Ok(())
}

#[test]
fn test_buffer_pool_eviction() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    // Create more pages than the pool holds to force eviction
    let mut page_ids = Vec::new();
    for _ in 0..5 {
        let (page_id, _) = pool.new_page(&file)?;
        pool.unpin_page(&file, page_id, true)?;
        page_ids.push(page_id);
    }
    assert_eq!(pool.valid_frame_count(), 3);

    // The first page was evicted; fetching it reads it back from disk
    let fetched = pool.fetch_page(&file, page_ids[0])?;
    assert_eq!(fetched.page_number(), page_ids[0]);
    pool.unpin_page(&file, page_ids[0], false)?;

    Ok(())
}

#[test]
fn test_buffer_exceeded() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    for _ in 0..3 {
        pool.new_page(&file)?;
    }

    let result = pool.new_page(&file);
    assert!(matches!(result, Err(BufferPoolError::BufferExceeded)));

    Ok(())
}

#[test]
fn test_flush_file_persists_dirty_pages() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(10)?;

    let mut page_ids = Vec::new();
    for i in 0..5u8 {
        let (page_id, page) = pool.new_page(&file)?;
        page.data[0] = i;
        pool.unpin_page(&file, page_id, true)?;
        page_ids.push(page_id);
    }

    pool.flush_file(&file)?;
    assert_eq!(pool.valid_frame_count(), 0);

    // Everything must come back from disk with its contents intact
    for (i, &page_id) in page_ids.iter().enumerate() {
        let fetched = pool.fetch_page(&file, page_id)?;
        assert_eq!(fetched.data[0], i as u8);
        pool.unpin_page(&file, page_id, false)?;
    }

    Ok(())
}

#[test]
fn test_flush_file_write_counts() -> Result<()> {
    let (mut pool, file) = create_mem_pool(10);

    // A page only read and unpinned clean is never written back
    let (clean, _) = pool.new_page(&file)?;
    pool.unpin_page(&file, clean, false)?;
    for _ in 0..3 {
        pool.fetch_page(&file, clean)?;
        pool.unpin_page(&file, clean, false)?;
    }

    // A modified page is written back exactly once
    let (dirty, page) = pool.new_page(&file)?;
    page.data[7] = 7;
    pool.unpin_page(&file, dirty, true)?;

    pool.flush_file(&file)?;

    assert_eq!(file.write_count(clean), 0);
    assert_eq!(file.write_count(dirty), 1);

    Ok(())
}

#[test]
fn test_flush_file_with_pinned_page() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    let (page_id, _) = pool.new_page(&file)?;

    let result = pool.flush_file(&file);
    assert!(matches!(
        result,
        Err(BufferPoolError::PagePinned { page_no, .. }) if page_no == page_id
    ));

    Ok(())
}

#[test]
fn test_dispose_page() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    let (page_id, _) = pool.new_page(&file)?;
    pool.unpin_page(&file, page_id, false)?;

    pool.dispose_page(&file, page_id)?;

    assert_eq!(pool.valid_frame_count(), 0);
    // The page is gone from the file until allocated again
    assert!(pool.fetch_page(&file, page_id).is_err());

    Ok(())
}

#[test]
fn test_dispose_pinned_page() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    let (page_id, _) = pool.new_page(&file)?;

    let result = pool.dispose_page(&file, page_id);
    assert!(matches!(result, Err(BufferPoolError::PagePinned { .. })));

    // Still resident and usable
    assert_eq!(pool.valid_frame_count(), 1);
    pool.unpin_page(&file, page_id, false)?;

    Ok(())
}

#[test]
fn test_unpin_non_resident_page_is_no_op() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    pool.unpin_page(&file, 99, true)?;
    assert_eq!(pool.valid_frame_count(), 0);

    Ok(())
}

#[test]
fn test_unpin_unpinned_page_fails() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    let (page_id, _) = pool.new_page(&file)?;
    pool.unpin_page(&file, page_id, false)?;

    let result = pool.unpin_page(&file, page_id, false);
    assert!(matches!(result, Err(BufferPoolError::PageNotPinned { .. })));

    Ok(())
}

#[test]
fn test_pin_counts_stack() -> Result<()> {
    let (mut pool, file, _temp) = create_disk_pool(3)?;

    let (page_id, _) = pool.new_page(&file)?;
    pool.fetch_page(&file, page_id)?;

    // Two pins outstanding: one unpin is not enough to dispose
    pool.unpin_page(&file, page_id, false)?;
    assert!(matches!(
        pool.dispose_page(&file, page_id),
        Err(BufferPoolError::PagePinned { .. })
    ));

    pool.unpin_page(&file, page_id, false)?;
    pool.dispose_page(&file, page_id)?;

    Ok(())
}

#[test]
fn test_shutdown_writes_back_dirty_pages() -> Result<()> {
    let (temp, path) = common::create_temp_db_file()?;

    let page_id = {
        let file = std::sync::Arc::new(DiskFile::open(&path)?);
        let mut pool: bufpool::BufferPoolManager<DiskFile> = bufpool::BufferPoolManager::new(5);
        let (page_id, page) = pool.new_page(&file)?;
        page.data[0] = 0xEE;
        pool.unpin_page(&file, page_id, true)?;
        page_id
        // Pool dropped here; the dirty page must reach the file
    };

    let reopened = DiskFile::open(&path)?;
    let page = reopened.read_page(page_id)?;
    assert_eq!(page.data[0], 0xEE);

    drop(temp);
    Ok(())
}

#[test]
fn test_two_files_share_the_pool() -> Result<()> {
    let (mut pool, file_a, _temp_a) = create_disk_pool(4)?;
    let (_temp_b, path_b) = common::create_temp_db_file()?;
    let file_b = std::sync::Arc::new(DiskFile::open(&path_b)?);

    let (a, page) = pool.new_page(&file_a)?;
    page.data[0] = 0xAA;
    pool.unpin_page(&file_a, a, true)?;

    let (b, page) = pool.new_page(&file_b)?;
    page.data[0] = 0xBB;
    pool.unpin_page(&file_b, b, true)?;

    // Flushing one file leaves the other file's pages resident
    pool.flush_file(&file_a)?;
    assert_eq!(pool.valid_frame_count(), 1);

    let fetched = pool.fetch_page(&file_b, b)?;
    assert_eq!(fetched.data[0], 0xBB);
    pool.unpin_page(&file_b, b, false)?;

    assert_eq!(file_a.read_page(a)?.data[0], 0xAA);

    Ok(())
}
