//! End-to-end scenarios against an in-memory backing store, covering each
//! replacement policy's eviction order, dirty write-back on eviction, and
//! pinned-frame protection.

use bufferpool_core::{BufferPool, MemoryBlockStorage, PageId, PoolConfig, ReplacementPolicyKind};

fn pool(capacity: usize, policy: ReplacementPolicyKind) -> BufferPool<MemoryBlockStorage> {
    BufferPool::init(MemoryBlockStorage::new(), PoolConfig::new(capacity, policy)).unwrap()
}

#[test]
fn fifo_eviction_order() {
    let mut pool = pool(3, ReplacementPolicyKind::Fifo);

    let h1 = pool.pin(PageId::new(1)).unwrap();
    let h2 = pool.pin(PageId::new(2)).unwrap();
    let h3 = pool.pin(PageId::new(3)).unwrap();
    pool.unpin(&h1).unwrap();
    pool.unpin(&h2).unwrap();
    pool.unpin(&h3).unwrap();

    pool.pin(PageId::new(4)).unwrap();

    assert_eq!(
        pool.frame_contents(),
        vec![PageId::new(4), PageId::new(2), PageId::new(3)]
    );
    assert_eq!(pool.num_read_io(), 4);
    assert_eq!(pool.num_write_io(), 0);
}

#[test]
fn lru_preserves_recently_used_page() {
    let mut pool = pool(3, ReplacementPolicyKind::Lru);

    let h1 = pool.pin(PageId::new(1)).unwrap();
    let h2 = pool.pin(PageId::new(2)).unwrap();
    let h3 = pool.pin(PageId::new(3)).unwrap();
    pool.unpin(&h1).unwrap();
    pool.unpin(&h2).unwrap();
    pool.unpin(&h3).unwrap();

    let read_io_before_hit = pool.num_read_io();
    let h1b = pool.pin(PageId::new(1)).unwrap(); // hit: refreshes page 1's recency
    assert_eq!(pool.num_read_io(), read_io_before_hit); // no I/O on a hit
    pool.unpin(&h1b).unwrap();

    pool.pin(PageId::new(4)).unwrap();

    // Page 2 (least recently used) is evicted; pages 1, 3, and the newly
    // admitted 4 remain resident, in their original slots.
    assert_eq!(
        pool.frame_contents(),
        vec![PageId::new(1), PageId::new(4), PageId::new(3)]
    );
    assert_eq!(pool.num_read_io(), 4);
    assert_eq!(pool.num_write_io(), 0);
}

#[test]
fn clock_admission_sets_reference_bit_so_a_lone_hit_cannot_save_the_next_eviction() {
    let mut pool = pool(3, ReplacementPolicyKind::Clock);

    let h1 = pool.pin(PageId::new(1)).unwrap();
    let h2 = pool.pin(PageId::new(2)).unwrap();
    let h3 = pool.pin(PageId::new(3)).unwrap();
    pool.unpin(&h1).unwrap();
    pool.unpin(&h2).unwrap();
    pool.unpin(&h3).unwrap();

    let h1b = pool.pin(PageId::new(1)).unwrap(); // hit: reference bit was already set by admission
    pool.unpin(&h1b).unwrap();

    pool.pin(PageId::new(4)).unwrap();

    // Admission set every page's reference bit (SPEC_FULL.md §4.2/§4.4), so
    // the hand must clear all three bits in one full sweep before it finds
    // a victim, landing back on page 1's slot: the hit on page 1 changed
    // nothing observable, since its bit was already set.
    assert_eq!(
        pool.frame_contents(),
        vec![PageId::new(4), PageId::new(2), PageId::new(3)]
    );
    assert_eq!(pool.num_read_io(), 4);
    assert_eq!(pool.num_write_io(), 0);
}

#[test]
fn clock_second_chance_spares_a_hit_page_once_bits_have_already_been_swept() {
    let mut pool = pool(3, ReplacementPolicyKind::Clock);

    let h1 = pool.pin(PageId::new(1)).unwrap();
    let h2 = pool.pin(PageId::new(2)).unwrap();
    let h3 = pool.pin(PageId::new(3)).unwrap();
    pool.unpin(&h1).unwrap();
    pool.unpin(&h2).unwrap();
    pool.unpin(&h3).unwrap();

    // A first eviction sweeps the hand once around, clearing every
    // admission-set bit and landing on page 1's slot (see the test above).
    let h4 = pool.pin(PageId::new(4)).unwrap();
    pool.unpin(&h4).unwrap();

    // Page 2 is hit before the next eviction; its bit, cleared by the first
    // sweep, is set again. Page 3's bit stays cleared.
    let h2b = pool.pin(PageId::new(2)).unwrap();
    pool.unpin(&h2b).unwrap();

    pool.pin(PageId::new(5)).unwrap();

    // The hand resumes where it left off: page 2's slot is referenced again
    // and gets a second chance, while page 3's slot — never hit since the
    // first sweep — is evicted instead.
    assert_eq!(
        pool.frame_contents(),
        vec![PageId::new(4), PageId::new(2), PageId::new(5)]
    );
    assert_eq!(pool.num_read_io(), 5);
    assert_eq!(pool.num_write_io(), 0);
}

#[test]
fn dirty_page_is_written_back_on_eviction() {
    let mut pool = pool(1, ReplacementPolicyKind::Fifo);

    let h0 = pool.pin(PageId::new(0)).unwrap();
    pool.mark_dirty(&h0).unwrap();
    pool.unpin(&h0).unwrap();

    pool.pin(PageId::new(1)).unwrap();

    assert_eq!(pool.num_write_io(), 1);
    assert_eq!(pool.num_read_io(), 2);
}

#[test]
fn pinned_frame_is_not_evicted() {
    let mut pool = pool(2, ReplacementPolicyKind::Fifo);

    let _h0 = pool.pin(PageId::new(0)).unwrap();
    let _h1 = pool.pin(PageId::new(1)).unwrap();

    let before = pool.frame_contents();
    let err = pool.pin(PageId::new(2)).unwrap_err();

    assert!(matches!(
        err,
        bufferpool_core::BufferPoolError::PoolExhausted { capacity: 2 }
    ));
    assert_eq!(pool.frame_contents(), before);
    assert_eq!(pool.num_read_io(), 2);
    assert_eq!(pool.num_write_io(), 0);
}

#[test]
fn force_flush_writes_only_dirty_unpinned_frames() {
    let mut pool = pool(3, ReplacementPolicyKind::Lru);

    let h0 = pool.pin(PageId::new(0)).unwrap();
    let h1 = pool.pin(PageId::new(1)).unwrap();
    let h2 = pool.pin(PageId::new(2)).unwrap();

    pool.mark_dirty(&h0).unwrap();
    pool.mark_dirty(&h1).unwrap();
    pool.mark_dirty(&h2).unwrap();

    pool.unpin(&h0).unwrap();
    pool.unpin(&h1).unwrap();
    // h2 (page 2) stays pinned.

    pool.force_flush().unwrap();

    assert_eq!(pool.num_write_io(), 2);
    assert_eq!(pool.dirty_flags(), vec![false, false, true]);
}
