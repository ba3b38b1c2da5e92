//! Buffer pool management for page caching.
//!
//! This module implements the buffer pool core: a fixed-size in-memory cache
//! of fixed-size disk pages, mediating all page-level I/O between higher
//! layers and a [`BlockStorage`](crate::storage::page::BlockStorage)
//! implementation. It provides:
//! - Page pinning and unpinning with reference counting (`fix_count`)
//! - Three interchangeable replacement policies: FIFO, LRU, CLOCK
//! - Dirty-page write-back on eviction, `force_page`, and `force_flush`
//! - Per-frame statistics snapshots and aggregate pool statistics
//!
//! # Architecture
//!
//! Frames live in a flat `Vec`, indexed by stable `slot_index`. A
//! `page_id -> slot_index` side table accelerates lookup (§4.1); a
//! [`ReplacementPolicy`] tracks per-policy recency/reference metadata.
//! The core is single-threaded cooperative (SPEC_FULL.md §5): every mutating
//! method takes `&mut self`, and the Rust borrow checker enforces that
//! operations cannot interleave.
//!
//! # Example
//!
//! ```ignore
//! let storage = FileBlockStorage::open("db.pages")?;
//! let mut pool = BufferPool::init(storage, PoolConfig::default())?;
//! let handle = pool.pin(PageId::new(0))?;
//! pool.write(&handle)[0] = 42;
//! pool.mark_dirty(&handle)?;
//! pool.unpin(&handle)?;
//! ```

mod buffer_frame;
mod policy;

pub use buffer_frame::BufferFrame;
pub use policy::{ReplacementPolicy, ReplacementPolicyKind};

use std::collections::HashMap;

use crate::error::{BufferPoolError, Result};
use crate::storage::page::{BlockStorage, PageId, PAGE_SIZE};

/// What `shutdown` should do when frames are still pinned (SPEC_FULL.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Refuse with [`BufferPoolError::PinnedOnShutdown`], leaving the pool
    /// untouched so the caller can investigate the leaked pin. Default.
    #[default]
    RefusePinned,
    /// Proceed with shutdown regardless, leaving any pinned dirty frames
    /// unwritten. Intended for best-effort teardown on a fatal-error path.
    ProceedAnyway,
}

/// Configuration consumed by [`BufferPool::init`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Maximum number of pages to cache in memory (`N`).
    pub capacity: usize,
    /// Which replacement policy governs eviction.
    pub policy: ReplacementPolicyKind,
    /// What `shutdown` does when frames are still pinned.
    pub shutdown_policy: ShutdownPolicy,
}

impl PoolConfig {
    /// Creates a config with the given capacity and policy, using the
    /// default (`RefusePinned`) shutdown policy.
    #[must_use]
    pub fn new(capacity: usize, policy: ReplacementPolicyKind) -> Self {
        Self {
            capacity,
            policy,
            shutdown_policy: ShutdownPolicy::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(16, ReplacementPolicyKind::Lru)
    }
}

/// A page handle returned by [`BufferPool::pin`].
///
/// Unlike a `Drop`-based RAII guard, this handle is a plain `Copy` value
/// carrying only the pinned `page_id` — the pool is explicitly
/// single-threaded (SPEC_FULL.md §5) and the buffer manager contract
/// requires an explicit `unpin` call (§6), so there is no aliasing hazard to
/// guard against with a borrow-checked lifetime. Using a handle after its
/// matching `unpin` is a caller bug, exactly as SPEC_FULL.md §3 describes;
/// it is not rejected by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    page_id: PageId,
}

impl PageHandle {
    /// Returns the page id this handle refers to.
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }
}

/// Aggregate statistics about a buffer pool's state, a fresh snapshot per call.
#[derive(Debug, Clone, Copy)]
pub struct BufferPoolStats {
    /// Maximum number of pages the pool can hold.
    pub capacity: usize,
    /// Current number of resident pages.
    pub pages_used: usize,
    /// Number of resident pages that are dirty.
    pub dirty_pages: usize,
    /// Number of resident pages that are pinned.
    pub pinned_pages: usize,
    /// Total successful reads from the backing store.
    pub read_io: u64,
    /// Total successful writes to the backing store.
    pub write_io: u64,
    /// Number of pins that hit a resident page.
    pub cache_hits: u64,
    /// Number of pins that required loading from the backing store.
    pub cache_misses: u64,
    /// Number of frames evicted to make room for a miss.
    pub evictions: u64,
}

impl BufferPoolStats {
    /// Cache hit rate in `[0.0, 1.0]`, or `None` if there have been no pins.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.total_accesses();
        if total == 0 {
            None
        } else {
            Some(self.cache_hits as f64 / total as f64)
        }
    }

    /// Total number of pins observed (hits plus misses).
    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.cache_hits + self.cache_misses
    }
}

/// Fixed-size in-memory page cache mediating I/O against a [`BlockStorage`].
pub struct BufferPool<S: BlockStorage> {
    frames: Vec<BufferFrame>,
    page_table: HashMap<PageId, usize>,
    policy: ReplacementPolicy,
    capacity: usize,
    occupied: usize,
    storage: S,
    shutdown_policy: ShutdownPolicy,
    read_io: u64,
    write_io: u64,
    cache_hits: u64,
    cache_misses: u64,
    evictions: u64,
}

impl<S: BlockStorage> BufferPool<S> {
    /// Creates a new buffer pool over `storage` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::InputError`] if `config.capacity` is zero.
    pub fn init(storage: S, config: PoolConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(BufferPoolError::InputError(
                "buffer pool capacity must be greater than 0".into(),
            ));
        }

        let frames = (0..config.capacity).map(BufferFrame::new).collect();
        let policy = ReplacementPolicy::new(config.policy, config.capacity);

        Ok(Self {
            frames,
            page_table: HashMap::with_capacity(config.capacity),
            policy,
            capacity: config.capacity,
            occupied: 0,
            storage,
            shutdown_policy: config.shutdown_policy,
            read_io: 0,
            write_io: 0,
            cache_hits: 0,
            cache_misses: 0,
            evictions: 0,
        })
    }

    /// Returns the pool's capacity (`N`).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently resident pages.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    // ---- Pin protocol (SPEC_FULL.md §4.2) ----------------------------------

    /// Pins `page_id`, loading it from the backing store on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::PoolExhausted`] if every frame is pinned
    /// and no victim can be selected, or a storage error if the read-in (or
    /// a required write-back) fails.
    pub fn pin(&mut self, page_id: PageId) -> Result<PageHandle> {
        if let Some(&slot) = self.page_table.get(&page_id) {
            self.frames[slot].fix_count += 1;
            self.policy.on_hit(slot);
            self.cache_hits += 1;
            return Ok(PageHandle { page_id });
        }

        self.cache_misses += 1;

        let slot = if self.occupied < self.capacity {
            self.find_empty_slot()
                .expect("occupied < capacity implies an empty slot exists")
        } else {
            let fix_counts: Vec<u32> = self.frames.iter().map(|f| f.fix_count).collect();
            match self.policy.select_victim(&fix_counts) {
                Some(slot) => slot,
                None => {
                    return Err(BufferPoolError::PoolExhausted {
                        capacity: self.capacity,
                    })
                }
            }
        };

        if !self.frames[slot].is_empty() {
            if self.frames[slot].dirty {
                // select_victim is non-destructive for FIFO/LRU (policy.rs):
                // on failure here, nothing has been mutated yet for this pin,
                // so the same victim is selected again on retry without any
                // compensating call (§4.4). CLOCK does not share this
                // guarantee: its scan advances the hand and clears reference
                // bits as it goes, so a retry after this write fails may
                // select a different victim (policy.rs).
                self.write_back(slot)?;
            }
            self.page_table.remove(&self.frames[slot].page_id);
            self.evictions += 1;
        } else {
            self.occupied += 1;
        }

        let page_idx = page_id
            .as_u64()
            .ok_or_else(|| BufferPoolError::InputError("cannot pin PageId::NO_PAGE".into()))?;
        self.storage.ensure_capacity(page_idx + 1)?;

        let mut bytes = [0u8; PAGE_SIZE];
        self.storage.read_block(page_idx, &mut bytes)?;
        self.read_io += 1;

        let frame = &mut self.frames[slot];
        frame.page_id = page_id;
        frame.bytes = bytes;
        frame.dirty = false;
        frame.fix_count = 1;

        self.page_table.insert(page_id, slot);
        self.policy.on_admit(slot);

        Ok(PageHandle { page_id })
    }

    fn find_empty_slot(&self) -> Option<usize> {
        self.frames.iter().position(BufferFrame::is_empty)
    }

    // ---- Unpin / MarkDirty / ForcePage (SPEC_FULL.md §4.3) -----------------

    /// Decrements the fix count on the page behind `handle`.
    ///
    /// No-op (tolerated, not an error) if the page is no longer resident.
    ///
    /// # Errors
    ///
    /// This operation cannot fail; it returns `Result` for contract symmetry
    /// with the rest of the buffer manager interface (SPEC_FULL.md §6).
    pub fn unpin(&mut self, handle: &PageHandle) -> Result<()> {
        if let Some(&slot) = self.page_table.get(&handle.page_id) {
            let frame = &mut self.frames[slot];
            debug_assert!(
                frame.fix_count > 0,
                "unpin underflow on page {:?}: fix_count already 0",
                handle.page_id
            );
            frame.fix_count = frame.fix_count.saturating_sub(1);
        }
        Ok(())
    }

    /// Marks the page behind `handle` dirty. Idempotent; a no-op if the page
    /// is no longer resident.
    ///
    /// # Errors
    ///
    /// This operation cannot fail; see [`BufferPool::unpin`].
    pub fn mark_dirty(&mut self, handle: &PageHandle) -> Result<()> {
        if let Some(&slot) = self.page_table.get(&handle.page_id) {
            self.frames[slot].dirty = true;
        }
        Ok(())
    }

    /// Writes the page behind `handle` back to storage if it is dirty,
    /// leaving it pinned.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::WriteFailed`] if the write fails.
    pub fn force_page(&mut self, handle: &PageHandle) -> Result<()> {
        if let Some(&slot) = self.page_table.get(&handle.page_id) {
            if self.frames[slot].dirty {
                self.write_back(slot)?;
            }
        }
        Ok(())
    }

    /// Writes `frame.bytes` to storage and clears `dirty`, only on success.
    fn write_back(&mut self, slot: usize) -> Result<()> {
        let page_idx = self.frames[slot]
            .page_id
            .as_u64()
            .expect("write_back called on an empty frame");
        self.storage.ensure_capacity(page_idx + 1)?;
        self.storage.write_block(page_idx, &self.frames[slot].bytes)?;
        self.write_io += 1;
        self.frames[slot].dirty = false;
        Ok(())
    }

    // ---- Byte access --------------------------------------------------------

    /// Returns a read-only view of the pinned page's bytes.
    #[must_use]
    pub fn read(&self, handle: &PageHandle) -> &[u8; PAGE_SIZE] {
        let slot = self.page_table[&handle.page_id];
        &self.frames[slot].bytes
    }

    /// Returns a mutable view of the pinned page's bytes and marks it dirty.
    ///
    /// Equivalent to calling [`BufferPool::mark_dirty`] before writing.
    pub fn write(&mut self, handle: &PageHandle) -> &mut [u8; PAGE_SIZE] {
        let slot = self.page_table[&handle.page_id];
        self.frames[slot].dirty = true;
        &mut self.frames[slot].bytes
    }

    // ---- Lifecycle (SPEC_FULL.md §4.5) --------------------------------------

    /// Writes every dirty, unpinned frame back to storage.
    ///
    /// Stops at the first failure, leaving any not-yet-visited dirty frames
    /// untouched (SPEC_FULL.md §4.5).
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::WriteFailed`] if a write fails.
    pub fn force_flush(&mut self) -> Result<()> {
        for slot in 0..self.frames.len() {
            if self.frames[slot].dirty && self.frames[slot].fix_count == 0 {
                self.write_back(slot)?;
            }
        }
        Ok(())
    }

    /// Flushes all dirty unpinned frames, then releases the pool.
    ///
    /// Under [`ShutdownPolicy::RefusePinned`] (the default), returns
    /// [`BufferPoolError::PinnedOnShutdown`] without flushing if any frame is
    /// still pinned. Under [`ShutdownPolicy::ProceedAnyway`], flushes and
    /// tears down regardless, leaving any pinned dirty frames unwritten.
    ///
    /// Takes `self` by value: the pool cannot be used again after this call
    /// returns, which is how this crate enforces SPEC_FULL.md §3 invariant 7
    /// at the type level.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::PinnedOnShutdown`] or a flush error.
    pub fn shutdown(mut self) -> Result<()> {
        let pinned = self.frames.iter().filter(|f| f.fix_count > 0).count();

        if pinned > 0 && self.shutdown_policy == ShutdownPolicy::RefusePinned {
            return Err(BufferPoolError::PinnedOnShutdown { pinned });
        }

        self.force_flush()
    }

    // ---- Statistics & introspection (SPEC_FULL.md §4.6) ---------------------

    /// Snapshot of resident page ids, one per slot, in `slot_index` order.
    /// Empty slots report `PageId::NO_PAGE`. Length is always `capacity`.
    #[must_use]
    pub fn frame_contents(&self) -> Vec<PageId> {
        self.frames.iter().map(|f| f.page_id).collect()
    }

    /// Snapshot of per-slot dirty flags, in `slot_index` order.
    #[must_use]
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    /// Snapshot of per-slot fix counts, in `slot_index` order.
    #[must_use]
    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.fix_count).collect()
    }

    /// Total successful reads from the backing store so far.
    #[must_use]
    pub fn num_read_io(&self) -> u64 {
        self.read_io
    }

    /// Total successful writes to the backing store so far.
    #[must_use]
    pub fn num_write_io(&self) -> u64 {
        self.write_io
    }

    /// Aggregate statistics snapshot (SPEC_FULL.md §1.2 supplement).
    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        let mut dirty_pages = 0;
        let mut pinned_pages = 0;
        for frame in &self.frames {
            if frame.is_empty() {
                continue;
            }
            if frame.dirty {
                dirty_pages += 1;
            }
            if frame.fix_count > 0 {
                pinned_pages += 1;
            }
        }

        BufferPoolStats {
            capacity: self.capacity,
            pages_used: self.occupied,
            dirty_pages,
            pinned_pages,
            read_io: self.read_io,
            write_io: self.write_io,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            evictions: self.evictions,
        }
    }

    /// Resets the hit/miss/eviction counters. The I/O counters are never
    /// reset: SPEC_FULL.md §3 invariant 5 requires them monotonically
    /// non-decreasing for the pool's lifetime.
    pub fn reset_stats(&mut self) {
        self.cache_hits = 0;
        self.cache_misses = 0;
        self.evictions = 0;
    }
}
