//! Buffer pool manager for fixed-size page caching.
//!
//! This crate implements the buffer pool core: a fixed-size in-memory cache
//! of disk pages mediating all page-level I/O between higher layers and a
//! pluggable block storage backend, with three interchangeable replacement
//! policies (FIFO, LRU, CLOCK). See [`storage::buffer_pool`] for the
//! implementation and [`storage::page`] for the storage-manager contract it
//! consumes.

pub mod error;
pub mod storage;

pub use error::{BufferPoolError, Result};
pub use storage::{
    BlockStorage, BufferFrame, BufferPool, BufferPoolStats, FileBlockStorage, MemoryBlockStorage,
    PageHandle, PageId, PoolConfig, ReplacementPolicy, ReplacementPolicyKind, ShutdownPolicy,
    PAGE_SIZE,
};
