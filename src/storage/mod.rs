//! Storage layer: page-level I/O and buffer pool management.
//!
//! This module provides:
//! - Page-level I/O ([`page`]): [`PageId`], [`BlockStorage`]
//! - Buffer pool management ([`buffer_pool`]): pin/unpin, replacement
//!   policies, dirty-page write-back

pub mod buffer_pool;
pub mod page;

pub use buffer_pool::{
    BufferFrame, BufferPool, BufferPoolStats, PageHandle, PoolConfig, ReplacementPolicy,
    ReplacementPolicyKind, ShutdownPolicy,
};
pub use page::{BlockStorage, FileBlockStorage, MemoryBlockStorage, PageId, PAGE_SIZE};
