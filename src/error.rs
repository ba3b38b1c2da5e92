//! Error types for buffer pool operations.

use thiserror::Error;

/// Result type alias using [`BufferPoolError`].
pub type Result<T> = std::result::Result<T, BufferPoolError>;

/// Error types for buffer pool operations.
#[derive(Debug, Error)]
pub enum BufferPoolError {
    /// Null pool, null handle, or invalid capacity.
    #[error("invalid input: {0}")]
    InputError(String),

    /// The underlying page file could not be opened.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A read was requested for a page beyond the file's extent even after
    /// `ensure_capacity` was attempted.
    #[error("attempted to read non-existing page {0}")]
    ReadNonExistingPage(u64),

    /// A block write was rejected by the storage manager.
    #[error("failed to write page {page_id}: {source}")]
    WriteFailed {
        page_id: u64,
        #[source]
        source: std::io::Error,
    },

    /// All frames in the pool are pinned; no victim could be selected.
    #[error("buffer pool exhausted: all {capacity} frame(s) are pinned")]
    PoolExhausted { capacity: usize },

    /// `shutdown` was called while frames were still pinned, under the
    /// `RefusePinned` shutdown policy.
    #[error("shutdown attempted with {pinned} frame(s) still pinned")]
    PinnedOnShutdown { pinned: usize },

    /// Any other storage I/O failure not covered by a more specific variant.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
