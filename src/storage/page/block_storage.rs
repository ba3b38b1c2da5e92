//! The storage manager contract the buffer pool core consumes.
//!
//! The real storage manager — file layout, extension, fsync policy — lives
//! outside this crate's scope (see SPEC_FULL.md §1, §6). The core only needs
//! an abstract block-I/O interface: read a fixed-size block, write a
//! fixed-size block, and extend the backing store to hold at least N blocks.
//! [`FileBlockStorage`] is a faithful implementation against a real file;
//! [`MemoryBlockStorage`] is an in-memory test double used to keep
//! replacement-policy unit tests deterministic and fast.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{BufferPoolError, Result};
use crate::storage::page::PAGE_SIZE;

/// Abstract block-I/O interface consumed by [`crate::storage::buffer_pool::BufferPool`].
pub trait BlockStorage {
    /// Reads the block at `page_id` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::ReadNonExistingPage`] if `page_id` is
    /// beyond the store's extent even after `ensure_capacity` should have
    /// grown it, or another I/O error on a genuine read failure.
    fn read_block(&mut self, page_id: u64, buf: &mut [u8; PAGE_SIZE]) -> Result<()>;

    /// Writes `buf` to the block at `page_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::WriteFailed`] if the underlying write is
    /// rejected.
    fn write_block(&mut self, page_id: u64, buf: &[u8; PAGE_SIZE]) -> Result<()>;

    /// Extends the backing store, zero-filling as needed, so that it holds
    /// at least `min_page_count` blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be extended.
    fn ensure_capacity(&mut self, min_page_count: u64) -> Result<()>;

    /// Returns the number of blocks currently backed by the store.
    fn num_pages(&self) -> u64;
}

/// File-backed [`BlockStorage`].
///
/// Keeps a single `File` handle open for its entire lifetime rather than
/// opening and closing per operation — a valid optimization the reference
/// design explicitly allows (SPEC_FULL.md §5, §9), as long as I/O counter
/// semantics at the buffer-pool layer are preserved. The file is closed by
/// `File`'s own `Drop` impl.
pub struct FileBlockStorage {
    path: PathBuf,
    file: File,
}

impl FileBlockStorage {
    /// Opens (creating if necessary) the page file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferPoolError::FileNotFound`] if the file cannot be
    /// opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| BufferPoolError::FileNotFound(format!("{}: {e}", path.display())))?;

        Ok(Self { path, file })
    }

    /// Returns the path to the backing page file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockStorage for FileBlockStorage {
    fn read_block(&mut self, page_id: u64, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        let offset = page_id * PAGE_SIZE as u64;
        self.file.seek(SeekFrom::Start(offset))?;

        match self.file.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(BufferPoolError::ReadNonExistingPage(page_id))
            }
            Err(e) => Err(BufferPoolError::Io(e)),
        }
    }

    fn write_block(&mut self, page_id: u64, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        let offset = page_id * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| BufferPoolError::WriteFailed { page_id, source })?;
        self.file
            .write_all(buf)
            .map_err(|source| BufferPoolError::WriteFailed { page_id, source })
    }

    fn ensure_capacity(&mut self, min_page_count: u64) -> Result<()> {
        let current_len = self.file.metadata()?.len();
        let min_len = min_page_count * PAGE_SIZE as u64;
        if current_len < min_len {
            self.file.set_len(min_len)?;
        }
        Ok(())
    }

    fn num_pages(&self) -> u64 {
        self.file
            .metadata()
            .map(|m| m.len() / PAGE_SIZE as u64)
            .unwrap_or(0)
    }
}

/// In-memory [`BlockStorage`] test double.
///
/// Also supports injecting a single write failure, which this crate's test
/// suite uses to exercise the §4.4 "failed write-back during eviction leaves
/// the victim retryable" design.
pub struct MemoryBlockStorage {
    pages: Vec<[u8; PAGE_SIZE]>,
    fail_next_write: bool,
}

impl MemoryBlockStorage {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            fail_next_write: false,
        }
    }

    /// Causes the next `write_block` call to fail with a synthetic I/O error
    /// instead of succeeding, without consuming the underlying buffer state.
    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }
}

impl Default for MemoryBlockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStorage for MemoryBlockStorage {
    fn read_block(&mut self, page_id: u64, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        let idx = page_id as usize;
        match self.pages.get(idx) {
            Some(page) => {
                buf.copy_from_slice(page);
                Ok(())
            }
            None => Err(BufferPoolError::ReadNonExistingPage(page_id)),
        }
    }

    fn write_block(&mut self, page_id: u64, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(BufferPoolError::WriteFailed {
                page_id,
                source: std::io::Error::other("synthetic write failure"),
            });
        }

        let idx = page_id as usize;
        if idx >= self.pages.len() {
            return Err(BufferPoolError::ReadNonExistingPage(page_id));
        }
        self.pages[idx].copy_from_slice(buf);
        Ok(())
    }

    fn ensure_capacity(&mut self, min_page_count: u64) -> Result<()> {
        let min_len = min_page_count as usize;
        if self.pages.len() < min_len {
            self.pages.resize(min_len, [0u8; PAGE_SIZE]);
        }
        Ok(())
    }

    fn num_pages(&self) -> u64 {
        self.pages.len() as u64
    }
}
