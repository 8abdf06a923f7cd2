//! Open File Handles
//!
//! This module implements the kernel-side representation of an open file
//! (distinct from any user-visible descriptor number) and the handle
//! registry that maps descriptor slots to handles.
//!
//! A handle is created by a successful `open` or by `dup`, mutated only
//! through its descriptor flags and the driver's implicit cursor, and
//! destroyed by `close`. It owns exactly one retained reference to its
//! filesystem, dropped exactly once when the handle is destroyed.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};
use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::flags::{FdFlags, OpenFlags};
use crate::fs::Filesystem;
use crate::ops::FileOps;

/// Maximum number of handle slots per registry
pub const MAX_HANDLES: usize = 256;

/// Kernel-side open file handle.
pub struct OpenHandle {
    /// The owning filesystem. This `Arc` is the handle's retained reference;
    /// it drops exactly once, when the handle is destroyed at close.
    fs: Arc<Filesystem>,
    /// The driver's per-open-file operation table, captured at creation so
    /// the data path never indirects through the filesystem.
    file: Arc<dyn FileOps>,
    /// Open-mode flags, fixed at open time.
    fl_flags: OpenFlags,
    /// Descriptor flags (close-on-exec). Not shared with duplicates.
    fd_flags: AtomicU32,
    /// Data-path lock: shared for read/seek, exclusive for write/ioctl/fcntl.
    lock: RwLock<()>,
}

impl OpenHandle {
    /// Create a handle around a retained filesystem reference and the
    /// driver's file-op table. Descriptor flags start empty.
    pub fn new(fs: Arc<Filesystem>, file: Arc<dyn FileOps>, fl_flags: OpenFlags) -> Self {
        Self {
            fs,
            file,
            fl_flags,
            fd_flags: AtomicU32::new(FdFlags::empty().bits()),
            lock: RwLock::new(()),
        }
    }

    /// The owning filesystem.
    pub fn filesystem(&self) -> &Arc<Filesystem> {
        &self.fs
    }

    /// The driver's per-open-file operation table.
    pub fn file(&self) -> &Arc<dyn FileOps> {
        &self.file
    }

    /// Open-mode flags fixed at open time.
    pub fn open_flags(&self) -> OpenFlags {
        self.fl_flags
    }

    /// Current descriptor flags.
    pub fn fd_flags(&self) -> FdFlags {
        FdFlags::from_bits_truncate(self.fd_flags.load(Ordering::Relaxed))
    }

    /// Replace the descriptor flags.
    pub fn set_fd_flags(&self, flags: FdFlags) {
        self.fd_flags.store(flags.bits(), Ordering::Relaxed);
    }

    /// Whether close-on-exec is set.
    pub fn is_cloexec(&self) -> bool {
        self.fd_flags().contains(FdFlags::CLOEXEC)
    }

    /// Acquire the handle lock in shared mode (read/seek path).
    pub fn shlock(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Acquire the handle lock exclusively (write/ioctl/fcntl path).
    pub fn exlock(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

impl core::fmt::Debug for OpenHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OpenHandle")
            .field("device_id", &self.fs.device_id())
            .field("fl_flags", &self.fl_flags)
            .field("fd_flags", &self.fd_flags())
            .finish()
    }
}

/// Shared reference to an open handle.
///
/// The registry and `dup` hand these out; after `close` a handle value must
/// not be reused; the dispatcher does not check for it.
pub type HandleRef = Arc<OpenHandle>;

/// Handle registry: descriptor slots for one process.
pub struct HandleTable {
    slots: [Option<HandleRef>; MAX_HANDLES],
}

impl HandleTable {
    /// Create a new empty handle table.
    pub fn new() -> Self {
        Self {
            slots: [const { None }; MAX_HANDLES],
        }
    }

    /// Store a handle in the lowest free slot.
    ///
    /// # Returns
    /// The allocated slot number, or None if the table is full.
    pub fn insert(&mut self, handle: HandleRef) -> Option<usize> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(handle);
                return Some(i);
            }
        }
        None
    }

    /// Get the handle in a slot.
    pub fn get(&self, slot: usize) -> Option<HandleRef> {
        self.slots.get(slot)?.clone()
    }

    /// Remove and return the handle in a slot.
    ///
    /// The caller is expected to pass the handle on to `Vfs::close`; the
    /// registry itself never destroys handles.
    pub fn remove(&mut self, slot: usize) -> Option<HandleRef> {
        self.slots.get_mut(slot)?.take()
    }

    /// Remove and return every handle with close-on-exec set.
    ///
    /// Used at exec time; the caller closes the returned handles.
    pub fn take_cloexec(&mut self) -> Vec<HandleRef> {
        let mut taken = Vec::new();
        for slot in self.slots.iter_mut() {
            if slot.as_ref().map_or(false, |h| h.is_cloexec()) {
                taken.push(slot.take().unwrap());
            }
        }
        taken
    }

    /// Count of occupied slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
