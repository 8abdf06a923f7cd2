//! Mounted Filesystem Instances
//!
//! A `Filesystem` ties a driver's operation table to a mount: a unique
//! device id, the mount flags, and the per-filesystem lock that guards
//! namespace mutation and path resolution.
//!
//! Ownership is reference counted through `Arc`: the mount table holds one
//! reference for the mount itself and every open handle holds exactly one
//! more, so a mounted filesystem can never be observed with a count of zero
//! while a handle on it is live. Releases are `Drop`, which makes a leaked
//! reference on an early-return path impossible by construction.

use alloc::sync::Arc;
use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::flags::MountFlags;
use crate::ops::FsOps;

/// A mounted filesystem driver instance.
pub struct Filesystem {
    /// Unique device id, strictly increasing, never reused while mounted.
    device_id: u64,
    /// Mount flags; a filesystem is read-write iff `RDONLY` is clear.
    flags: MountFlags,
    /// The driver's operation table.
    ops: Arc<dyn FsOps>,
    /// Namespace lock. Only the exclusive mode is used by the dispatcher,
    /// since resolution itself may mutate driver-internal caches; the shared
    /// mode exists for drivers with read-only internal walks.
    lock: RwLock<()>,
}

impl Filesystem {
    pub(crate) fn new(device_id: u64, ops: Arc<dyn FsOps>, flags: MountFlags) -> Self {
        Self {
            device_id,
            flags,
            ops,
            lock: RwLock::new(()),
        }
    }

    /// The unique device id assigned at mount time.
    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    /// Mount flags.
    pub fn flags(&self) -> MountFlags {
        self.flags
    }

    /// Whether namespace mutation (mkdir/rmdir/unlink) is allowed.
    pub fn is_read_write(&self) -> bool {
        !self.flags.contains(MountFlags::RDONLY)
    }

    /// The driver's operation table.
    pub fn ops(&self) -> &Arc<dyn FsOps> {
        &self.ops
    }

    /// Acquire the namespace lock exclusively.
    ///
    /// Held around resolve + operation pairs; released when the guard drops,
    /// so an early return cannot leak the lock.
    pub fn exlock(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }

    /// Acquire the namespace lock in shared mode.
    pub fn shlock(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }
}

impl core::fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Filesystem")
            .field("device_id", &self.device_id)
            .field("flags", &self.flags)
            .finish()
    }
}
