//! Driver Operation Tables
//!
//! This module defines the capability-based dispatch interface between the
//! VFS and concrete filesystem drivers: a per-mount table (`FsOps`) for
//! namespace operations and a per-open-file table (`FileOps`) for data-path
//! operations.
//!
//! Every operation except `resolve` and `open` is optional. A driver
//! advertises what it supports through the capability bitsets; the
//! dispatcher checks those before taking any lock and maps a missing
//! capability to the operation-specific POSIX error. The default method
//! bodies return `NotSupported` so an absent capability can never reach
//! undefined behavior even if called directly.

use alloc::sync::Arc;
use bitflags::bitflags;

use crate::error::{FsError, FsResult};
use crate::flags::{OpenFlags, SeekWhence};
use crate::path::ResolvedPath;

bitflags! {
    /// Per-mount operations a driver supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FsOpCaps: u32 {
        const OPEN   = 1 << 0;
        const MKDIR  = 1 << 1;
        const RMDIR  = 1 << 2;
        const UNLINK = 1 << 3;
    }
}

bitflags! {
    /// Per-open-file operations a driver supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileOpCaps: u32 {
        const READ  = 1 << 0;
        const WRITE = 1 << 1;
        const SEEK  = 1 << 2;
        const IOCTL = 1 << 3;
        const FCNTL = 1 << 4;
        const DUP   = 1 << 5;
    }
}

/// Per-mount operation table.
///
/// Namespace operations (`open`, `mkdir`, `rmdir`, `unlink`) and path
/// resolution. The dispatcher calls `resolve` and the consuming operation
/// back to back under the filesystem's exclusive lock, because resolution
/// may mutate driver-internal caches.
pub trait FsOps: Send + Sync {
    /// Capabilities advertised by this driver.
    fn caps(&self) -> FsOpCaps;

    /// Resolve a path relative to this filesystem's root into a
    /// driver-specific descriptor.
    ///
    /// The path always begins with a separator; the mount-point prefix has
    /// already been stripped by the mount table.
    fn resolve(&self, rel_path: &str) -> FsResult<ResolvedPath>;

    /// Open the object behind a resolved path, producing the per-open-file
    /// operation table (with any cursor state the driver keeps inside it).
    fn open(
        &self,
        path: &ResolvedPath,
        flags: OpenFlags,
        mode: u32,
    ) -> FsResult<Arc<dyn FileOps>>;

    /// Create a directory.
    fn mkdir(&self, _path: &ResolvedPath, _mode: u32) -> FsResult<()> {
        Err(FsError::NotSupported)
    }

    /// Remove an empty directory.
    fn rmdir(&self, _path: &ResolvedPath) -> FsResult<()> {
        Err(FsError::NotSupported)
    }

    /// Remove a file.
    fn unlink(&self, _path: &ResolvedPath) -> FsResult<()> {
        Err(FsError::NotSupported)
    }
}

/// Per-open-file operation table.
///
/// One instance exists per open handle; the driver keeps its implicit cursor
/// and any other per-open state inside it. The dispatcher serializes calls
/// through the handle lock: `read` and `seek` run under the shared mode,
/// `write`, `ioctl` and `fcntl` under the exclusive mode.
pub trait FileOps: Send + Sync {
    /// Capabilities advertised for this open file.
    fn caps(&self) -> FileOpCaps;

    /// Read at the current cursor, advancing it.
    fn read(&self, _buf: &mut [u8]) -> FsResult<usize> {
        Err(FsError::NotSupported)
    }

    /// Write at the current cursor (or at the end when opened for append),
    /// advancing it.
    fn write(&self, _buf: &[u8]) -> FsResult<usize> {
        Err(FsError::NotSupported)
    }

    /// Reposition the cursor, returning the new absolute offset.
    fn seek(&self, _offset: i64, _whence: SeekWhence) -> FsResult<u64> {
        Err(FsError::NotSupported)
    }

    /// Device-specific control operation.
    fn ioctl(&self, _request: u64, _arg: usize) -> FsResult<usize> {
        Err(FsError::NotSupported)
    }

    /// Driver-level fcntl commands. Descriptor-flag commands are handled by
    /// the handle itself and never reach the driver.
    fn fcntl(&self, _cmd: u32, _arg: usize) -> FsResult<usize> {
        Err(FsError::NotSupported)
    }

    /// Duplicate this open file, cloning the cursor state.
    fn dup(&self) -> FsResult<Arc<dyn FileOps>> {
        Err(FsError::NotSupported)
    }

    /// Called exactly once when the owning handle is closed.
    fn release(&self) {}
}
