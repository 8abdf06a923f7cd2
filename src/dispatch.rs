//! VFS Dispatcher
//!
//! The public VFS operations: they sequence the mount table, the two lock
//! tiers, the driver's path resolver and the driver operation itself, and
//! they own the reference-counting contract: a filesystem reference taken
//! at entry is released on every exit path, success or failure.
//!
//! All path-based operations require absolute paths; passing a relative path
//! is a caller bug and panics. Operations that may block assert (through the
//! task hooks, when installed) that preemption is enabled.

use alloc::sync::Arc;
use log::trace;
use spin::Once;

use crate::error::{FsError, FsResult};
use crate::flags::{FdFlags, OpenFlags, SeekWhence};
use crate::handle::{HandleRef, OpenHandle};
use crate::mount::MountTable;
use crate::ops::{FileOpCaps, FsOpCaps};
use crate::task;

/// The VFS dispatcher: a mount table plus the nine public operations.
pub struct Vfs {
    mounts: MountTable,
}

impl Vfs {
    /// Create a dispatcher with an empty mount table.
    pub fn new() -> Self {
        Self {
            mounts: MountTable::new(),
        }
    }

    /// The mount table behind this dispatcher.
    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    /// Open a file by absolute path.
    ///
    /// `O_ASYNC` and `O_TMPFILE` are rejected before any filesystem is
    /// retained. On success the returned handle owns one retained reference
    /// to its filesystem; on any failure after the mount lookup, the
    /// reference taken here is dropped before returning.
    pub fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> FsResult<HandleRef> {
        task::assert_preemption_enabled();
        assert!(path.starts_with('/'), "vfs: open requires an absolute path");

        if flags.contains(OpenFlags::ASYNC) {
            return Err(FsError::InvalidArgument);
        }

        if flags.contains(OpenFlags::TMPFILE) {
            return Err(FsError::NotSupported);
        }

        let (fs, rel_path) = self
            .mounts
            .retain_fs_at(path)
            .ok_or(FsError::NotFound)?;

        if !fs.ops().caps().contains(FsOpCaps::OPEN) {
            return Err(FsError::NotSupported);
        }

        let file = {
            let _guard = fs.exlock();
            let resolved = fs.ops().resolve(&rel_path)?;
            fs.ops().open(&resolved, flags, mode)?
        };

        trace!("vfs: opened {} on device {}", path, fs.device_id());

        // Success: `fs` moves into the handle, which now owns the retained
        // reference. The error paths above drop it instead.
        let handle = Arc::new(OpenHandle::new(fs, file, flags));

        if flags.contains(OpenFlags::CLOEXEC) {
            handle.set_fd_flags(FdFlags::CLOEXEC);
        }

        Ok(handle)
    }

    /// Close a handle, destroying it.
    ///
    /// Severs the handle's memory mappings (through the task hooks; skipped
    /// in restricted execution mode), runs the driver's release, then drops
    /// the handle's filesystem reference. The caller must not reuse the
    /// handle afterwards; other live clones of the `HandleRef` keep the
    /// destruction pending, which this layer does not check.
    pub fn close(&self, handle: HandleRef) {
        if let Some(hooks) = task::task_hooks() {
            hooks.remove_handle_mappings(&handle);
        }

        handle.file().release();

        // While a filesystem is mounted, the mount itself holds a reference,
        // so dropping the handle's reference can never reach zero.
        debug_assert!(
            Arc::strong_count(handle.filesystem()) >= 2,
            "vfs: close would drop the last reference to a mounted filesystem"
        );

        trace!(
            "vfs: closed handle on device {}",
            handle.filesystem().device_id()
        );
        drop(handle);
    }

    /// Duplicate a handle.
    ///
    /// The driver clones the per-open-file state (cursor included), so the
    /// duplicate inherits the open-mode flags but starts with empty
    /// descriptor flags, and it retains the filesystem a second time (one
    /// reference per handle).
    pub fn dup(&self, handle: &OpenHandle) -> FsResult<HandleRef> {
        if !handle.file().caps().contains(FileOpCaps::DUP) {
            return Err(FsError::NotSupported);
        }

        let file = handle.file().dup()?;
        Ok(Arc::new(OpenHandle::new(
            Arc::clone(handle.filesystem()),
            file,
            handle.open_flags(),
        )))
    }

    /// Read from a handle at its current cursor.
    ///
    /// Runs the driver under the handle's shared lock, so reads on one
    /// handle may interleave freely with each other.
    pub fn read(&self, handle: &OpenHandle, buf: &mut [u8]) -> FsResult<usize> {
        task::assert_preemption_enabled();

        if !handle.file().caps().contains(FileOpCaps::READ) {
            return Err(FsError::NotSupported);
        }

        if !handle.open_flags().is_readable() {
            return Err(FsError::BadDescriptor);
        }

        let _guard = handle.shlock();
        handle.file().read(buf)
    }

    /// Write to a handle at its current cursor.
    ///
    /// Runs the driver under the handle's exclusive lock: a write never
    /// overlaps with any read or another write on the same handle.
    pub fn write(&self, handle: &OpenHandle, buf: &[u8]) -> FsResult<usize> {
        task::assert_preemption_enabled();

        if !handle.file().caps().contains(FileOpCaps::WRITE) {
            return Err(FsError::NotSupported);
        }

        if !handle.open_flags().is_writable() {
            return Err(FsError::BadDescriptor);
        }

        let _guard = handle.exlock();
        handle.file().write(buf)
    }

    /// Reposition a handle's cursor, returning the new offset.
    pub fn seek(&self, handle: &OpenHandle, offset: i64, whence: u32) -> FsResult<u64> {
        task::assert_preemption_enabled();

        let whence = SeekWhence::from_u32(whence).ok_or(FsError::InvalidArgument)?;

        if !handle.file().caps().contains(FileOpCaps::SEEK) {
            return Err(FsError::NotSeekable);
        }

        let _guard = handle.shlock();
        handle.file().seek(offset, whence)
    }

    /// Device-specific control operation.
    pub fn ioctl(&self, handle: &OpenHandle, request: u64, arg: usize) -> FsResult<usize> {
        task::assert_preemption_enabled();

        if !handle.file().caps().contains(FileOpCaps::IOCTL) {
            // ENOTTY *is* the right error here even with no terminal
            // involved. See the ioctl man page.
            return Err(FsError::NotATty);
        }

        let _guard = handle.exlock();
        handle.file().ioctl(request, arg)
    }

    /// Driver-level fcntl command.
    ///
    /// Descriptor-flag access (`F_GETFD`/`F_SETFD` style) goes through
    /// [`OpenHandle::fd_flags`]/[`OpenHandle::set_fd_flags`] and never
    /// reaches the driver.
    pub fn fcntl(&self, handle: &OpenHandle, cmd: u32, arg: usize) -> FsResult<usize> {
        task::assert_preemption_enabled();

        if !handle.file().caps().contains(FileOpCaps::FCNTL) {
            return Err(FsError::InvalidArgument);
        }

        let _guard = handle.exlock();
        handle.file().fcntl(cmd, arg)
    }

    /// Create a directory at an absolute path.
    pub fn mkdir(&self, path: &str, mode: u32) -> FsResult<()> {
        task::assert_preemption_enabled();
        assert!(path.starts_with('/'), "vfs: mkdir requires an absolute path");

        let (fs, rel_path) = self
            .mounts
            .retain_fs_at(path)
            .ok_or(FsError::NotFound)?;

        if !fs.is_read_write() {
            return Err(FsError::ReadOnlyFs);
        }

        if !fs.ops().caps().contains(FsOpCaps::MKDIR) {
            return Err(FsError::PermissionDenied);
        }

        let _guard = fs.exlock();
        let resolved = fs.ops().resolve(&rel_path)?;
        fs.ops().mkdir(&resolved, mode)
        // The reference retained at entry drops here, on success and on
        // every error path above.
    }

    /// Remove an empty directory at an absolute path.
    pub fn rmdir(&self, path: &str) -> FsResult<()> {
        task::assert_preemption_enabled();
        assert!(path.starts_with('/'), "vfs: rmdir requires an absolute path");

        let (fs, rel_path) = self
            .mounts
            .retain_fs_at(path)
            .ok_or(FsError::NotFound)?;

        if !fs.is_read_write() {
            return Err(FsError::ReadOnlyFs);
        }

        if !fs.ops().caps().contains(FsOpCaps::RMDIR) {
            return Err(FsError::PermissionDenied);
        }

        let _guard = fs.exlock();
        let resolved = fs.ops().resolve(&rel_path)?;
        fs.ops().rmdir(&resolved)
    }

    /// Remove a file at an absolute path.
    pub fn unlink(&self, path: &str) -> FsResult<()> {
        task::assert_preemption_enabled();
        assert!(path.starts_with('/'), "vfs: unlink requires an absolute path");

        let (fs, rel_path) = self
            .mounts
            .retain_fs_at(path)
            .ok_or(FsError::NotFound)?;

        if !fs.is_read_write() {
            return Err(FsError::ReadOnlyFs);
        }

        if !fs.ops().caps().contains(FsOpCaps::UNLINK) {
            return Err(FsError::ReadOnlyFs);
        }

        let _guard = fs.exlock();
        let resolved = fs.ops().resolve(&rel_path)?;
        fs.ops().unlink(&resolved)
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Global dispatcher instance
static VFS: Once<Vfs> = Once::new();

/// Get the global dispatcher.
pub fn vfs() -> &'static Vfs {
    VFS.call_once(Vfs::new)
}
