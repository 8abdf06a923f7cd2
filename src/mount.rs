//! Mount Table
//!
//! This module implements the global mount point table: it maps absolute
//! path prefixes to mounted filesystem instances and is the only way the
//! dispatcher obtains a filesystem reference.
//!
//! The table is read-mostly: mounts and unmounts are rare, so a coarse
//! `RwLock` around a `BTreeMap` is sufficient. The map lock is never held
//! across a driver call.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use log::debug;
use spin::RwLock;

use crate::error::{FsError, FsResult};
use crate::flags::MountFlags;
use crate::fs::Filesystem;
use crate::ops::FsOps;

/// Mount point entry
#[derive(Clone)]
pub struct MountPoint {
    /// Mount path (e.g., "/", "/mnt/disk")
    pub path: String,
    /// The mounted filesystem; this `Arc` is the reference the mount itself
    /// holds, so a mounted filesystem's count is always at least 1.
    pub fs: Arc<Filesystem>,
}

/// Global mount table
pub struct MountTable {
    /// Map from mount path to mount point
    mounts: RwLock<BTreeMap<String, MountPoint>>,
    /// Next device id. Serialized behind its own lock rather than relying on
    /// mounts being externally single-threaded.
    next_device_id: RwLock<u64>,
}

impl MountTable {
    /// Create a new, empty mount table.
    pub fn new() -> Self {
        Self {
            mounts: RwLock::new(BTreeMap::new()),
            next_device_id: RwLock::new(1),
        }
    }

    /// Allocate a strictly increasing device id.
    ///
    /// Ids are never reused while mounted and are not persisted across
    /// remount.
    pub fn next_device_id(&self) -> u64 {
        let mut next = self.next_device_id.write();
        let id = *next;
        *next += 1;
        id
    }

    /// Mount a filesystem driver at an absolute path.
    ///
    /// # Arguments
    /// * `path` - Mount point path (must be absolute)
    /// * `ops` - The driver's operation table
    /// * `flags` - Mount flags
    ///
    /// # Returns
    /// The mounted filesystem instance, or `AlreadyExists` if the path is
    /// already a mount point.
    pub fn mount(
        &self,
        path: &str,
        ops: Arc<dyn FsOps>,
        flags: MountFlags,
    ) -> FsResult<Arc<Filesystem>> {
        assert!(path.starts_with('/'), "mount point must be absolute");

        let fs = Arc::new(Filesystem::new(self.next_device_id(), ops, flags));

        let mut mounts = self.mounts.write();
        if mounts.contains_key(path) {
            return Err(FsError::AlreadyExists);
        }

        debug!(
            "vfs: mounting device {} at {} ({})",
            fs.device_id(),
            path,
            if fs.is_read_write() { "rw" } else { "ro" }
        );

        mounts.insert(
            path.to_string(),
            MountPoint {
                path: path.to_string(),
                fs: Arc::clone(&fs),
            },
        );

        Ok(fs)
    }

    /// Unmount the filesystem at `path`, dropping the mount's reference.
    pub fn umount(&self, path: &str) -> FsResult<()> {
        let mount_point = {
            let mut mounts = self.mounts.write();
            mounts.remove(path).ok_or(FsError::NotFound)?
        };

        debug!(
            "vfs: unmounted device {} from {}",
            mount_point.fs.device_id(),
            path
        );
        Ok(())
    }

    /// Find the most specific mount covering an absolute path, retain its
    /// filesystem, and return it together with the remaining relative path.
    ///
    /// The remainder keeps its leading separator ("/mnt/x" under a mount at
    /// "/mnt" yields "/x") and is normalized to "/" when the path names the
    /// mount point itself. Matching is component-aware: a mount at "/mnt"
    /// covers "/mnt/x" but not "/mntx".
    ///
    /// The returned `Arc` is the retained reference; dropping it is the
    /// matching release.
    pub fn retain_fs_at(&self, path: &str) -> Option<(Arc<Filesystem>, String)> {
        let mounts = self.mounts.read();

        let mut best: Option<&MountPoint> = None;
        for (mount_path, mount_point) in mounts.iter() {
            if mount_covers(mount_path, path)
                && best.map_or(true, |b| mount_path.len() > b.path.len())
            {
                best = Some(mount_point);
            }
        }

        best.map(|mp| {
            let rest = if mp.path == "/" {
                path
            } else {
                &path[mp.path.len()..]
            };
            let rel = if rest.is_empty() { "/" } else { rest };
            (Arc::clone(&mp.fs), rel.to_string())
        })
    }

    /// Get the mount point covering a path, if any.
    pub fn find_mount(&self, path: &str) -> Option<MountPoint> {
        self.retain_fs_at(path).and_then(|(fs, _)| {
            let mounts = self.mounts.read();
            mounts
                .values()
                .find(|mp| Arc::ptr_eq(&mp.fs, &fs))
                .cloned()
        })
    }

    /// Check if a path is exactly a mount point.
    pub fn is_mount_point(&self, path: &str) -> bool {
        self.mounts.read().contains_key(path)
    }

    /// List all mount points.
    pub fn list_mounts(&self) -> Vec<MountPoint> {
        self.mounts.read().values().cloned().collect()
    }

    /// Number of mounted filesystems.
    pub fn count(&self) -> usize {
        self.mounts.read().len()
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a mount at `mount_path` covers `path`.
///
/// The match must end on a component boundary so that "/mnt" does not
/// claim "/mntx". The root mount covers every absolute path.
fn mount_covers(mount_path: &str, path: &str) -> bool {
    if mount_path == "/" {
        return path.starts_with('/');
    }
    path.starts_with(mount_path)
        && (path.len() == mount_path.len() || path.as_bytes()[mount_path.len()] == b'/')
}
