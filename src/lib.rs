//! Virtual Filesystem Dispatch Layer
//!
//! This crate implements the VFS core of a monolithic kernel: it turns
//! path-based operations (open, close, read, write, seek, ioctl, fcntl,
//! mkdir, rmdir, unlink, dup) into calls against one of several mounted
//! filesystem drivers, while enforcing safe concurrent access to shared
//! mount and per-handle state.
//!
//! ```text
//! +------------------+
//! |   System Calls   |
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    Dispatcher    |  Vfs::open, Vfs::read, Vfs::write, ...
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   Mount Table    |  path prefix -> retained Filesystem + rel. path
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | FsOps / FileOps  |  driver capability tables
//! +------------------+
//! ```
//!
//! Two independent lock tiers protect the hot path: a per-filesystem lock
//! held exclusively around path resolution and namespace mutation, and a
//! per-handle lock taken shared for reads and seeks, exclusive for writes
//! and control operations. Operations on different filesystems never block
//! each other; there is no global lock.
//!
//! Filesystem lifetimes are reference counted through `Arc`: the mount
//! table holds one reference per mount, every open handle holds exactly one
//! more, and releases are `Drop` so no exit path can leak a reference.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod dispatch;
pub mod error;
pub mod flags;
pub mod fs;
pub mod handle;
pub mod mount;
pub mod ops;
pub mod path;
pub mod task;

// Re-export main types at crate level for convenience
pub use dispatch::{vfs, Vfs};
pub use error::{FsError, FsResult};
pub use flags::{FdFlags, MountFlags, OpenFlags, SeekWhence};
pub use fs::Filesystem;
pub use handle::{HandleRef, HandleTable, OpenHandle, MAX_HANDLES};
pub use mount::{MountPoint, MountTable};
pub use ops::{FileOpCaps, FileOps, FsOpCaps, FsOps};
pub use path::ResolvedPath;
pub use task::{install_task_hooks, TaskHooks};
