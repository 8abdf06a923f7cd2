//! Open, Descriptor and Mount Flags
//!
//! This module defines the flag sets consumed by the dispatcher: open-mode
//! flags fixed at open time, per-handle descriptor flags, mount flags, and
//! the seek whence values accepted by `seek`.

use bitflags::bitflags;

bitflags! {
    /// Open-mode flags, fixed on a handle at open time.
    ///
    /// Values follow the Linux ABI. The access mode lives in the low two
    /// bits: `0` is read-only, `WRONLY` write-only, `RDWR` read-write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const WRONLY    = 0o1;
        const RDWR      = 0o2;
        const APPEND    = 0o2000;
        const ASYNC     = 0o20000;
        const DIRECTORY = 0o200000;
        const CLOEXEC   = 0o2000000;
        /// `O_TMPFILE` includes the `DIRECTORY` bit; test with `contains`,
        /// which requires the full mask to be set.
        const TMPFILE   = 0o20200000;
    }
}

impl OpenFlags {
    /// Whether the handle was opened for reading.
    pub fn is_readable(&self) -> bool {
        !(self.contains(OpenFlags::WRONLY) && !self.contains(OpenFlags::RDWR))
    }

    /// Whether the handle was opened for writing.
    pub fn is_writable(&self) -> bool {
        self.intersects(OpenFlags::WRONLY | OpenFlags::RDWR)
    }

    /// Whether writes append to the end of the file.
    pub fn is_append(&self) -> bool {
        self.contains(OpenFlags::APPEND)
    }
}

bitflags! {
    /// Per-handle descriptor flags.
    ///
    /// Unlike open-mode flags these are mutable after open and are never
    /// shared between a handle and its duplicates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FdFlags: u32 {
        const CLOEXEC = 1 << 0;
    }
}

bitflags! {
    /// Mount flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MountFlags: u32 {
        const RDONLY = 1 << 0;
    }
}

/// Seek origin accepted by `seek`.
///
/// Only the three classic whence values exist; there is no sparse-file
/// `SEEK_DATA`/`SEEK_HOLE` support in this design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekWhence {
    /// From the start of the file (SEEK_SET)
    Set = 0,
    /// From the current position (SEEK_CUR)
    Cur = 1,
    /// From the end of the file (SEEK_END)
    End = 2,
}

impl SeekWhence {
    /// Parse a raw whence value; anything outside start/current/end is invalid.
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(SeekWhence::Set),
            1 => Some(SeekWhence::Cur),
            2 => Some(SeekWhence::End),
            _ => None,
        }
    }
}
