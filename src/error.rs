//! VFS Error Types
//!
//! Defines the error type shared by the dispatcher and filesystem drivers.
//! Every variant maps to a standard POSIX errno value so the syscall layer
//! can return errors to userspace without translation tables of its own.

use core::fmt;

/// Error codes returned by VFS operations and filesystem drivers.
///
/// The dispatcher never masks a driver error: whatever a driver returns is
/// propagated to the caller unchanged, with the dispatcher only adding its
/// own contract checks (capability, open-mode, read-only mount) on top.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FsError {
    /// Operation not permitted (EPERM)
    PermissionDenied,
    /// No such file or directory (ENOENT)
    NotFound,
    /// I/O error (EIO)
    IoError,
    /// Bad file descriptor (EBADF)
    BadDescriptor,
    /// File exists (EEXIST)
    AlreadyExists,
    /// Not a directory (ENOTDIR)
    NotADirectory,
    /// Is a directory (EISDIR)
    IsADirectory,
    /// Invalid argument (EINVAL)
    InvalidArgument,
    /// Too many open files in system (ENFILE)
    TooManyOpenFiles,
    /// Inappropriate ioctl for device (ENOTTY)
    NotATty,
    /// No space left on device (ENOSPC)
    NoSpace,
    /// Illegal seek (ESPIPE)
    NotSeekable,
    /// Read-only file system (EROFS)
    ReadOnlyFs,
    /// File name too long (ENAMETOOLONG)
    NameTooLong,
    /// Operation not supported (EOPNOTSUPP)
    NotSupported,
}

impl FsError {
    /// Convert to a POSIX errno value (negative, syscall-return style).
    pub fn to_errno(self) -> i64 {
        match self {
            FsError::PermissionDenied => -1,
            FsError::NotFound => -2,
            FsError::IoError => -5,
            FsError::BadDescriptor => -9,
            FsError::AlreadyExists => -17,
            FsError::NotADirectory => -20,
            FsError::IsADirectory => -21,
            FsError::InvalidArgument => -22,
            FsError::TooManyOpenFiles => -23,
            FsError::NotATty => -25,
            FsError::NoSpace => -28,
            FsError::NotSeekable => -29,
            FsError::ReadOnlyFs => -30,
            FsError::NameTooLong => -36,
            FsError::NotSupported => -95,
        }
    }

    /// Get the symbolic errno name.
    pub fn name(&self) -> &'static str {
        match self {
            FsError::PermissionDenied => "EPERM",
            FsError::NotFound => "ENOENT",
            FsError::IoError => "EIO",
            FsError::BadDescriptor => "EBADF",
            FsError::AlreadyExists => "EEXIST",
            FsError::NotADirectory => "ENOTDIR",
            FsError::IsADirectory => "EISDIR",
            FsError::InvalidArgument => "EINVAL",
            FsError::TooManyOpenFiles => "ENFILE",
            FsError::NotATty => "ENOTTY",
            FsError::NoSpace => "ENOSPC",
            FsError::NotSeekable => "ESPIPE",
            FsError::ReadOnlyFs => "EROFS",
            FsError::NameTooLong => "ENAMETOOLONG",
            FsError::NotSupported => "EOPNOTSUPP",
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FsError::PermissionDenied => "Operation not permitted",
            FsError::NotFound => "No such file or directory",
            FsError::IoError => "I/O error",
            FsError::BadDescriptor => "Bad file descriptor",
            FsError::AlreadyExists => "File exists",
            FsError::NotADirectory => "Not a directory",
            FsError::IsADirectory => "Is a directory",
            FsError::InvalidArgument => "Invalid argument",
            FsError::TooManyOpenFiles => "Too many open files",
            FsError::NotATty => "Inappropriate ioctl for device",
            FsError::NoSpace => "No space left on device",
            FsError::NotSeekable => "Illegal seek",
            FsError::ReadOnlyFs => "Read-only file system",
            FsError::NameTooLong => "File name too long",
            FsError::NotSupported => "Operation not supported",
        };
        write!(f, "{} ({})", msg, self.name())
    }
}

/// Result type for VFS operations.
pub type FsResult<T> = Result<T, FsError>;
