//! Resolved Paths
//!
//! A `ResolvedPath` is the transient, driver-specific descriptor produced by
//! a filesystem's path resolver from a relative path. It is created under the
//! filesystem's exclusive lock, handed straight to the driver operation that
//! consumes it, and never retained beyond that call.

use alloc::boxed::Box;
use core::any::Any;

/// Driver-opaque resolved-path descriptor.
///
/// The dispatcher treats this as a black box: it obtains one from
/// [`FsOps::resolve`](crate::ops::FsOps::resolve) and passes it to the driver
/// operation within the same locked region. Drivers recover their own payload
/// with [`downcast_ref`](ResolvedPath::downcast_ref).
pub struct ResolvedPath {
    inner: Box<dyn Any + Send>,
}

impl ResolvedPath {
    /// Wrap a driver-private payload.
    pub fn new<T: Any + Send>(payload: T) -> Self {
        Self {
            inner: Box::new(payload),
        }
    }

    /// Recover the driver-private payload.
    ///
    /// Returns `None` if the payload is of a different type, which can only
    /// happen if a resolved path produced by one driver is fed to another,
    /// which would be a dispatcher bug: resolution and the consuming
    /// operation always target the same filesystem.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}
