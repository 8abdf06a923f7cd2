//! Task-Layer Collaborator Hooks
//!
//! The dispatcher needs two things from the process/task layer: a
//! preemption-enabled check (dispatcher operations may block on locks, so
//! running them with preemption disabled is a caller bug) and removal of the
//! memory mappings tied to a handle at close time.
//!
//! The kernel installs its hooks once at boot. When no hooks are installed
//! the crate runs in a restricted execution mode (the preemption assertion
//! is skipped and close does not touch mappings), which is what hosted unit
//! tests use.

use spin::Once;

use crate::handle::OpenHandle;

/// Hooks into the process/task layer.
pub trait TaskHooks: Send + Sync {
    /// Whether the current context may block on locks.
    fn preemption_enabled(&self) -> bool;

    /// Remove all memory mappings that reference `handle`. Called by the
    /// dispatcher before the driver's close.
    fn remove_handle_mappings(&self, handle: &OpenHandle);
}

static TASK_HOOKS: Once<&'static dyn TaskHooks> = Once::new();

/// Install the task-layer hooks. Subsequent calls are ignored.
pub fn install_task_hooks(hooks: &'static dyn TaskHooks) {
    TASK_HOOKS.call_once(|| hooks);
}

/// The installed hooks, if any.
pub(crate) fn task_hooks() -> Option<&'static dyn TaskHooks> {
    TASK_HOOKS.get().copied()
}

/// Assert the precondition that preemption is enabled.
///
/// A violation is a programming-contract bug in the caller, not a
/// recoverable error. No-op in restricted execution mode.
pub(crate) fn assert_preemption_enabled() {
    if let Some(hooks) = task_hooks() {
        assert!(
            hooks.preemption_enabled(),
            "vfs: operation requires preemption enabled"
        );
    }
}
