//! Purpose: Serialize access to the rdb engine and read its last-error slot safely.
//! Exports: `ForeignGuard`, `lock` (crate-internal).
//! Role: Only path through which the rest of the crate touches `sys`.
//! Invariants: Every foreign call and its error-slot read happen under one `ForeignGuard`.
//! Invariants: The error slot is process-wide; no read happens outside the guard.
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::status;

pub(crate) mod sys;

static FOREIGN: Mutex<()> = Mutex::new(());

/// Proof that the caller holds the process-wide foreign lock.
pub(crate) struct ForeignGuard {
    _guard: MutexGuard<'static, ()>,
}

pub(crate) fn lock() -> ForeignGuard {
    // The mutex guards no data, so a poisoned lock carries no broken state.
    let guard = FOREIGN.lock().unwrap_or_else(PoisonError::into_inner);
    ForeignGuard { _guard: guard }
}

impl ForeignGuard {
    /// Raw value of the engine's error slot for the most recent call.
    pub(crate) fn last_error_code(&self) -> i32 {
        let code = unsafe { sys::rdb_last_error() };
        if code != status::OK {
            tracing::trace!(code, "rdb error slot");
        }
        code
    }
}
