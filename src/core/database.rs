//! Purpose: Safe handle over one engine database (`void*` from `rdb_open`).
//! Exports: `Database`.
//! Role: Owns the Open -> Closed lifecycle and composes buffers, status translation, and the bridge.
//! Invariants: Never holds a null engine pointer; `rdb_close` runs at most once per handle.
//! Invariants: Once closed, every operation fails with `Closed` without calling the engine.
//! Invariants: Each engine call and its error-slot read share one `native::lock()` guard.
//! Invariants: Values returned to callers are copies; engine-owned buffers never escape.
//! Invariants: Paths with an interior NUL are rejected before reaching the engine.
use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::bridge::{self, CallbackToken, Visit};
use crate::core::buffer::BufferView;
use crate::core::error::{Error, ErrorKind};
use crate::core::native::{self, ForeignGuard, sys};
use crate::core::status;

struct RawDb(NonNull<c_void>);

// The engine pointer is only dereferenced by the engine, and every call is
// serialized through the handle mutex plus the process-wide foreign lock.
unsafe impl Send for RawDb {}

enum State {
    Open(RawDb),
    Closed,
}

pub struct Database {
    path: PathBuf,
    state: Mutex<State>,
    // Mirror of `state` readable without the lock (e.g. from inside a visitor).
    closed: AtomicBool,
    // Set while `for_each` holds the locks, so other threads get `Busy` instead of blocking.
    iterating: AtomicBool,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        Self::open_inner(path.as_os_str().as_encoded_bytes(), path.to_path_buf())
    }

    /// Opens a database from a raw path byte string.
    pub fn open_bytes(path: &[u8]) -> Result<Self, Error> {
        let display = PathBuf::from(String::from_utf8_lossy(path).into_owned());
        Self::open_inner(path, display)
    }

    fn open_inner(path_bytes: &[u8], path: PathBuf) -> Result<Self, Error> {
        bridge::ensure_not_visiting()?;
        if path_bytes.contains(&0) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("path contains NUL")
                .with_path(path));
        }

        let foreign = native::lock();
        let result = unsafe { sys::rdb_open(BufferView::from_slice(path_bytes).as_raw()) };
        if let Some(ptr) = NonNull::new(result.database) {
            drop(foreign);
            tracing::debug!(path = %path.display(), "opened rdb database");
            return Ok(Self {
                path,
                state: Mutex::new(State::Open(RawDb(ptr))),
                closed: AtomicBool::new(false),
                iterating: AtomicBool::new(false),
            });
        }

        let code = foreign.last_error_code();
        let message = if result.error.is_null() {
            None
        } else {
            // Engine-owned string; copy it before the lock allows another call.
            Some(
                unsafe { CStr::from_ptr(result.error) }
                    .to_string_lossy()
                    .into_owned(),
            )
        };
        drop(foreign);
        Err(open_error(code, message).with_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.with_open(|db, foreign| {
            let key = BufferView::from_slice(key);
            let value = BufferView::from_slice(value);
            if unsafe { sys::rdb_set(db, key.as_raw(), value.as_raw()) } {
                Ok(())
            } else {
                Err(failure_from(foreign.last_error_code(), "set"))
            }
        })
    }

    /// Returns an owned copy of the stored value, or `NotFound`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, Error> {
        self.with_open(|db, foreign| {
            let result = unsafe { sys::rdb_get(db, BufferView::from_slice(key).as_raw()) };
            if !result.valid {
                return Err(get_miss(foreign.last_error_code()));
            }
            // SAFETY: the engine keeps the value alive until the next call, and
            // we still hold the foreign lock while copying it out.
            let value = unsafe { BufferView::from_raw(result.bytes) }?;
            Ok(value.to_vec())
        })
    }

    pub fn remove(&self, key: &[u8]) -> Result<(), Error> {
        self.with_open(|db, foreign| {
            if unsafe { sys::rdb_remove(db, BufferView::from_slice(key).as_raw()) } {
                Ok(())
            } else {
                Err(failure_from(foreign.last_error_code(), "remove"))
            }
        })
    }

    /// Visits every entry until the visitor returns `false`.
    ///
    /// The slices are borrowed from the engine for one invocation only; copy them
    /// to keep them. Calling back into any `Database` from the visitor fails with `Busy`,
    /// and so does a call into this handle from another thread while the iteration runs.
    ///
    /// A visitor that waits on another thread which calls into a *different* handle
    /// still blocks: the engine lock is held for the whole iteration.
    pub fn for_each<F>(&self, visitor: F) -> Result<Visit, Error>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        let mut visitor = visitor;
        let (state, db) = self.open_state()?;
        let iterating = Iterating::enter(&self.iterating);
        let mut token = CallbackToken::register(&mut visitor);
        let foreign = native::lock();
        let ok = unsafe { sys::rdb_foreach(db, token.context(), bridge::trampoline) };
        let outcome = if ok {
            Ok(())
        } else {
            Err(failure_from(foreign.last_error_code(), "foreach").with_path(&self.path))
        };
        drop(foreign);
        drop(iterating);
        drop(state);

        // Locks are released by now, so a resumed visitor panic poisons nothing.
        let visit = token.finish();
        outcome?;
        let visit = visit.map_err(|err| err.with_path(&self.path))?;
        tracing::debug!(
            path = %self.path.display(),
            visited = visit.visited,
            stopped_early = visit.stopped_early,
            "rdb foreach finished"
        );
        Ok(visit)
    }

    /// Copies every entry out of the engine.
    pub fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        let mut entries = Vec::new();
        self.for_each(|key, value| {
            entries.push((key.to_vec(), value.to_vec()));
            true
        })?;
        Ok(entries)
    }

    pub fn count(&self) -> Result<u64, Error> {
        Ok(self.for_each(|_, _| true)?.visited)
    }

    /// Releases the engine database. A second call fails with `Closed`.
    pub fn close(&self) -> Result<(), Error> {
        bridge::ensure_not_visiting()?;
        self.ensure_not_iterating()?;
        let mut state = self.lock_state();
        let raw = match std::mem::replace(&mut *state, State::Closed) {
            State::Open(raw) => raw,
            State::Closed => return Err(self.closed_error()),
        };
        self.closed.store(true, Ordering::Release);
        let _foreign = native::lock();
        unsafe { sys::rdb_close(raw.0.as_ptr()) };
        tracing::debug!(path = %self.path.display(), "closed rdb database");
        Ok(())
    }

    /// Arms the bundled engine to fail the next get/set/remove/foreach with `code`.
    #[cfg(rdb_bundled)]
    #[doc(hidden)]
    pub fn inject_fault(&self, code: i32) -> Result<(), Error> {
        self.with_open(|db, _foreign| {
            unsafe { sys::rdb_fault_inject(db, code) };
            Ok(())
        })
    }

    fn with_open<T>(
        &self,
        op: impl FnOnce(*mut c_void, &ForeignGuard) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let (_state, db) = self.open_state()?;
        let foreign = native::lock();
        op(db, &foreign).map_err(|err| err.with_path(&self.path))
    }

    /// Gates on the Open state; the returned guard keeps other operations out.
    fn open_state(&self) -> Result<(MutexGuard<'_, State>, *mut c_void), Error> {
        bridge::ensure_not_visiting()?;
        self.ensure_not_iterating()?;
        let state = self.lock_state();
        let db = match &*state {
            State::Open(raw) => raw.0.as_ptr(),
            State::Closed => return Err(self.closed_error()),
        };
        Ok((state, db))
    }

    fn ensure_not_iterating(&self) -> Result<(), Error> {
        if self.iterating.load(Ordering::Acquire) {
            return Err(Error::new(ErrorKind::Busy)
                .with_message("for_each in progress on this handle")
                .with_path(&self.path));
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        // State transitions are single assignments, so a poisoned guard is consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed_error(&self) -> Error {
        Error::new(ErrorKind::Closed)
            .with_message("database is closed")
            .with_path(&self.path)
    }
}

/// Clears the handle's iterating flag on every exit from `for_each`.
struct Iterating<'a>(&'a AtomicBool);

impl<'a> Iterating<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Iterating<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Error for a set/remove/foreach that returned `false`; never swallowed.
fn failure_from(code: i32, op: &str) -> Error {
    status::error_from_code(code).unwrap_or_else(|| {
        Error::new(ErrorKind::Unexpected)
            .with_message(format!("{op} failed without an engine error code"))
    })
}

/// An invalid get result with a clear error slot is a plain miss.
fn get_miss(code: i32) -> Error {
    status::error_from_code(code).unwrap_or_else(|| Error::new(ErrorKind::NotFound))
}

/// Combines the error slot with the legacy message string from `rdb_open`.
fn open_error(code: i32, message: Option<String>) -> Error {
    match (status::error_from_code(code), message) {
        (Some(err), Some(message)) => err.with_message(message),
        (Some(err), None) => err,
        (None, Some(message)) => Error::new(ErrorKind::Unexpected).with_message(message),
        (None, None) => Error::new(ErrorKind::Unexpected)
            .with_message("engine returned no database and no error"),
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let State::Open(raw) = std::mem::replace(state, State::Closed) else {
            return;
        };
        if bridge::is_visiting() {
            // The foreign lock is held by the running iteration on this thread.
            tracing::warn!(
                path = %self.path.display(),
                "rdb database dropped inside a for_each visitor; engine handle leaked"
            );
            return;
        }
        let _foreign = native::lock();
        unsafe { sys::rdb_close(raw.0.as_ptr()) };
        tracing::debug!(path = %self.path.display(), "closed rdb database on drop");
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
