//! Purpose: Let the engine's C-style `foreach` drive a Rust closure.
//! Exports: `Visit`; `CallbackToken`, `trampoline`, `ensure_not_visiting` are crate-internal.
//! Role: Context registration + trampoline for `Database::for_each`.
//! Invariants: A token lives exactly as long as one `rdb_foreach` call and is released on every exit path.
//! Invariants: Visitor slices borrow engine memory for a single invocation only.
//! Invariants: No unwinding crosses the C frame; panics are carried out and resumed afterwards.
use std::any::Any;
use std::cell::Cell;
use std::os::raw::c_void;
use std::panic::{self, AssertUnwindSafe};

use crate::core::buffer::BufferView;
use crate::core::error::{Error, ErrorKind};
use crate::core::native::sys::RdbBytes;

thread_local! {
    static VISITING: Cell<bool> = const { Cell::new(false) };
}

pub(crate) type Visitor<'v> = dyn FnMut(&[u8], &[u8]) -> bool + 'v;

/// Fails with `Busy` when called from inside a visitor on this thread.
pub(crate) fn ensure_not_visiting() -> Result<(), Error> {
    if VISITING.with(Cell::get) {
        return Err(Error::new(ErrorKind::Busy)
            .with_message("database operations are not allowed inside a for_each visitor"));
    }
    Ok(())
}

pub(crate) fn is_visiting() -> bool {
    VISITING.with(Cell::get)
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Visit {
    pub visited: u64,
    pub stopped_early: bool,
}

enum Interrupt {
    Panic(Box<dyn Any + Send>),
    Error(Error),
}

/// Registration of one visitor for the duration of one engine iteration.
pub(crate) struct CallbackToken<'v> {
    visitor: &'v mut Visitor<'v>,
    visit: Visit,
    interrupt: Option<Interrupt>,
    // Flag value before registration, restored on drop.
    previous: bool,
}

impl<'v> CallbackToken<'v> {
    /// Callers check [`ensure_not_visiting`] first. A nested token leaves the flag as it found it.
    pub(crate) fn register(visitor: &'v mut Visitor<'v>) -> Self {
        let previous = VISITING.with(|flag| flag.replace(true));
        Self {
            visitor,
            visit: Visit::default(),
            interrupt: None,
            previous,
        }
    }

    /// Opaque context word handed to the engine; resolved back by [`trampoline`].
    pub(crate) fn context(&mut self) -> *mut c_void {
        (self as *mut Self).cast::<c_void>()
    }

    /// Releases the registration and reports how the iteration went.
    ///
    /// A visitor panic is resumed here, after the engine call has returned.
    pub(crate) fn finish(mut self) -> Result<Visit, Error> {
        let visit = self.visit;
        let interrupt = self.interrupt.take();
        drop(self);
        match interrupt {
            None => Ok(visit),
            Some(Interrupt::Error(err)) => Err(err),
            Some(Interrupt::Panic(payload)) => panic::resume_unwind(payload),
        }
    }

    fn invoke(&mut self, key: RdbBytes, value: RdbBytes) -> bool {
        if self.interrupt.is_some() {
            return false;
        }
        // SAFETY: the engine guarantees both descriptors for this invocation only,
        // and the views are dropped before returning.
        let views = unsafe { BufferView::from_raw(key) }
            .and_then(|key| unsafe { BufferView::from_raw(value) }.map(|value| (key, value)));
        let (key, value) = match views {
            Ok(views) => views,
            Err(err) => {
                self.interrupt = Some(Interrupt::Error(err));
                return false;
            }
        };

        let visitor = &mut *self.visitor;
        match panic::catch_unwind(AssertUnwindSafe(|| visitor(key.as_bytes(), value.as_bytes()))) {
            Ok(keep_going) => {
                self.visit.visited += 1;
                self.visit.stopped_early = !keep_going;
                keep_going
            }
            Err(payload) => {
                self.interrupt = Some(Interrupt::Panic(payload));
                false
            }
        }
    }
}

impl Drop for CallbackToken<'_> {
    fn drop(&mut self) {
        let previous = self.previous;
        VISITING.with(|flag| flag.set(previous));
    }
}

/// Fixed entry point the engine calls once per stored entry.
///
/// # Safety
///
/// `context` must come from [`CallbackToken::context`] on a token that is still alive.
pub(crate) unsafe extern "C" fn trampoline(context: *mut c_void, key: RdbBytes, value: RdbBytes) -> bool {
    // SAFETY: upheld by the caller contract above.
    match unsafe { context.cast::<CallbackToken<'_>>().as_mut() } {
        Some(token) => token.invoke(key, value),
        None => false,
    }
}
