// Zero-copy byte views passed across the rdb boundary in both directions.
use std::marker::PhantomData;
use std::os::raw::c_char;
use std::ptr::NonNull;

use crate::core::error::{Error, ErrorKind};
use crate::core::native::sys::RdbBytes;

/// Borrowed `{ptr, len}` view over bytes owned by someone else.
///
/// Views built with [`BufferView::from_slice`] borrow caller-owned memory for the
/// duration of one engine call. Views over engine descriptors borrow
/// engine-owned memory that is only valid until the next call into the same
/// database or until the current visitor returns; use [`BufferView::to_vec`] to
/// keep the bytes beyond that.
#[derive(Clone, Copy, Debug)]
pub struct BufferView<'a> {
    ptr: NonNull<u8>,
    len: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> BufferView<'a> {
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        // Empty input still yields a non-null, well-aligned pointer; the engine
        // must never read through it because `len` is zero.
        let ptr = if bytes.is_empty() {
            NonNull::dangling()
        } else {
            NonNull::from(bytes).cast::<u8>()
        };
        Self {
            ptr,
            len: bytes.len(),
            _marker: PhantomData,
        }
    }

    /// Wraps an engine-owned descriptor without copying.
    ///
    /// # Safety
    ///
    /// `raw.ptr` must point to `raw.len` readable bytes that stay valid and
    /// unmodified for `'a`.
    pub(crate) unsafe fn from_raw(raw: RdbBytes) -> Result<Self, Error> {
        let len = usize::try_from(raw.len).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("engine buffer length exceeds address space")
                .with_source(err)
        })?;
        let ptr = match NonNull::new(raw.ptr.cast::<u8>()) {
            Some(ptr) => ptr,
            None if len == 0 => NonNull::dangling(),
            None => {
                return Err(Error::new(ErrorKind::Unexpected)
                    .with_message("engine returned a null buffer with non-zero length"));
            }
        };
        Ok(Self {
            ptr,
            len,
            _marker: PhantomData,
        })
    }

    pub(crate) fn as_raw(&self) -> RdbBytes {
        RdbBytes {
            ptr: self.ptr.as_ptr().cast::<c_char>(),
            len: self.len as u64,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        // SAFETY: both constructors guarantee `len` readable bytes behind `ptr` for 'a;
        // a dangling pointer is only used with `len == 0`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Copies the viewed bytes into locally owned storage.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
