//! Purpose: Define the stable public Rust API boundary for rdb.
//! Exports: `Database`, `Visit`, `BufferView`, errors, and status translation.
//! Role: Public, additive-only surface for the CLI and embedding applications.
//! Invariants: Raw FFI (`core::native::sys`) is never re-exported here.

pub use crate::core::bridge::Visit;
pub use crate::core::buffer::BufferView;
pub use crate::core::database::Database;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::status::{code_of, translate};
